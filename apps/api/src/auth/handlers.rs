use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::Session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    if !state.config.credentials_match(&req.username, &req.password) {
        warn!(username = %req.username, "Rejected login attempt");
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    let purged = state
        .sessions
        .purge_expired(now)
        .await
        .map_err(AppError::write)?;

    let session = Session {
        token: Uuid::new_v4(),
        username: req.username,
        created_at: now,
        expires_at: now + state.config.session_ttl(),
    };
    state
        .sessions
        .insert_session(&session)
        .await
        .map_err(AppError::write)?;

    info!(username = %session.username, purged, "Session opened");
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    state
        .sessions
        .delete_session(session.token)
        .await
        .map_err(AppError::write)?;
    info!(username = %session.username, "Session closed");
    Ok(Json(json!({ "success": true })))
}
