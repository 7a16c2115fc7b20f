use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use chrono::Local;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::report::{content_disposition, render_report};
use crate::state::AppState;

/// GET /api/v1/persons/:id/report
///
/// Returns the interview sheet as a PDF attachment.
pub async fn handle_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let person = state
        .people
        .get(id)
        .await
        .map_err(AppError::retrieval)?
        .ok_or_else(|| AppError::NotFound(format!("Person {id} not found")))?;

    let disposition = content_disposition(&person);
    let layout = Arc::clone(&state.layout);
    let generated_at = Local::now().naive_local();

    // CPU-bound layout, off the async executor. A panic surfaces as a join error.
    let bytes = tokio::task::spawn_blocking(move || render_report(&person, &layout, generated_at))
        .await
        .map_err(|e| AppError::Generation(format!("report task failed: {e}")))?;

    info!(person_id = %id, size = bytes.len(), "Report generated");

    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| AppError::Generation(format!("invalid report filename: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
