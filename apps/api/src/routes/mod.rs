pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::auth::middleware::require_session;
use crate::people::handlers as people;
use crate::report::handlers as report;
use crate::state::AppState;
use crate::stats::handlers as stats;

pub fn build_router(state: AppState) -> Router {
    // Everything below requires a bearer session
    let protected = Router::new()
        .route(
            "/api/v1/persons",
            get(people::handle_search).post(people::handle_create),
        )
        .route(
            "/api/v1/persons/:id",
            get(people::handle_get)
                .put(people::handle_update)
                .delete(people::handle_delete),
        )
        .route("/api/v1/persons/:id/report", get(report::handle_report))
        .route("/api/v1/stats/placements", get(stats::handle_placements))
        .route(
            "/api/v1/stats/placements/sectors",
            get(stats::handle_sector_ranking),
        )
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .merge(protected)
        .with_state(state)
}
