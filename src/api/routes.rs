//! Route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Routes nested under `/api/v1`.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/assess", post(handlers::assess))
        .route("/questions", get(handlers::questions))
        .route("/config", get(handlers::get_config))
        .with_state(state)
}

/// Unversioned routes.
pub fn root_routes() -> Router {
    Router::new().route("/health", get(handlers::health))
}
