//! REST API module using Axum
//!
//! - `GET  /health`
//! - `POST /api/v1/assess`     run one assessment
//! - `GET  /api/v1/questions`  default question set
//! - `GET  /api/v1/config`     effective scoring configuration

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Submissions carry references, not media, so bodies stay small.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `ASSESSOR_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for a browser front end.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match std::env::var("ASSESSOR_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state))
        .merge(routes::root_routes())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
