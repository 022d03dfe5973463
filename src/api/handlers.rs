//! Request handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config::AssessConfig;
use crate::pipeline::{AssessError, AssessmentPipeline};
use crate::types::{QuestionSet, Submission};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<AssessmentPipeline>,
    pub config: Arc<AssessConfig>,
}

impl ApiState {
    pub fn new(pipeline: AssessmentPipeline, config: AssessConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Response {
    ApiResponse::ok(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/v1/questions
pub async fn questions() -> Response {
    ApiResponse::ok(QuestionSet::ambassador_program())
}

/// GET /api/v1/config
pub async fn get_config(State(state): State<ApiState>) -> Response {
    let mut config = (*state.config).clone();
    config.services.api_key = config.services.api_key.map(|_| "***".to_string());
    config.media.auth_token = config.media.auth_token.map(|_| "***".to_string());
    ApiResponse::ok(config)
}

/// POST /api/v1/assess
pub async fn assess(
    State(state): State<ApiState>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Response {
    let Json(submission) = match payload {
        Ok(p) => p,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };

    let candidate_id = submission.candidate_id.clone();
    info!(candidate_id = %candidate_id, "Assessment requested");

    match state.pipeline.assess(submission, &state.config).await {
        Ok(report) => ApiResponse::ok(report),
        Err(AssessError::Structural(e)) => {
            warn!(candidate_id = %candidate_id, error = %e, "Rejected submission");
            ApiErrorResponse::unprocessable(e.to_string())
        }
        Err(AssessError::Workspace(e)) => {
            ApiErrorResponse::internal("WORKSPACE_UNAVAILABLE", e.to_string())
        }
        Err(AssessError::Cleanup(e)) => ApiErrorResponse::internal("CLEANUP_FAILED", e.to_string()),
    }
}
