//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ASSESSOR_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "assessor.toml";

// ============================================================================
// Scoring
// ============================================================================

/// Minimum final score for PASS.
pub const PASS_THRESHOLD: f64 = 65.0;

/// Minimum final score for REVIEW.
pub const REVIEW_THRESHOLD: f64 = 55.0;

/// Weight of the content score in the final score.
pub const CONTENT_WEIGHT: f64 = 0.7;

/// Weight of the behavioral score in the final score.
pub const BEHAVIORAL_WEIGHT: f64 = 0.3;

/// Allowed drift of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Distance from the nearest threshold for HIGH confidence.
pub const HIGH_CONFIDENCE_MARGIN: f64 = 10.0;

/// Distance from the nearest threshold for MEDIUM confidence.
pub const MEDIUM_CONFIDENCE_MARGIN: f64 = 5.0;

// ============================================================================
// Stages
// ============================================================================

/// Per-stage timeout (seconds).
pub const STAGE_TIMEOUT_SECS: f64 = 120.0;

/// Narrative step timeout (seconds).
pub const NARRATIVE_TIMEOUT_SECS: f64 = 30.0;

// ============================================================================
// Workspace
// ============================================================================

/// Directory under the system temp dir holding per-request workspaces.
pub const WORKSPACE_DIR_NAME: &str = "video_assessments";

// ============================================================================
// Media
// ============================================================================

/// Public endpoint `gs://bucket/object` references are fetched through.
pub const GCS_BASE_URL: &str = "https://storage.googleapis.com";

/// Upper bound on fetching one media file into the workspace (seconds).
pub const MEDIA_FETCH_TIMEOUT_SECS: f64 = 300.0;

// ============================================================================
// Remote Services
// ============================================================================

/// Base URL of the analysis services.
pub const SERVICES_BASE_URL: &str = "http://localhost:8090";

/// HTTP connect timeout for service and webhook calls (seconds).
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Webhook request timeout (seconds).
pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";
