//! Errors that prevent a decision from being returned

use crate::config::ConfigError;
use crate::workspace::{CleanupError, WorkspaceError};

/// Input shape problems detected before any resource is acquired.
#[derive(Debug, thiserror::Error)]
pub enum StructuralError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("candidate_id is empty")]
    MissingCandidateId,
    #[error("{0} is empty")]
    BlankRef(String),
    #[error("expected an identity video plus at least one question video, got {0} video(s)")]
    TooFewVideos(usize),
    #[error("{questions} question(s) but {videos} question video(s)")]
    QuestionVideoMismatch { questions: usize, videos: usize },
    #[error("question numbers must run 1..={0} in order")]
    NonSequentialQuestions(usize),
}

/// Everything `assess` can fail with. Stage failures are never here; they
/// are recorded in the report.
#[derive(Debug, thiserror::Error)]
pub enum AssessError {
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),
    #[error("workspace unavailable: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error("cleanup failed: {0}")]
    Cleanup(#[from] CleanupError),
}
