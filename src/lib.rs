//! interview-assessor: screening-interview assessment orchestration
//!
//! Candidates submit a profile photo, an ID document and a set of short
//! videos answering fixed questions. The pipeline verifies identity, checks
//! recording quality, transcribes speech, scores answer content and
//! behavior, and emits a PASS / REVIEW / FAIL decision with rationale.
//!
//! ## Architecture
//!
//! - **pipeline**: phase state machine, stage runner, orchestrator
//! - **stages**: analysis step traits and the HTTP-backed implementation
//! - **scoring**: weighted aggregation, verdict thresholds, narrative rules
//! - **workspace**: per-request scratch directories with verified cleanup
//! - **media**: fetching submitted media into the workspace
//! - **notify**: human-review webhooks
//! - **api**: Axum HTTP surface

pub mod api;
pub mod config;
pub mod media;
pub mod notify;
pub mod pipeline;
pub mod scoring;
pub mod stages;
pub mod types;
pub mod workspace;

pub use config::AssessConfig;
pub use pipeline::{AssessError, AssessmentPipeline, AssessmentReport, StructuralError};
pub use types::{Decision, QuestionSet, Submission, Verdict};
