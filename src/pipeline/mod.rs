//! Assessment Pipeline
//!
//! ```text
//! INIT            validate config + input shape (no resources yet)
//! RESOURCES_READY workspace acquired
//! PHASE1_RUNNING  Quality ∥ Transcription, then Identity
//! PHASE2_RUNNING  Content ∥ Behavioral   (gate: transcription slot written)
//! AGGREGATING     weighted decision + narrative
//! CLEANUP         release workspace, verify deletion
//! DONE            report returned
//! ```
//!
//! Stage problems never abort a run. Only a structural error (before any
//! resource is acquired), an unavailable workspace, or unverified cleanup
//! prevent a decision from being returned.

mod error;
mod orchestrator;
pub mod phase;
mod report;
mod runner;

pub use error::{AssessError, StructuralError};
pub use orchestrator::{validate_submission, AssessmentPipeline};
pub use report::AssessmentReport;
pub use runner::{panic_message, Settled, StageRunner};
