//! Shared data structures for screening-interview assessment
//!
//! This module defines the core types threaded through the pipeline:
//! - Inputs: Submission, MediaRefs, QuestionSet
//! - Stage payloads: IdentityReport, QualityReport, TranscriptionReport,
//!   ContentReport, BehavioralReport (wrapped in `StageResult`)
//! - AssessmentRecord: the write-once slot aggregate for one run
//! - Decision: the weighted verdict with narrative tags

mod question;
mod submission;
mod stages;
mod record;
mod decision;

pub use question::*;
pub use submission::*;
pub use stages::*;
pub use record::*;
pub use decision::*;
