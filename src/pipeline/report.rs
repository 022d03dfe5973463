//! What a completed run returns to the caller

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Decision, ErrorEntry, StageTiming, Timing};
use crate::workspace::CleanupReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub assessment_id: Uuid,
    pub candidate_id: String,
    pub decision: Decision,
    /// Non-fatal problems: failed stages, narrative fallback, aggregation fallback
    pub errors: Vec<ErrorEntry>,
    pub stage_timings: Vec<StageTiming>,
    pub timing: Timing,
    pub cleanup: CleanupReport,
}
