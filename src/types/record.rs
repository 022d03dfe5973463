//! AssessmentRecord - the single mutable aggregate threaded through one run
//!
//! Owned exclusively by the pipeline for the lifetime of a request. Stage
//! results live in write-once slots; non-fatal problems accumulate in an
//! append-only error list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    BehavioralReport, ContentReport, Decision, IdentityReport, MediaRefs, QualityReport,
    QuestionSet, StageFailure, StageName, StageResult, Submission, TranscriptionReport,
};

// ============================================================================
// Pipeline phase
// ============================================================================

/// Pipeline state machine phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Init,
    ResourcesReady,
    Phase1Running,
    Phase2Running,
    Aggregating,
    Cleanup,
    Done,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelinePhase::Init => "INIT",
            PipelinePhase::ResourcesReady => "RESOURCES_READY",
            PipelinePhase::Phase1Running => "PHASE1_RUNNING",
            PipelinePhase::Phase2Running => "PHASE2_RUNNING",
            PipelinePhase::Aggregating => "AGGREGATING",
            PipelinePhase::Cleanup => "CLEANUP",
            PipelinePhase::Done => "DONE",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Write-once slot
// ============================================================================

/// Raised when a stage slot is written a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("result slot for stage '{0}' was already written")]
pub struct SlotAlreadyWritten(pub StageName);

/// Holds one stage's result. Empty means "not yet run".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StageSlot<T> {
    result: Option<StageResult<T>>,
}

impl<T> Default for StageSlot<T> {
    fn default() -> Self {
        Self { result: None }
    }
}

impl<T> StageSlot<T> {
    /// Write the slot. The first write wins; later writes are rejected.
    pub fn fill(
        &mut self,
        stage: StageName,
        result: StageResult<T>,
    ) -> Result<(), SlotAlreadyWritten> {
        if self.result.is_some() {
            return Err(SlotAlreadyWritten(stage));
        }
        self.result = Some(result);
        Ok(())
    }

    pub fn get(&self) -> Option<&StageResult<T>> {
        self.result.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.result.is_some()
    }

    /// Successful payload, if the stage succeeded.
    pub fn payload(&self) -> Option<&T> {
        self.result.as_ref().and_then(StageResult::success)
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        self.result.as_ref().and_then(StageResult::failure)
    }
}

/// A settled stage result, type-erased so phases can hold mixed stages.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Identity(StageResult<IdentityReport>),
    Quality(StageResult<QualityReport>),
    Transcription(StageResult<TranscriptionReport>),
    Content(StageResult<ContentReport>),
    Behavioral(StageResult<BehavioralReport>),
}

impl StageOutput {
    /// A failed output for any stage.
    pub fn failed(stage: StageName, failure: StageFailure) -> Self {
        match stage {
            StageName::Identity => StageOutput::Identity(StageResult::Failure(failure)),
            StageName::Quality => StageOutput::Quality(StageResult::Failure(failure)),
            StageName::Transcription => StageOutput::Transcription(StageResult::Failure(failure)),
            StageName::Content => StageOutput::Content(StageResult::Failure(failure)),
            StageName::Behavioral => StageOutput::Behavioral(StageResult::Failure(failure)),
        }
    }

    pub fn stage(&self) -> StageName {
        match self {
            StageOutput::Identity(_) => StageName::Identity,
            StageOutput::Quality(_) => StageName::Quality,
            StageOutput::Transcription(_) => StageName::Transcription,
            StageOutput::Content(_) => StageName::Content,
            StageOutput::Behavioral(_) => StageName::Behavioral,
        }
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            StageOutput::Identity(r) => r.failure(),
            StageOutput::Quality(r) => r.failure(),
            StageOutput::Transcription(r) => r.failure(),
            StageOutput::Content(r) => r.failure(),
            StageOutput::Behavioral(r) => r.failure(),
        }
    }
}

// ============================================================================
// Timing + errors
// ============================================================================

/// Overall run timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: Option<f64>,
}

impl Timing {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            completed_at: None,
            elapsed_seconds: None,
        }
    }

    pub fn finish(&mut self) {
        let now = Utc::now();
        self.elapsed_seconds = Some((now - self.started_at).num_milliseconds() as f64 / 1000.0);
        self.completed_at = Some(now);
    }
}

/// When one stage was invoked and when it settled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: StageName,
    pub started_at: DateTime<Utc>,
    pub settled_at: DateTime<Utc>,
}

impl StageTiming {
    pub fn elapsed_ms(&self) -> i64 {
        (self.settled_at - self.started_at).num_milliseconds()
    }
}

/// A non-fatal problem recorded during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Stage name, or `aggregation` / `narrative` / `pipeline`
    pub stage: String,
    pub message: String,
}

// ============================================================================
// Record
// ============================================================================

/// Mutable state of one assessment run.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentRecord {
    pub assessment_id: Uuid,
    pub candidate_id: String,
    pub candidate_name: String,
    pub media: MediaRefs,
    pub questions: QuestionSet,

    identity_result: StageSlot<IdentityReport>,
    quality_result: StageSlot<QualityReport>,
    transcription_result: StageSlot<TranscriptionReport>,
    content_result: StageSlot<ContentReport>,
    behavioral_result: StageSlot<BehavioralReport>,

    pub final_decision: Option<Decision>,
    errors: Vec<ErrorEntry>,
    pub stage: PipelinePhase,
    pub timing: Timing,
    stage_timings: Vec<StageTiming>,
}

impl AssessmentRecord {
    /// Create a record holding only the inputs.
    pub fn new(submission: Submission) -> Self {
        Self {
            assessment_id: Uuid::new_v4(),
            candidate_id: submission.candidate_id,
            candidate_name: submission.candidate_name,
            media: submission.media,
            questions: submission.questions,
            identity_result: StageSlot::default(),
            quality_result: StageSlot::default(),
            transcription_result: StageSlot::default(),
            content_result: StageSlot::default(),
            behavioral_result: StageSlot::default(),
            final_decision: None,
            errors: Vec::new(),
            stage: PipelinePhase::Init,
            timing: Timing::start(),
            stage_timings: Vec::new(),
        }
    }

    pub fn identity(&self) -> &StageSlot<IdentityReport> {
        &self.identity_result
    }

    pub fn quality(&self) -> &StageSlot<QualityReport> {
        &self.quality_result
    }

    pub fn transcription(&self) -> &StageSlot<TranscriptionReport> {
        &self.transcription_result
    }

    pub fn content(&self) -> &StageSlot<ContentReport> {
        &self.content_result
    }

    pub fn behavioral(&self) -> &StageSlot<BehavioralReport> {
        &self.behavioral_result
    }

    pub fn is_populated(&self, stage: StageName) -> bool {
        match stage {
            StageName::Identity => self.identity_result.is_populated(),
            StageName::Quality => self.quality_result.is_populated(),
            StageName::Transcription => self.transcription_result.is_populated(),
            StageName::Content => self.content_result.is_populated(),
            StageName::Behavioral => self.behavioral_result.is_populated(),
        }
    }

    pub fn all_slots_populated(&self) -> bool {
        StageName::ALL.iter().all(|s| self.is_populated(*s))
    }

    /// Failure recorded for a stage, if it failed.
    pub fn stage_failure(&self, stage: StageName) -> Option<&StageFailure> {
        match stage {
            StageName::Identity => self.identity_result.failure(),
            StageName::Quality => self.quality_result.failure(),
            StageName::Transcription => self.transcription_result.failure(),
            StageName::Content => self.content_result.failure(),
            StageName::Behavioral => self.behavioral_result.failure(),
        }
    }

    /// Write a settled stage output into its slot.
    ///
    /// A failure is also appended to `errors`.
    pub fn fill_slot(&mut self, output: StageOutput) -> Result<(), SlotAlreadyWritten> {
        let stage = output.stage();
        let failure = output.failure().cloned();
        match output {
            StageOutput::Identity(r) => self.identity_result.fill(stage, r)?,
            StageOutput::Quality(r) => self.quality_result.fill(stage, r)?,
            StageOutput::Transcription(r) => self.transcription_result.fill(stage, r)?,
            StageOutput::Content(r) => self.content_result.fill(stage, r)?,
            StageOutput::Behavioral(r) => self.behavioral_result.fill(stage, r)?,
        }
        if let Some(failure) = failure {
            self.push_error(stage.as_str(), failure.reason);
        }
        Ok(())
    }

    pub fn push_error(&mut self, stage: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ErrorEntry {
            stage: stage.into(),
            message: message.into(),
        });
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn record_timing(&mut self, timing: StageTiming) {
        self.stage_timings.push(timing);
    }

    pub fn stage_timings(&self) -> &[StageTiming] {
        &self.stage_timings
    }

    pub fn timing_for(&self, stage: StageName) -> Option<&StageTiming> {
        self.stage_timings.iter().find(|t| t.stage == stage)
    }

    pub(crate) fn into_parts(self) -> (Vec<ErrorEntry>, Vec<StageTiming>) {
        (self.errors, self.stage_timings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaRef, QuestionSet};

    fn record() -> AssessmentRecord {
        AssessmentRecord::new(Submission {
            candidate_id: "u-1".to_string(),
            candidate_name: "Test Candidate".to_string(),
            media: MediaRefs {
                profile_image_ref: MediaRef::new("p"),
                id_document_ref: MediaRef::new("d"),
                video_refs: vec![MediaRef::new("v0")],
            },
            questions: QuestionSet::default(),
        })
    }

    #[test]
    fn slot_rejects_second_write() {
        let mut rec = record();
        let ok = StageOutput::Behavioral(StageResult::Success(BehavioralReport {
            behavioral_score: 80.0,
            flags: Vec::new(),
        }));
        rec.fill_slot(ok.clone()).unwrap();
        let err = rec.fill_slot(ok).unwrap_err();
        assert_eq!(err, SlotAlreadyWritten(StageName::Behavioral));
        assert_eq!(rec.behavioral().payload().unwrap().behavioral_score, 80.0);
    }

    #[test]
    fn failure_is_appended_to_errors() {
        let mut rec = record();
        rec.fill_slot(StageOutput::Transcription(StageResult::Failure(StageFailure::timeout())))
            .unwrap();
        assert_eq!(rec.errors().len(), 1);
        assert_eq!(rec.errors()[0].stage, "transcription");
        assert_eq!(rec.errors()[0].message, "timeout");
        assert!(rec.is_populated(StageName::Transcription));
    }

    #[test]
    fn fresh_record_has_no_populated_slots() {
        let rec = record();
        assert!(StageName::ALL.iter().all(|s| !rec.is_populated(*s)));
        assert_eq!(rec.stage, PipelinePhase::Init);
        assert!(rec.final_decision.is_none());
    }

    #[test]
    fn phases_are_ordered() {
        assert!(PipelinePhase::Phase1Running < PipelinePhase::Phase2Running);
        assert!(PipelinePhase::Aggregating < PipelinePhase::Cleanup);
        assert_eq!(PipelinePhase::Phase2Running.to_string(), "PHASE2_RUNNING");
    }
}
