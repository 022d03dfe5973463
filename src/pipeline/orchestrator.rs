//! Pipeline Orchestrator - one assessment from validation to verified cleanup

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::error::{AssessError, StructuralError};
use super::phase::{PhasePlan, PHASES};
use super::report::AssessmentReport;
use super::runner::{panic_message, StageRunner};
use crate::config::AssessConfig;
use crate::media::{LocalMedia, Materialized, MissingMedia};
use crate::notify::{ReviewNotice, WebhookNotifier};
use crate::scoring::{AggregationError, ScoreAggregator};
use crate::stages::{
    AnalysisSuite, BehavioralRequest, ContentRequest, IdentityRequest, NarrativeRequest,
    QualityRequest, TranscriptionRequest,
};
use crate::types::{
    AssessmentRecord, Decision, MediaRef, PipelinePhase, ReasoningSource, StageFailure,
    StageName, StageOutput, StageResult, StageTiming, Submission, Transcript,
};
use crate::workspace::{WorkspaceGuard, WorkspaceLayout, WorkspaceProvider};

/// A stage result ready to be committed to the record.
struct SettledStage {
    output: StageOutput,
    timing: StageTiming,
}

impl SettledStage {
    /// A stage that failed without its step being called.
    fn failed_now(stage: StageName, failure: StageFailure) -> Self {
        let now = chrono::Utc::now();
        Self {
            output: StageOutput::failed(stage, failure),
            timing: StageTiming {
                stage,
                started_at: now,
                settled_at: now,
            },
        }
    }
}

/// What media-bound stages read from: the workspace and the local copies.
struct StageInputs {
    layout: WorkspaceLayout,
    media: LocalMedia,
}

/// Runs assessments against a fixed set of collaborators.
///
/// Cheap to share: hold it in an `Arc` and call `assess` concurrently; each
/// call owns its own record and workspace.
pub struct AssessmentPipeline {
    suite: AnalysisSuite,
    provider: Arc<dyn WorkspaceProvider>,
    notifier: Option<WebhookNotifier>,
}

impl AssessmentPipeline {
    pub fn new(suite: AnalysisSuite, provider: Arc<dyn WorkspaceProvider>) -> Self {
        Self {
            suite,
            provider,
            notifier: None,
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Option<WebhookNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Assess one submission.
    ///
    /// Returns a report with a decision, or one of: a structural error (no
    /// resources touched), an unavailable workspace, or a cleanup failure.
    pub async fn assess(
        &self,
        submission: Submission,
        config: &AssessConfig,
    ) -> Result<AssessmentReport, AssessError> {
        // INIT
        config.validate().map_err(StructuralError::from)?;
        validate_submission(&submission)?;

        let mut record = AssessmentRecord::new(submission);
        info!(
            assessment_id = %record.assessment_id,
            candidate_id = %record.candidate_id,
            questions = record.questions.len(),
            "Assessment started"
        );

        let area = self.provider.acquire(&record.candidate_id)?;
        let mut guard = WorkspaceGuard::new(area);
        let layout = WorkspaceLayout::new(guard.path().map(PathBuf::from).unwrap_or_default());
        advance(&mut record, PipelinePhase::ResourcesReady);

        let fetch_runner = StageRunner::new(config.media.fetch_timeout());
        let media = self.materialize(&mut record, &layout, &fetch_runner).await;
        let inputs = StageInputs { layout, media };

        let runner = StageRunner::new(config.stages.per_stage_timeout());
        for plan in &PHASES {
            self.run_phase(plan, &mut record, &runner, &inputs).await;
        }

        advance(&mut record, PipelinePhase::Aggregating);
        let decision = self.decide(&mut record, config).await;

        advance(&mut record, PipelinePhase::Cleanup);
        let cleanup = guard.release_blocking().await;
        if let Err(e) = cleanup.ensure_clean() {
            error!(
                assessment_id = %record.assessment_id,
                candidate_id = %record.candidate_id,
                error = %e,
                "Cleanup verification failed; withholding decision"
            );
            return Err(e.into());
        }

        let notice = ReviewNotice::for_outcome(&record, &decision);
        record.final_decision = Some(decision.clone());
        advance(&mut record, PipelinePhase::Done);
        record.timing.finish();

        info!(
            assessment_id = %record.assessment_id,
            candidate_id = %record.candidate_id,
            verdict = %decision.verdict,
            final_score = decision.final_score,
            errors = record.errors().len(),
            elapsed_seconds = record.timing.elapsed_seconds.unwrap_or_default(),
            files_deleted = cleanup.files_deleted,
            "Assessment complete"
        );

        if let (Some(notifier), Some(notice)) = (&self.notifier, notice) {
            if let Err(e) = notifier.send(&notice).await {
                warn!(
                    candidate_id = %record.candidate_id,
                    error = %e,
                    "Human-review webhook failed"
                );
            }
        }

        let assessment_id = record.assessment_id;
        let candidate_id = record.candidate_id.clone();
        let timing = record.timing.clone();
        let (errors, stage_timings) = record.into_parts();

        Ok(AssessmentReport {
            assessment_id,
            candidate_id,
            decision,
            errors,
            stage_timings,
            timing,
            cleanup,
        })
    }

    // ========================================================================
    // Media
    // ========================================================================

    /// Copy every submitted reference into the workspace, concurrently.
    ///
    /// Each fetch gets the media timeout and panic isolation. Failures are
    /// recorded under `media` and surface later as failures of the stages
    /// that need the file.
    async fn materialize(
        &self,
        record: &mut AssessmentRecord,
        layout: &WorkspaceLayout,
        runner: &StageRunner,
    ) -> LocalMedia {
        let refs = &record.media;
        let videos = refs
            .video_refs
            .iter()
            .enumerate()
            .map(move |(i, source)| {
                self.fetch_one(runner, format!("video_refs[{i}]"), source, layout.video_path(i))
            });
        let (profile_image, id_document, videos) = futures::join!(
            self.fetch_one(
                runner,
                "profile_image_ref".to_string(),
                &refs.profile_image_ref,
                layout.profile_image_path(),
            ),
            self.fetch_one(
                runner,
                "id_document_ref".to_string(),
                &refs.id_document_ref,
                layout.id_document_path(),
            ),
            join_all(videos),
        );
        let media = LocalMedia {
            profile_image,
            id_document,
            videos,
        };

        let missing: Vec<MissingMedia> = media.missing().cloned().collect();
        info!(
            assessment_id = %record.assessment_id,
            fetcher = self.suite.media.name(),
            missing = missing.len(),
            "Media materialized"
        );
        for m in missing {
            record.push_error("media", m.to_string());
        }
        media
    }

    async fn fetch_one(
        &self,
        runner: &StageRunner,
        field: String,
        source: &MediaRef,
        dest: PathBuf,
    ) -> Materialized {
        match runner.settle(&field, self.suite.media.fetch(source, &dest)).await {
            StageResult::Success(bytes) => {
                debug!(field = %field, bytes, dest = %dest.display(), "Media fetched");
                Ok(dest)
            }
            StageResult::Failure(f) => Err(MissingMedia {
                field,
                reason: f.to_string(),
            }),
        }
    }

    // ========================================================================
    // Phases
    // ========================================================================

    async fn run_phase(
        &self,
        plan: &PhasePlan,
        record: &mut AssessmentRecord,
        runner: &StageRunner,
        inputs: &StageInputs,
    ) {
        advance(record, plan.phase);

        if !plan.gate.is_open(record) {
            warn!(
                phase = %plan.phase,
                gate = ?plan.gate,
                "Phase gate closed; failing its stages"
            );
            for stage in plan.stages() {
                let reason = format!("upstream gate {:?} not satisfied", plan.gate);
                commit(record, SettledStage::failed_now(stage, StageFailure::error(reason)));
            }
            return;
        }

        let view: &AssessmentRecord = record;
        let batch = join_all(
            plan.concurrent
                .iter()
                .map(|stage| self.run_stage(*stage, view, runner, inputs)),
        )
        .await;
        for settled in batch {
            commit(record, settled);
        }

        for stage in plan.sequential {
            let settled = self.run_stage(*stage, record, runner, inputs).await;
            commit(record, settled);
        }
    }

    /// Build the stage's request from the record and run it.
    ///
    /// A media-bound stage whose files could not be fetched fails without
    /// its step being called.
    async fn run_stage(
        &self,
        stage: StageName,
        record: &AssessmentRecord,
        runner: &StageRunner,
        inputs: &StageInputs,
    ) -> SettledStage {
        let scratch_dir = inputs.layout.root().to_path_buf();
        let question_video_refs = record.media.question_videos().to_vec();

        match stage {
            StageName::Identity => {
                let images = inputs.media.identity_images();
                let (profile_image_path, id_document_path) = match images {
                    Ok(paths) => paths,
                    Err(missing) => return unavailable(stage, &missing),
                };
                let request = IdentityRequest {
                    candidate_id: record.candidate_id.clone(),
                    profile_image_ref: record.media.profile_image_ref.clone(),
                    id_document_ref: record.media.id_document_ref.clone(),
                    identity_video_ref: record.media.identity_video().cloned(),
                    profile_image_path,
                    id_document_path,
                    identity_video_path: inputs.media.identity_video(),
                    scratch_dir,
                };
                let s = runner.run(stage, self.suite.identity.verify(&request)).await;
                SettledStage {
                    output: StageOutput::Identity(s.result),
                    timing: s.timing,
                }
            }
            StageName::Quality => {
                let question_video_paths = match inputs.media.question_videos() {
                    Ok(paths) => paths,
                    Err(missing) => return unavailable(stage, &missing),
                };
                let request = QualityRequest {
                    question_video_refs,
                    question_video_paths,
                    scratch_dir,
                };
                let s = runner.run(stage, self.suite.quality.check(&request)).await;
                SettledStage {
                    output: StageOutput::Quality(s.result),
                    timing: s.timing,
                }
            }
            StageName::Transcription => {
                let question_video_paths = match inputs.media.question_videos() {
                    Ok(paths) => paths,
                    Err(missing) => return unavailable(stage, &missing),
                };
                let request = TranscriptionRequest {
                    question_video_refs,
                    question_video_paths,
                    audio_dir: inputs.layout.audios_dir(),
                    scratch_dir,
                };
                let s = runner
                    .run(stage, self.suite.transcription.transcribe(&request))
                    .await;
                SettledStage {
                    output: StageOutput::Transcription(s.result),
                    timing: s.timing,
                }
            }
            StageName::Content => {
                let request = ContentRequest {
                    transcripts: transcripts_for(record),
                    questions: record.questions.clone(),
                };
                let s = runner.run(stage, self.suite.content.score(&request)).await;
                SettledStage {
                    output: StageOutput::Content(s.result),
                    timing: s.timing,
                }
            }
            StageName::Behavioral => {
                let request = BehavioralRequest {
                    transcripts: transcripts_for(record),
                    identity_confidence: record.identity().payload().map(|r| r.confidence),
                };
                let s = runner.run(stage, self.suite.behavioral.score(&request)).await;
                SettledStage {
                    output: StageOutput::Behavioral(s.result),
                    timing: s.timing,
                }
            }
        }
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    async fn decide(&self, record: &mut AssessmentRecord, config: &AssessConfig) -> Decision {
        let aggregator = ScoreAggregator::new(config.scoring.clone());
        let view: &AssessmentRecord = record;
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| aggregator.aggregate(view)))
            .unwrap_or_else(|panic| {
                Err(AggregationError::Panicked(panic_message(panic.as_ref())))
            });

        let mut decision = match outcome {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    assessment_id = %record.assessment_id,
                    error = %e,
                    "Aggregation failed; using fallback decision"
                );
                record.push_error("aggregation", e.to_string());
                return aggregator.fallback_decision();
            }
        };

        let Some(writer) = self.suite.narrative.as_ref() else {
            return decision;
        };
        let request = NarrativeRequest {
            candidate_name: record.candidate_name.clone(),
            decision: decision.clone(),
        };
        let narrative_runner = StageRunner::new(config.stages.narrative_timeout());
        match narrative_runner.settle("narrative", writer.write(&request)).await {
            StageResult::Success(text) if !text.trim().is_empty() => {
                decision.reasoning_text = text.trim().to_string();
                decision.reasoning_source = ReasoningSource::Narrative;
            }
            StageResult::Success(_) => {
                record.push_error("narrative", "empty reasoning text; using template");
            }
            StageResult::Failure(f) => {
                record.push_error("narrative", format!("{f}; using template"));
            }
        }
        decision
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn advance(record: &mut AssessmentRecord, phase: PipelinePhase) {
    record.stage = phase;
    info!(assessment_id = %record.assessment_id, phase = %phase, "Pipeline phase");
}

fn unavailable(stage: StageName, missing: &MissingMedia) -> SettledStage {
    SettledStage::failed_now(stage, StageFailure::error(missing.to_string()))
}

/// Write a settled stage into its slot. A second write is rejected and logged.
fn commit(record: &mut AssessmentRecord, settled: SettledStage) {
    let stage = settled.output.stage();
    match record.fill_slot(settled.output) {
        Ok(()) => record.record_timing(settled.timing),
        Err(e) => {
            error!(assessment_id = %record.assessment_id, stage = %stage, "{e}");
            record.push_error("pipeline", e.to_string());
        }
    }
}

/// One transcript per question video. A failed transcription yields empty
/// transcripts so downstream stages still run.
fn transcripts_for(record: &AssessmentRecord) -> Vec<Transcript> {
    let expected = record.media.question_videos().len();
    let mut transcripts = record
        .transcription()
        .payload()
        .map(|r| r.per_video.clone())
        .unwrap_or_default();
    transcripts.resize(expected, Transcript::empty());
    transcripts
}

/// Check input shape before anything is acquired.
pub fn validate_submission(submission: &Submission) -> Result<(), StructuralError> {
    if submission.candidate_id.trim().is_empty() {
        return Err(StructuralError::MissingCandidateId);
    }

    let media = &submission.media;
    if media.profile_image_ref.is_blank() {
        return Err(StructuralError::BlankRef("profile_image_ref".to_string()));
    }
    if media.id_document_ref.is_blank() {
        return Err(StructuralError::BlankRef("id_document_ref".to_string()));
    }
    if media.video_refs.len() < 2 {
        return Err(StructuralError::TooFewVideos(media.video_refs.len()));
    }
    if let Some(i) = media.video_refs.iter().position(|v| v.is_blank()) {
        return Err(StructuralError::BlankRef(format!("video_refs[{i}]")));
    }

    let questions = submission.questions.len();
    let videos = media.question_videos().len();
    if questions != videos {
        return Err(StructuralError::QuestionVideoMismatch { questions, videos });
    }
    if !submission.questions.is_sequential() {
        return Err(StructuralError::NonSequentialQuestions(questions));
    }
    Ok(())
}
