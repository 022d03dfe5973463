//! Shared fixtures for the integration tests: scripted analysis steps,
//! a tracking workspace provider, and canned submissions.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use interview_assessor::media::MediaFetcher;
use interview_assessor::stages::{
    AnalysisSuite, BehavioralRequest, BehavioralScorer, ContentRequest, ContentScorer,
    IdentityCheck, IdentityRequest, NarrativeRequest, NarrativeWriter, QualityCheck,
    QualityRequest, Transcriber, TranscriptionRequest,
};
use interview_assessor::types::{
    BehavioralReport, ContentReport, IdentityReport, MediaRef, MediaRefs, QualityReport,
    QuestionScore, QuestionSet, StageName, Submission, Transcript, TranscriptionReport,
};
use interview_assessor::workspace::{
    CleanupReport, DirWorkspaceProvider, ScratchArea, WorkspaceError, WorkspaceProvider,
};

// ============================================================================
// Scripted steps
// ============================================================================

/// What a scripted step does when invoked.
#[derive(Debug, Clone)]
pub enum Script<T> {
    Ok(T),
    Err(&'static str),
    Panic(&'static str),
    /// Sleep far past any test timeout
    Hang,
}

/// Ordered start/end events shared by every step of one suite.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// A test double for any analysis step.
///
/// Records each request it receives (as JSON) and logs `start:<label>` /
/// `end:<label>` around its work.
pub struct ScriptedStep<T> {
    label: &'static str,
    script: Script<T>,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<serde_json::Value>>,
    events: EventLog,
}

impl<T: Clone + Send + Sync> ScriptedStep<T> {
    pub fn new(label: &'static str, script: Script<T>, delay: Duration, events: EventLog) -> Self {
        Self {
            label,
            script,
            delay,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, as JSON.
    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.requests.lock().unwrap().last().cloned()
    }

    async fn invoke(&self, request: &impl Serialize) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());
        self.events.lock().unwrap().push(format!("start:{}", self.label));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = match &self.script {
            Script::Ok(value) => Ok(value.clone()),
            Script::Err(msg) => Err(anyhow::anyhow!(*msg)),
            Script::Panic(msg) => panic!("{msg}"),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Err(anyhow::anyhow!("woke from hang"))
            }
        };
        self.events.lock().unwrap().push(format!("end:{}", self.label));
        outcome
    }
}

#[async_trait]
impl IdentityCheck for ScriptedStep<IdentityReport> {
    async fn verify(&self, request: &IdentityRequest) -> Result<IdentityReport> {
        self.invoke(request).await
    }

    fn name(&self) -> &'static str {
        "scripted-identity"
    }
}

#[async_trait]
impl QualityCheck for ScriptedStep<QualityReport> {
    async fn check(&self, request: &QualityRequest) -> Result<QualityReport> {
        self.invoke(request).await
    }

    fn name(&self) -> &'static str {
        "scripted-quality"
    }
}

#[async_trait]
impl Transcriber for ScriptedStep<TranscriptionReport> {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<TranscriptionReport> {
        self.invoke(request).await
    }

    fn name(&self) -> &'static str {
        "scripted-transcription"
    }
}

#[async_trait]
impl ContentScorer for ScriptedStep<ContentReport> {
    async fn score(&self, request: &ContentRequest) -> Result<ContentReport> {
        self.invoke(request).await
    }

    fn name(&self) -> &'static str {
        "scripted-content"
    }
}

#[async_trait]
impl BehavioralScorer for ScriptedStep<BehavioralReport> {
    async fn score(&self, request: &BehavioralRequest) -> Result<BehavioralReport> {
        self.invoke(request).await
    }

    fn name(&self) -> &'static str {
        "scripted-behavioral"
    }
}

#[async_trait]
impl NarrativeWriter for ScriptedStep<String> {
    async fn write(&self, request: &NarrativeRequest) -> Result<String> {
        self.invoke(request).await
    }

    fn name(&self) -> &'static str {
        "scripted-narrative"
    }
}

// ============================================================================
// Scripted media fetcher
// ============================================================================

/// Writes a small file per reference; listed references fail instead.
#[derive(Default)]
pub struct ScriptedFetcher {
    failing: Vec<String>,
    fetched: Mutex<Vec<(String, PathBuf)>>,
}

impl ScriptedFetcher {
    pub fn failing(locators: &[&str]) -> Self {
        Self {
            failing: locators.iter().map(|l| (*l).to_string()).collect(),
            ..Self::default()
        }
    }

    /// `(reference, destination)` for every successful fetch.
    pub fn fetched(&self) -> Vec<(String, PathBuf)> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &MediaRef, dest: &Path) -> Result<u64> {
        if self.failing.iter().any(|f| f == source.as_str()) {
            anyhow::bail!("{source} returned status 404 Not Found");
        }
        let body = format!("bytes of {source}");
        tokio::fs::write(dest, body.as_bytes()).await?;
        self.fetched
            .lock()
            .unwrap()
            .push((source.as_str().to_string(), dest.to_path_buf()));
        Ok(body.len() as u64)
    }

    fn name(&self) -> &'static str {
        "scripted-media"
    }
}

// ============================================================================
// Payload builders
// ============================================================================

pub fn identity_ok(confidence: f64) -> IdentityReport {
    IdentityReport {
        verified: true,
        confidence,
        red_flags: Vec::new(),
    }
}

pub fn quality_ok(score: f64) -> QualityReport {
    QualityReport {
        overall_score: score,
        per_video_issues: Vec::new(),
    }
}

pub fn transcription_ok(videos: usize) -> TranscriptionReport {
    TranscriptionReport {
        per_video: (0..videos)
            .map(|i| Transcript {
                text: format!("answer to question {}", i + 1),
                confidence: 0.93,
                word_count: 4,
            })
            .collect(),
        avg_confidence: 0.93,
    }
}

pub fn content_ok(score: f64, questions: u32) -> ContentReport {
    ContentReport {
        overall_score: score,
        per_question: (1..=questions)
            .map(|n| QuestionScore {
                question_number: n,
                score,
                passed: score >= 60.0,
                feedback: None,
            })
            .collect(),
    }
}

pub fn behavioral_ok(score: f64) -> BehavioralReport {
    BehavioralReport {
        behavioral_score: score,
        flags: Vec::new(),
    }
}

// ============================================================================
// Suite
// ============================================================================

/// Number of questions in the canned submission.
pub const QUESTIONS: usize = 4;

fn step<T: Clone + Send + Sync>(
    label: &'static str,
    script: Script<T>,
    delay: Duration,
    events: &EventLog,
) -> Arc<ScriptedStep<T>> {
    Arc::new(ScriptedStep::new(label, script, delay, events.clone()))
}

/// One scripted step per stage plus a media fetcher, sharing an event log.
pub struct ScriptedSuite {
    pub events: EventLog,
    pub identity: Arc<ScriptedStep<IdentityReport>>,
    pub quality: Arc<ScriptedStep<QualityReport>>,
    pub transcription: Arc<ScriptedStep<TranscriptionReport>>,
    pub content: Arc<ScriptedStep<ContentReport>>,
    pub behavioral: Arc<ScriptedStep<BehavioralReport>>,
    pub narrative: Option<Arc<ScriptedStep<String>>>,
    pub media: Arc<ScriptedFetcher>,
}

impl ScriptedSuite {
    /// Every step succeeds with the given content and behavioral scores.
    pub fn passing(content: f64, behavioral: f64) -> Self {
        let events: EventLog = Arc::default();
        let zero = Duration::ZERO;
        Self {
            identity: step("identity", Script::Ok(identity_ok(92.0)), zero, &events),
            quality: step("quality", Script::Ok(quality_ok(80.0)), zero, &events),
            transcription: step(
                "transcription",
                Script::Ok(transcription_ok(QUESTIONS)),
                zero,
                &events,
            ),
            content: step(
                "content",
                Script::Ok(content_ok(content, QUESTIONS as u32)),
                zero,
                &events,
            ),
            behavioral: step("behavioral", Script::Ok(behavioral_ok(behavioral)), zero, &events),
            narrative: None,
            media: Arc::default(),
            events,
        }
    }

    pub fn identity(mut self, script: Script<IdentityReport>) -> Self {
        self.identity = step("identity", script, Duration::ZERO, &self.events);
        self
    }

    pub fn quality(mut self, script: Script<QualityReport>, delay: Duration) -> Self {
        self.quality = step("quality", script, delay, &self.events);
        self
    }

    pub fn transcription(mut self, script: Script<TranscriptionReport>, delay: Duration) -> Self {
        self.transcription = step("transcription", script, delay, &self.events);
        self
    }

    pub fn content(mut self, script: Script<ContentReport>) -> Self {
        self.content = step("content", script, Duration::ZERO, &self.events);
        self
    }

    pub fn behavioral(mut self, script: Script<BehavioralReport>) -> Self {
        self.behavioral = step("behavioral", script, Duration::ZERO, &self.events);
        self
    }

    pub fn narrative(mut self, script: Script<String>) -> Self {
        self.narrative = Some(step("narrative", script, Duration::ZERO, &self.events));
        self
    }

    /// Make one stage's step return an error.
    pub fn failing(self, stage: StageName, reason: &'static str) -> Self {
        match stage {
            StageName::Identity => self.identity(Script::Err(reason)),
            StageName::Quality => self.quality(Script::Err(reason), Duration::ZERO),
            StageName::Transcription => self.transcription(Script::Err(reason), Duration::ZERO),
            StageName::Content => self.content(Script::Err(reason)),
            StageName::Behavioral => self.behavioral(Script::Err(reason)),
        }
    }

    /// Fail the fetch of each listed media reference.
    pub fn media_failing(mut self, locators: &[&str]) -> Self {
        self.media = Arc::new(ScriptedFetcher::failing(locators));
        self
    }

    pub fn suite(&self) -> AnalysisSuite {
        AnalysisSuite {
            identity: self.identity.clone(),
            quality: self.quality.clone(),
            transcription: self.transcription.clone(),
            content: self.content.clone(),
            behavioral: self.behavioral.clone(),
            narrative: self
                .narrative
                .clone()
                .map(|n| n as Arc<dyn NarrativeWriter>),
            media: self.media.clone(),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Position of an event in the log.
    pub fn event_index(&self, event: &str) -> usize {
        self.events()
            .iter()
            .position(|e| e == event)
            .unwrap_or_else(|| panic!("event {event} not logged"))
    }
}

// ============================================================================
// Workspace provider
// ============================================================================

/// Wraps the directory provider, counting acquisitions and releases.
///
/// `leave_behind` makes every release report an unverified cleanup.
pub struct TrackingProvider {
    inner: DirWorkspaceProvider,
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub paths: Arc<Mutex<Vec<PathBuf>>>,
    leave_behind: bool,
}

impl TrackingProvider {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: DirWorkspaceProvider::new(root),
            acquired: Arc::default(),
            released: Arc::default(),
            paths: Arc::default(),
            leave_behind: false,
        }
    }

    pub fn leaving_files_behind(mut self) -> Self {
        self.leave_behind = true;
        self
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl WorkspaceProvider for TrackingProvider {
    fn acquire(&self, key: &str) -> Result<Box<dyn ScratchArea>, WorkspaceError> {
        let area = self.inner.acquire(key)?;
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(area.root().to_path_buf());
        Ok(Box::new(TrackedArea {
            inner: area,
            released: self.released.clone(),
            leave_behind: self.leave_behind,
        }))
    }
}

#[derive(Debug)]
struct TrackedArea {
    inner: Box<dyn ScratchArea>,
    released: Arc<AtomicUsize>,
    leave_behind: bool,
}

impl ScratchArea for TrackedArea {
    fn root(&self) -> &Path {
        self.inner.root()
    }

    fn release(&mut self) -> CleanupReport {
        self.released.fetch_add(1, Ordering::SeqCst);
        if self.leave_behind {
            return CleanupReport {
                workspace: self.inner.root().to_path_buf(),
                deleted: true,
                verified: false,
                ..CleanupReport::default()
            };
        }
        self.inner.release()
    }
}

// ============================================================================
// Submissions
// ============================================================================

/// Four questions answered in five videos (identity clip first).
pub fn submission() -> Submission {
    let questions: Vec<_> = QuestionSet::ambassador_program()
        .iter()
        .take(QUESTIONS)
        .cloned()
        .collect();
    Submission {
        candidate_id: "cand-0042".to_string(),
        candidate_name: "Jordan Reyes".to_string(),
        media: MediaRefs {
            profile_image_ref: MediaRef::new("gs://uploads/cand-0042/profile.jpg"),
            id_document_ref: MediaRef::new("gs://uploads/cand-0042/id_card.jpg"),
            video_refs: (0..=QUESTIONS)
                .map(|i| MediaRef::new(format!("gs://uploads/cand-0042/video_{i}.webm")))
                .collect(),
        },
        questions: QuestionSet::new(questions),
    }
}
