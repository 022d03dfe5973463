//! Stage names, stage outcomes, and the fixed-shape payload each analysis
//! step returns.

use serde::{Deserialize, Serialize};

// ============================================================================
// Stage identity
// ============================================================================

/// The five analysis stages of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Identity,
    Quality,
    Transcription,
    Content,
    Behavioral,
}

impl StageName {
    /// All stages in reporting order.
    pub const ALL: [StageName; 5] = [
        StageName::Identity,
        StageName::Quality,
        StageName::Transcription,
        StageName::Content,
        StageName::Behavioral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageName::Identity => "identity",
            StageName::Quality => "quality",
            StageName::Transcription => "transcription",
            StageName::Content => "content",
            StageName::Behavioral => "behavioral",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Stage outcome
// ============================================================================

/// Why a stage did not produce a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The step returned an error
    Error,
    /// The step exceeded its per-stage timeout
    Timeout,
    /// The step panicked
    Panicked,
}

/// A recovered stage failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl StageFailure {
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Error,
            reason: reason.into(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            kind: FailureKind::Timeout,
            reason: "timeout".to_string(),
        }
    }

    pub fn panicked(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Panicked,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Tagged outcome of one stage: a payload or a recovered failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum StageResult<T> {
    Success(T),
    Failure(StageFailure),
}

impl<T> StageResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            StageResult::Success(v) => Some(v),
            StageResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            StageResult::Success(_) => None,
            StageResult::Failure(f) => Some(f),
        }
    }
}

// ============================================================================
// Stage payloads
// ============================================================================

/// Identity step output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityReport {
    pub verified: bool,
    /// 0-100
    pub confidence: f64,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

/// Problems detected in one question video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoIssues {
    /// Index into the question videos (0 = first question)
    pub video_index: usize,
    #[serde(default)]
    pub issues: Vec<String>,
    /// Percentage of frames with a clearly visible face, when measured
    #[serde(default)]
    pub face_visibility: Option<f64>,
}

/// Quality step output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0-100
    pub overall_score: f64,
    #[serde(default)]
    pub per_video_issues: Vec<VideoIssues>,
}

/// Transcript of one question video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// 0.0-1.0
    pub confidence: f64,
    pub word_count: u32,
}

impl Transcript {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Transcription step output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionReport {
    pub per_video: Vec<Transcript>,
    /// 0.0-1.0
    pub avg_confidence: f64,
}

/// Content score for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_number: u32,
    /// 0-100
    pub score: f64,
    pub passed: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Content step output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentReport {
    /// 0-100
    pub overall_score: f64,
    #[serde(default)]
    pub per_question: Vec<QuestionScore>,
}

impl ContentReport {
    pub fn questions_passed(&self) -> usize {
        self.per_question.iter().filter(|q| q.passed).count()
    }
}

/// Behavioral step output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralReport {
    /// 0-100
    pub behavioral_score: f64,
    #[serde(default)]
    pub flags: Vec<String>,
}
