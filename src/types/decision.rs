//! Final assessment decision

use serde::{Deserialize, Serialize};

use super::{QuestionScore, StageName};

/// Pass / review / fail outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Pass,
    Review,
    Fail,
}

impl Verdict {
    /// Reviewer-facing recommendation line.
    pub fn recommendation(self) -> &'static str {
        match self {
            Verdict::Pass => "PROCEED TO NEXT ROUND - Shows potential and positive intent",
            Verdict::Review => "MANUAL REVIEW REQUIRED - Borderline but salvageable",
            Verdict::Fail => "REJECT - Significant concerns or poor performance",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Review => write!(f, "REVIEW"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// How far the final score sits from a verdict boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// Where `reasoning_text` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningSource {
    /// Written by the narrative step
    Narrative,
    /// Deterministic template (narrative step absent or failed)
    Template,
    /// Aggregation itself failed
    Fallback,
}

/// One number per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageScores {
    pub identity: f64,
    pub quality: f64,
    pub transcription: f64,
    pub content: f64,
    pub behavioral: f64,
}

impl StageScores {
    pub fn get(&self, stage: StageName) -> f64 {
        match stage {
            StageName::Identity => self.identity,
            StageName::Quality => self.quality,
            StageName::Transcription => self.transcription,
            StageName::Content => self.content,
            StageName::Behavioral => self.behavioral,
        }
    }

    pub fn set(&mut self, stage: StageName, value: f64) {
        match stage {
            StageName::Identity => self.identity = value,
            StageName::Quality => self.quality = value,
            StageName::Transcription => self.transcription = value,
            StageName::Content => self.content = value,
            StageName::Behavioral => self.behavioral = value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StageName, f64)> + '_ {
        StageName::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }
}

/// Raw component score per stage (0 for failed stages).
pub type ComponentScores = StageScores;

/// Weighted contribution of each stage to the final score.
pub type WeightedBreakdown = StageScores;

/// The output of aggregation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    /// 0-100, one decimal
    pub final_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub component_scores: ComponentScores,
    pub weighted_breakdown: WeightedBreakdown,
    /// Human-readable formula, e.g. `(82.0 × 0.70) + (88.0 × 0.30) = ...`
    pub score_calculation: String,
    pub reasoning_text: String,
    pub reasoning_source: ReasoningSource,
    pub recommendation: String,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub red_flags: Vec<String>,
    /// Per-question content results, empty when content failed
    #[serde(default)]
    pub question_details: Vec<QuestionScore>,
}
