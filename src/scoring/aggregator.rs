//! Score Aggregator - weighted verdict over a settled assessment record
//!
//! ## Scoring
//!
//! Each stage maps to one component score in 0-100:
//!
//! | Stage         | Component                 |
//! |---------------|---------------------------|
//! | Identity      | `confidence`              |
//! | Quality       | `overall_score`           |
//! | Transcription | `avg_confidence × 100`    |
//! | Content       | `overall_score`           |
//! | Behavioral    | `behavioral_score`        |
//!
//! Failed stages contribute 0. `final_score = Σ weight × component`, rounded
//! to one decimal. Stages with weight 0 are reported but never scored.
//!
//! ## Verdict
//!
//! | Final score                           | Verdict |
//! |---------------------------------------|---------|
//! | `>= pass_threshold`                   | PASS    |
//! | `>= review_threshold`                 | REVIEW  |
//! | otherwise                             | FAIL    |

use crate::config::defaults::{HIGH_CONFIDENCE_MARGIN, MEDIUM_CONFIDENCE_MARGIN};
use crate::config::ScoringConfig;
use crate::types::{
    AssessmentRecord, ConfidenceLevel, Decision, ReasoningSource, StageName, StageScores, Verdict,
};

use super::rules::{build_narrative, succeeded};
use super::templates::{
    insufficient_data_reasoning, score_calculation, template_reasoning, FALLBACK_REASONING,
    FALLBACK_RECOMMENDATION,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("{stage} score {value} is outside 0-100")]
    ScoreOutOfRange { stage: StageName, value: f64 },
    #[error("aggregation panicked: {0}")]
    Panicked(String),
}

/// Computes the final decision from a record whose stage slots are settled.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    scoring: ScoringConfig,
}

impl ScoreAggregator {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }

    /// Build the decision. Pure: the same record always yields the same decision.
    ///
    /// `reasoning_text` is the template text; the caller may replace it with
    /// narrative output.
    pub fn aggregate(&self, record: &AssessmentRecord) -> Result<Decision, AggregationError> {
        let components = component_scores(record)?;
        let weights = &self.scoring.weights;

        let mut weighted = StageScores::default();
        for (stage, score) in components.iter() {
            weighted.set(stage, round1(score * weights.get(stage)));
        }

        let any_failure = StageName::ALL
            .iter()
            .any(|s| record.stage_failure(*s).is_some());
        let insufficient = weights
            .scoring_stages()
            .all(|s| !succeeded(record, s));

        let narrative = build_narrative(record, &components);
        let question_details = record
            .content()
            .payload()
            .map(|c| c.per_question.clone())
            .unwrap_or_default();

        let (final_score, verdict, reasoning_text, calculation) = if insufficient {
            (
                0.0,
                Verdict::Fail,
                insufficient_data_reasoning(weights),
                score_calculation(&components, weights, 0.0),
            )
        } else {
            let raw: f64 = weights
                .scoring_stages()
                .map(|s| components.get(s) * weights.get(s))
                .sum();
            let final_score = round1(raw);
            let verdict = self.verdict_for(final_score);
            (
                final_score,
                verdict,
                template_reasoning(verdict, final_score, weights),
                score_calculation(&components, weights, final_score),
            )
        };

        Ok(Decision {
            verdict,
            final_score,
            confidence_level: self.confidence_for(final_score, any_failure),
            component_scores: round_scores(&components),
            weighted_breakdown: weighted,
            score_calculation: calculation,
            reasoning_text,
            reasoning_source: ReasoningSource::Template,
            recommendation: verdict.recommendation().to_string(),
            strengths: narrative.strengths,
            concerns: narrative.concerns,
            red_flags: narrative.red_flags,
            question_details,
        })
    }

    /// Decision used when aggregation itself fails: REVIEW with zeroed scores.
    pub fn fallback_decision(&self) -> Decision {
        Decision {
            verdict: Verdict::Review,
            final_score: 0.0,
            confidence_level: ConfidenceLevel::Low,
            component_scores: StageScores::default(),
            weighted_breakdown: StageScores::default(),
            score_calculation: String::new(),
            reasoning_text: FALLBACK_REASONING.to_string(),
            reasoning_source: ReasoningSource::Fallback,
            recommendation: FALLBACK_RECOMMENDATION.to_string(),
            strengths: Vec::new(),
            concerns: vec!["Assessment processing failed".to_string()],
            red_flags: Vec::new(),
            question_details: Vec::new(),
        }
    }

    pub fn verdict_for(&self, final_score: f64) -> Verdict {
        if final_score >= self.scoring.pass_threshold {
            Verdict::Pass
        } else if final_score >= self.scoring.review_threshold {
            Verdict::Review
        } else {
            Verdict::Fail
        }
    }

    /// Distance from the nearest threshold; capped at Medium when any stage failed.
    pub fn confidence_for(&self, final_score: f64, any_failure: bool) -> ConfidenceLevel {
        let margin = (final_score - self.scoring.pass_threshold)
            .abs()
            .min((final_score - self.scoring.review_threshold).abs());
        let level = if margin >= HIGH_CONFIDENCE_MARGIN {
            ConfidenceLevel::High
        } else if margin >= MEDIUM_CONFIDENCE_MARGIN {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        };
        if any_failure {
            level.min(ConfidenceLevel::Medium)
        } else {
            level
        }
    }
}

/// Raw component scores; failed or missing stages are 0.
pub fn component_scores(record: &AssessmentRecord) -> Result<StageScores, AggregationError> {
    let mut scores = StageScores::default();
    if let Some(r) = record.identity().payload() {
        scores.identity = r.confidence;
    }
    if let Some(r) = record.quality().payload() {
        scores.quality = r.overall_score;
    }
    if let Some(r) = record.transcription().payload() {
        scores.transcription = r.avg_confidence * 100.0;
    }
    if let Some(r) = record.content().payload() {
        scores.content = r.overall_score;
    }
    if let Some(r) = record.behavioral().payload() {
        scores.behavioral = r.behavioral_score;
    }

    for (stage, value) in scores.iter() {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(AggregationError::ScoreOutOfRange { stage, value });
        }
    }
    Ok(scores)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round_scores(scores: &StageScores) -> StageScores {
    let mut out = StageScores::default();
    for (stage, value) in scores.iter() {
        out.set(stage, round1(value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BehavioralReport, ContentReport, IdentityReport, MediaRef, MediaRefs, QuestionSet,
        StageFailure, StageOutput, StageResult, Submission,
    };

    fn record() -> AssessmentRecord {
        AssessmentRecord::new(Submission {
            candidate_id: "c".to_string(),
            candidate_name: "C".to_string(),
            media: MediaRefs {
                profile_image_ref: MediaRef::new("p"),
                id_document_ref: MediaRef::new("d"),
                video_refs: vec![MediaRef::new("v0"), MediaRef::new("v1")],
            },
            questions: QuestionSet::default(),
        })
    }

    fn content(score: f64) -> StageOutput {
        StageOutput::Content(StageResult::Success(ContentReport {
            overall_score: score,
            per_question: Vec::new(),
        }))
    }

    fn behavioral(score: f64) -> StageOutput {
        StageOutput::Behavioral(StageResult::Success(BehavioralReport {
            behavioral_score: score,
            flags: Vec::new(),
        }))
    }

    fn aggregator(pass: f64, review: f64) -> ScoreAggregator {
        ScoreAggregator::new(ScoringConfig {
            pass_threshold: pass,
            review_threshold: review,
            ..ScoringConfig::default()
        })
    }

    #[test]
    fn weighted_sum_and_verdict() {
        let mut rec = record();
        rec.fill_slot(content(82.0)).unwrap();
        rec.fill_slot(behavioral(88.0)).unwrap();

        let d = aggregator(70.0, 60.0).aggregate(&rec).unwrap();
        assert_eq!(d.final_score, 83.8);
        assert_eq!(d.verdict, Verdict::Pass);
        assert_eq!(d.weighted_breakdown.content, 57.4);
        assert_eq!(d.weighted_breakdown.behavioral, 26.4);
        assert_eq!(d.reasoning_source, ReasoningSource::Template);
        assert!(!d.reasoning_text.is_empty());
    }

    #[test]
    fn gatekeeper_scores_are_visible_but_unscored() {
        let mut rec = record();
        rec.fill_slot(content(60.0)).unwrap();
        rec.fill_slot(behavioral(60.0)).unwrap();
        rec.fill_slot(StageOutput::Identity(StageResult::Success(IdentityReport {
            verified: true,
            confidence: 95.0,
            red_flags: Vec::new(),
        })))
        .unwrap();

        let d = aggregator(65.0, 55.0).aggregate(&rec).unwrap();
        assert_eq!(d.component_scores.identity, 95.0);
        assert_eq!(d.weighted_breakdown.identity, 0.0);
        assert_eq!(d.final_score, 60.0);
        assert_eq!(d.verdict, Verdict::Review);
    }

    #[test]
    fn both_scoring_stages_failed_is_insufficient_data() {
        let mut rec = record();
        rec.fill_slot(StageOutput::Content(StageResult::Failure(StageFailure::error("x"))))
            .unwrap();
        rec.fill_slot(StageOutput::Behavioral(StageResult::Failure(StageFailure::timeout())))
            .unwrap();

        let d = aggregator(65.0, 55.0).aggregate(&rec).unwrap();
        assert_eq!(d.final_score, 0.0);
        assert_eq!(d.verdict, Verdict::Fail);
        assert!(d.reasoning_text.contains("insufficient data"));
        assert_eq!(d.confidence_level, ConfidenceLevel::Medium);
    }

    #[test]
    fn one_failed_scoring_stage_contributes_zero() {
        let mut rec = record();
        rec.fill_slot(content(90.0)).unwrap();
        rec.fill_slot(StageOutput::Behavioral(StageResult::Failure(StageFailure::error("x"))))
            .unwrap();

        let d = aggregator(65.0, 55.0).aggregate(&rec).unwrap();
        assert_eq!(d.final_score, 63.0);
        assert_eq!(d.verdict, Verdict::Review);
    }

    #[test]
    fn out_of_range_score_is_an_error() {
        let mut rec = record();
        rec.fill_slot(content(140.0)).unwrap();
        rec.fill_slot(behavioral(50.0)).unwrap();

        let err = aggregator(65.0, 55.0).aggregate(&rec).unwrap_err();
        assert_eq!(
            err,
            AggregationError::ScoreOutOfRange { stage: StageName::Content, value: 140.0 }
        );
    }

    #[test]
    fn nan_score_is_an_error() {
        let mut rec = record();
        rec.fill_slot(content(f64::NAN)).unwrap();
        rec.fill_slot(behavioral(50.0)).unwrap();
        assert!(aggregator(65.0, 55.0).aggregate(&rec).is_err());
    }

    #[test]
    fn threshold_boundaries_are_inclusive() {
        let agg = aggregator(65.0, 55.0);
        assert_eq!(agg.verdict_for(65.0), Verdict::Pass);
        assert_eq!(agg.verdict_for(64.9), Verdict::Review);
        assert_eq!(agg.verdict_for(55.0), Verdict::Review);
        assert_eq!(agg.verdict_for(54.9), Verdict::Fail);
    }

    #[test]
    fn confidence_tracks_margin_and_failures() {
        let agg = aggregator(65.0, 55.0);
        assert_eq!(agg.confidence_for(90.0, false), ConfidenceLevel::High);
        assert_eq!(agg.confidence_for(72.0, false), ConfidenceLevel::Medium);
        assert_eq!(agg.confidence_for(63.0, false), ConfidenceLevel::Low);
        assert_eq!(agg.confidence_for(90.0, true), ConfidenceLevel::Medium);
    }

    #[test]
    fn fallback_is_review_with_fixed_reasoning() {
        let d = aggregator(65.0, 55.0).fallback_decision();
        assert_eq!(d.verdict, Verdict::Review);
        assert_eq!(d.reasoning_text, FALLBACK_REASONING);
        assert_eq!(d.component_scores, StageScores::default());
    }

    #[test]
    fn same_record_same_decision() {
        let mut rec = record();
        rec.fill_slot(content(71.0)).unwrap();
        rec.fill_slot(behavioral(64.0)).unwrap();
        let agg = aggregator(65.0, 55.0);
        assert_eq!(agg.aggregate(&rec).unwrap(), agg.aggregate(&rec).unwrap());
    }
}
