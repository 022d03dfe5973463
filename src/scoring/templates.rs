//! Deterministic reasoning text
//!
//! Used when the narrative step is not configured, times out, or returns
//! nothing usable. Templates quote the actual scores and weights so the
//! text is never generic.

use crate::config::ScoringWeights;
use crate::types::{StageName, StageScores, Verdict};

/// Reasoning text when aggregation itself failed.
pub const FALLBACK_REASONING: &str = "Unable to complete full assessment. Manual review required.";

/// Recommendation when aggregation itself failed.
pub const FALLBACK_RECOMMENDATION: &str = "MANUAL REVIEW - Assessment incomplete";

/// Reasoning built from the weighted scores.
pub fn template_reasoning(verdict: Verdict, final_score: f64, weights: &ScoringWeights) -> String {
    let scored: Vec<String> = weights
        .scoring_stages()
        .map(|s| format!("{}: {:.0}%", display_name(s), weights.get(s) * 100.0))
        .collect();
    let gatekeepers: Vec<&str> = StageName::ALL
        .into_iter()
        .filter(|s| weights.is_gatekeeper(*s))
        .map(display_name)
        .collect();

    let mut text = format!(
        "Decision based on weighted scoring ({}). Final score: {:.1}/100, verdict {}.",
        scored.join(", "),
        final_score,
        verdict
    );
    if !gatekeepers.is_empty() {
        text.push_str(&format!(
            " {} {} reported for transparency but not scored.",
            join_names(&gatekeepers),
            if gatekeepers.len() == 1 { "is" } else { "are" }
        ));
    }
    text
}

/// Reasoning when no scoring stage produced a result.
pub fn insufficient_data_reasoning(weights: &ScoringWeights) -> String {
    let scored: Vec<&str> = weights.scoring_stages().map(display_name).collect();
    format!(
        "Final score 0.0/100: insufficient data. No scoring stage ({}) produced a result, so the candidate cannot be evaluated.",
        join_names(&scored)
    )
}

/// Human-readable formula, e.g. `(82.0 × 0.70) + (88.0 × 0.30) = 57.4 + 26.4 = 83.8`.
pub fn score_calculation(
    components: &StageScores,
    weights: &ScoringWeights,
    final_score: f64,
) -> String {
    let stages: Vec<StageName> = weights.scoring_stages().collect();
    let terms: Vec<String> = stages
        .iter()
        .map(|s| format!("({:.1} × {:.2})", components.get(*s), weights.get(*s)))
        .collect();
    let contributions: Vec<String> = stages
        .iter()
        .map(|s| format!("{:.1}", components.get(*s) * weights.get(*s)))
        .collect();
    format!(
        "{} = {} = {:.1}",
        terms.join(" + "),
        contributions.join(" + "),
        final_score
    )
}

pub fn display_name(stage: StageName) -> &'static str {
    match stage {
        StageName::Identity => "Identity",
        StageName::Quality => "Quality",
        StageName::Transcription => "Transcription",
        StageName::Content => "Content",
        StageName::Behavioral => "Behavioral",
    }
}

fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => (*one).to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
