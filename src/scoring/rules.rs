//! Narrative rules: strengths, concerns and red flags
//!
//! Rules only describe the candidate. They never change the verdict; an
//! identity red flag on a high score still passes.

use crate::types::{AssessmentRecord, StageName, StageScores};

use super::templates::display_name;

// ============================================================================
// Declarative score bands
// ============================================================================

/// A strength line awarded at or above `min`.
struct Band {
    min: f64,
    text: &'static str,
    /// Append the score as `(NN% confidence)`
    quote_score: bool,
}

/// Score ladder for one stage: the first matching band wins; below
/// `concern_below` a concern is raised instead.
struct Ladder {
    stage: StageName,
    bands: &'static [Band],
    concern_below: Option<(f64, &'static str)>,
}

const fn band(min: f64, text: &'static str) -> Band {
    Band { min, text, quote_score: false }
}

const LADDERS: &[Ladder] = &[
    Ladder {
        stage: StageName::Content,
        bands: &[
            band(80.0, "Excellent responses showing strong understanding and relevant experience"),
            band(70.0, "Good responses demonstrating motivation and relevant background"),
            band(65.0, "Solid responses showing genuine interest and basic qualifications"),
            band(55.0, "Shows potential with room for growth"),
        ],
        concern_below: Some((50.0, "Responses could be more detailed and focused")),
    },
    Ladder {
        stage: StageName::Behavioral,
        bands: &[
            band(90.0, "Excellent communication skills and high engagement"),
            band(85.0, "Strong communication and professional demeanor"),
            band(80.0, "Good engagement and willingness to participate"),
            band(75.0, "Shows adequate communication and participation"),
        ],
        concern_below: Some((70.0, "Communication could be clearer, but shows effort")),
    },
    Ladder {
        stage: StageName::Transcription,
        bands: &[Band {
            min: 90.0,
            text: "High-quality audio leading to accurate transcription",
            quote_score: true,
        }],
        concern_below: Some((70.0, "Poor audio quality impacting transcription accuracy")),
    },
    Ladder {
        stage: StageName::Identity,
        bands: &[Band {
            min: 80.0,
            text: "Identity verification passed",
            quote_score: true,
        }],
        concern_below: Some((60.0, "Low identity confidence")),
    },
    Ladder {
        stage: StageName::Quality,
        bands: &[],
        concern_below: Some((50.0, "Poor video quality detected")),
    },
];

/// Red flag raised when a succeeded stage scores below a floor.
const SCORE_FLAGS: &[(StageName, f64, &str)] = &[
    (StageName::Identity, 60.0, "LOW_SIMILARITY_SCORE"),
    (StageName::Quality, 50.0, "POOR_VIDEO_QUALITY"),
    (StageName::Behavioral, 50.0, "SIGNIFICANT_COMMUNICATION_CONCERNS"),
];

pub const IDENTITY_FAILED_FLAG: &str = "IDENTITY_VERIFICATION_FAILED";
pub const NO_CONCERNS: &str = "No major concerns identified";

// ============================================================================
// Narrative
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Narrative {
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub red_flags: Vec<String>,
}

impl Narrative {
    fn strength(&mut self, text: impl Into<String>) {
        push_unique(&mut self.strengths, text.into());
    }

    fn concern(&mut self, text: impl Into<String>) {
        push_unique(&mut self.concerns, text.into());
    }

    fn flag(&mut self, text: impl Into<String>) {
        push_unique(&mut self.red_flags, text.into());
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Apply every rule to the record's component scores and stage-reported flags.
pub fn build_narrative(record: &AssessmentRecord, scores: &StageScores) -> Narrative {
    let mut n = Narrative::default();

    identity_rules(record, &mut n);

    for ladder in LADDERS {
        if !succeeded(record, ladder.stage) {
            continue;
        }
        // An unverified identity is reported by `identity_rules`.
        if ladder.stage == StageName::Identity && !identity_verified(record) {
            continue;
        }
        apply_ladder(ladder, scores.get(ladder.stage), &mut n);
    }

    for (stage, floor, flag) in SCORE_FLAGS {
        if *stage == StageName::Identity && !identity_verified(record) {
            continue;
        }
        if succeeded(record, *stage) && scores.get(*stage) < *floor {
            n.flag(*flag);
        }
    }

    combined_rules(record, scores, &mut n);
    face_visibility_rule(record, &mut n);

    if let Some(report) = record.behavioral().payload() {
        for flag in &report.flags {
            n.flag(flag.clone());
        }
    }

    for stage in StageName::ALL {
        if stage != StageName::Identity && record.stage_failure(stage).is_some() {
            n.concern(format!("{} analysis could not be completed", display_name(stage)));
        }
    }

    if n.concerns.is_empty() {
        n.concern(NO_CONCERNS);
    }
    n
}

pub(crate) fn succeeded(record: &AssessmentRecord, stage: StageName) -> bool {
    record.is_populated(stage) && record.stage_failure(stage).is_none()
}

fn identity_verified(record: &AssessmentRecord) -> bool {
    record.identity().payload().is_some_and(|r| r.verified)
}

fn apply_ladder(ladder: &Ladder, score: f64, n: &mut Narrative) {
    if let Some(band) = ladder.bands.iter().find(|b| score >= b.min) {
        if band.quote_score {
            n.strength(format!("{} ({score:.0}% confidence)", band.text));
        } else {
            n.strength(band.text);
        }
        return;
    }
    if let Some((below, text)) = ladder.concern_below {
        if score < below {
            n.concern(text);
        }
    }
}

fn identity_rules(record: &AssessmentRecord, n: &mut Narrative) {
    match record.identity().payload() {
        Some(report) => {
            if !report.verified {
                n.flag(IDENTITY_FAILED_FLAG);
                n.concern("Identity could not be verified against the submitted documents");
            }
            for flag in &report.red_flags {
                n.flag(flag.clone());
            }
        }
        None => {
            if record.identity().failure().is_some() {
                n.flag(IDENTITY_FAILED_FLAG);
                n.concern("Identity verification could not be completed");
            }
        }
    }
}

fn combined_rules(record: &AssessmentRecord, scores: &StageScores, n: &mut Narrative) {
    if let Some(content) = record.content().payload() {
        if scores.content < 40.0 && content.questions_passed() <= 1 {
            n.flag("INSUFFICIENT_RELEVANT_RESPONSES");
        }
    }

    if !(succeeded(record, StageName::Content) && succeeded(record, StageName::Behavioral)) {
        return;
    }
    let (c, b) = (scores.content, scores.behavioral);
    if c >= 65.0 && b >= 80.0 {
        n.strength("Strong overall candidate - demonstrates both competence and engagement");
    } else if c >= 55.0 && b >= 75.0 {
        n.strength("Solid candidate with good potential for the ambassador role");
    } else if c >= 50.0 || b >= 70.0 {
        n.strength("Shows promise and willingness to contribute");
    }
}

fn face_visibility_rule(record: &AssessmentRecord, n: &mut Narrative) {
    let Some(quality) = record.quality().payload() else {
        return;
    };
    let low = quality
        .per_video_issues
        .iter()
        .any(|v| v.face_visibility.is_some_and(|f| f < 50.0));
    if low {
        n.flag("POOR_FACE_VISIBILITY");
        n.concern("Face was not clearly visible in one or more videos");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BehavioralReport, ContentReport, IdentityReport, MediaRef, MediaRefs, QualityReport,
        QuestionSet, StageFailure, StageOutput, StageResult, Submission, VideoIssues,
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

    fn with_content_behavioral(content: f64, behavioral: f64) -> (AssessmentRecord, StageScores) {
        let mut rec = record();
        rec.fill_slot(StageOutput::Content(StageResult::Success(ContentReport {
            overall_score: content,
            per_question: Vec::new(),
        })))
        .unwrap();
        rec.fill_slot(StageOutput::Behavioral(StageResult::Success(BehavioralReport {
            behavioral_score: behavioral,
            flags: Vec::new(),
        })))
        .unwrap();
        let scores = StageScores { content, behavioral, ..StageScores::default() };
        (rec, scores)
    }

    #[test]
    fn strong_scores_produce_strengths_and_no_concerns() {
        let (rec, scores) = with_content_behavioral(85.0, 92.0);
        let n = build_narrative(&rec, &scores);
        assert!(n.strengths.iter().any(|s| s.starts_with("Excellent responses")));
        assert!(n.strengths.iter().any(|s| s.starts_with("Excellent communication")));
        assert!(n.strengths.iter().any(|s| s.starts_with("Strong overall candidate")));
        assert_eq!(n.concerns, vec![NO_CONCERNS.to_string()]);
        assert!(n.red_flags.is_empty());
    }

    #[test]
    fn weak_scores_raise_concerns_and_flags() {
        let (rec, scores) = with_content_behavioral(30.0, 45.0);
        let n = build_narrative(&rec, &scores);
        assert!(n.concerns.contains(&"Responses could be more detailed and focused".to_string()));
        assert!(n.red_flags.contains(&"SIGNIFICANT_COMMUNICATION_CONCERNS".to_string()));
        assert!(n.red_flags.contains(&"INSUFFICIENT_RELEVANT_RESPONSES".to_string()));
    }

    #[test]
    fn identity_stage_failure_adds_red_flag() {
        let (mut rec, scores) = with_content_behavioral(85.0, 90.0);
        rec.fill_slot(StageOutput::Identity(StageResult::Failure(StageFailure::error("no face"))))
            .unwrap();
        let n = build_narrative(&rec, &scores);
        assert!(n.red_flags.contains(&IDENTITY_FAILED_FLAG.to_string()));
    }

    #[test]
    fn unverified_identity_merges_reported_flags() {
        let (mut rec, mut scores) = with_content_behavioral(70.0, 80.0);
        rec.fill_slot(StageOutput::Identity(StageResult::Success(IdentityReport {
            verified: false,
            confidence: 30.0,
            red_flags: vec!["NAME_MISMATCH".to_string()],
        })))
        .unwrap();
        scores.identity = 30.0;
        let n = build_narrative(&rec, &scores);
        assert!(n.red_flags.contains(&IDENTITY_FAILED_FLAG.to_string()));
        assert!(n.red_flags.contains(&"NAME_MISMATCH".to_string()));
        assert!(!n.red_flags.contains(&"LOW_SIMILARITY_SCORE".to_string()));
    }

    #[test]
    fn low_face_visibility_is_flagged() {
        let (mut rec, scores) = with_content_behavioral(70.0, 80.0);
        rec.fill_slot(StageOutput::Quality(StageResult::Success(QualityReport {
            overall_score: 75.0,
            per_video_issues: vec![VideoIssues {
                video_index: 0,
                issues: Vec::new(),
                face_visibility: Some(20.0),
            }],
        })))
        .unwrap();
        let n = build_narrative(&rec, &scores);
        assert!(n.red_flags.contains(&"POOR_FACE_VISIBILITY".to_string()));
    }

    #[test]
    fn failed_stage_is_named_in_concerns() {
        let (mut rec, scores) = with_content_behavioral(85.0, 90.0);
        rec.fill_slot(StageOutput::Transcription(StageResult::Failure(StageFailure::timeout())))
            .unwrap();
        let n = build_narrative(&rec, &scores);
        assert!(n
            .concerns
            .contains(&"Transcription analysis could not be completed".to_string()));
        assert!(!n.concerns.contains(&NO_CONCERNS.to_string()));
    }
}
