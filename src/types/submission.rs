//! Candidate submission: who is being assessed and where their media lives
//!
//! Media references are opaque locators (e.g. `gs://bucket/user/video_0.webm`)
//! resolved by the analysis steps. The pipeline never reads the bytes itself.

use serde::{Deserialize, Serialize};

use super::QuestionSet;

/// Opaque media locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// All media submitted by one candidate.
///
/// `video_refs[0]` is the identity-check clip; `video_refs[1..]` answer the
/// questions in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRefs {
    pub profile_image_ref: MediaRef,
    pub id_document_ref: MediaRef,
    pub video_refs: Vec<MediaRef>,
}

impl MediaRefs {
    /// The identity-check clip, if any videos were submitted.
    pub fn identity_video(&self) -> Option<&MediaRef> {
        self.video_refs.first()
    }

    /// Question-response videos (index 1..N).
    pub fn question_videos(&self) -> &[MediaRef] {
        self.video_refs.get(1..).unwrap_or(&[])
    }
}

/// Everything `assess` needs about one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub candidate_id: String,
    pub candidate_name: String,
    pub media: MediaRefs,
    /// Falls back to the Ambassador Program set when omitted in JSON.
    #[serde(default = "QuestionSet::ambassador_program")]
    pub questions: QuestionSet,
}
