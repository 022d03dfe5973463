//! Analysis step interfaces
//!
//! The pipeline knows each step only by its input/output contract. Concrete
//! implementations (remote services, local models, test fakes) plug in
//! behind these traits.
//!
//! ## Steps
//!
//! | Step          | Input                                    | Output                |
//! |---------------|------------------------------------------|-----------------------|
//! | Identity      | profile image, ID document, intro video  | `IdentityReport`      |
//! | Quality       | question videos                          | `QualityReport`       |
//! | Transcription | question videos                          | `TranscriptionReport` |
//!
//! Media-bound steps receive both the submitted references and the local
//! copies materialized in the request workspace.
//! | Content       | transcripts + question set               | `ContentReport`       |
//! | Behavioral    | transcripts + identity confidence        | `BehavioralReport`    |
//! | Narrative     | decision in progress                     | reasoning text        |

mod http;

pub use http::{HttpAnalysisClient, ServiceError};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::media::MediaFetcher;
use crate::types::{
    BehavioralReport, ContentReport, Decision, IdentityReport, MediaRef, QualityReport,
    QuestionSet, Transcript, TranscriptionReport,
};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRequest {
    pub candidate_id: String,
    pub profile_image_ref: MediaRef,
    pub id_document_ref: MediaRef,
    /// First submitted video (self-introduction)
    pub identity_video_ref: Option<MediaRef>,
    pub profile_image_path: PathBuf,
    pub id_document_path: PathBuf,
    /// `None` when the identity clip could not be fetched
    pub identity_video_path: Option<PathBuf>,
    pub scratch_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRequest {
    pub question_video_refs: Vec<MediaRef>,
    pub question_video_paths: Vec<PathBuf>,
    pub scratch_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    pub question_video_refs: Vec<MediaRef>,
    pub question_video_paths: Vec<PathBuf>,
    /// Where extracted audio tracks go
    pub audio_dir: PathBuf,
    pub scratch_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRequest {
    /// One transcript per question, in question order
    pub transcripts: Vec<Transcript>,
    pub questions: QuestionSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralRequest {
    pub transcripts: Vec<Transcript>,
    /// `None` when the identity step failed
    pub identity_confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub candidate_name: String,
    pub decision: Decision,
}

// ============================================================================
// Step traits
// ============================================================================

#[async_trait]
pub trait IdentityCheck: Send + Sync {
    async fn verify(&self, request: &IdentityRequest) -> Result<IdentityReport>;

    /// Implementation name for logging
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait QualityCheck: Send + Sync {
    async fn check(&self, request: &QualityRequest) -> Result<QualityReport>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<TranscriptionReport>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait ContentScorer: Send + Sync {
    async fn score(&self, request: &ContentRequest) -> Result<ContentReport>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait BehavioralScorer: Send + Sync {
    async fn score(&self, request: &BehavioralRequest) -> Result<BehavioralReport>;

    fn name(&self) -> &'static str;
}

/// Free-text reasoning for a decision. Optional; the aggregator's template
/// text is used when absent or failing.
#[async_trait]
pub trait NarrativeWriter: Send + Sync {
    async fn write(&self, request: &NarrativeRequest) -> Result<String>;

    fn name(&self) -> &'static str;
}

// ============================================================================
// Suite
// ============================================================================

/// The full set of collaborators one pipeline run uses.
#[derive(Clone)]
pub struct AnalysisSuite {
    pub identity: Arc<dyn IdentityCheck>,
    pub quality: Arc<dyn QualityCheck>,
    pub transcription: Arc<dyn Transcriber>,
    pub content: Arc<dyn ContentScorer>,
    pub behavioral: Arc<dyn BehavioralScorer>,
    pub narrative: Option<Arc<dyn NarrativeWriter>>,
    /// Copies submitted media into the workspace
    pub media: Arc<dyn MediaFetcher>,
}

impl AnalysisSuite {
    /// Route every analysis step through one HTTP client.
    pub fn from_http(client: HttpAnalysisClient, media: Arc<dyn MediaFetcher>) -> Self {
        let client = Arc::new(client);
        let narrative: Option<Arc<dyn NarrativeWriter>> = if client.has_narrative() {
            Some(client.clone())
        } else {
            None
        };
        Self {
            identity: client.clone(),
            quality: client.clone(),
            transcription: client.clone(),
            content: client.clone(),
            behavioral: client,
            narrative,
            media,
        }
    }
}

impl std::fmt::Debug for AnalysisSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSuite")
            .field("identity", &self.identity.name())
            .field("quality", &self.quality.name())
            .field("transcription", &self.transcription.name())
            .field("content", &self.content.name())
            .field("behavioral", &self.behavioral.name())
            .field("narrative", &self.narrative.as_ref().map(|n| n.name()))
            .field("media", &self.media.name())
            .finish()
    }
}
