//! HTTP client for remote analysis services
//!
//! Each step is a JSON POST to `<base_url><step path>`; the response body is
//! the step's report. Per-call deadlines are enforced by the stage runner,
//! so the client only bounds connection setup.

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{
    BehavioralRequest, BehavioralScorer, ContentRequest, ContentScorer, IdentityCheck,
    IdentityRequest, NarrativeRequest, NarrativeWriter, QualityCheck, QualityRequest,
    TranscriptionRequest, Transcriber,
};
use crate::config::{defaults, ServicesConfig};
use crate::types::{
    BehavioralReport, ContentReport, IdentityReport, QualityReport, TranscriptionReport,
};

/// Remote service errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned status {status}")]
    ServerError {
        endpoint: String,
        status: reqwest::StatusCode,
    },
    #[error("narrative step is not configured")]
    NarrativeDisabled,
}

#[derive(Debug, Deserialize)]
struct NarrativeResponse {
    reasoning_text: String,
}

/// One client serving all analysis steps.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    config: ServicesConfig,
}

impl HttpAnalysisClient {
    pub fn new(config: &ServicesConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(defaults::HTTP_CONNECT_TIMEOUT_SECS))
            .build()?;

        let mut config = config.clone();
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { http, config })
    }

    pub fn has_narrative(&self) -> bool {
        self.config.narrative_path.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ServiceError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(endpoint = %url, "Calling analysis service");

        let mut req = self.http.post(&url).json(body);
        if let Some(ref key) = self.config.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;

        if !resp.status().is_success() {
            return Err(ServiceError::ServerError {
                endpoint: url,
                status: resp.status(),
            });
        }
        Ok(resp.json::<Resp>().await?)
    }
}

#[async_trait]
impl IdentityCheck for HttpAnalysisClient {
    async fn verify(&self, request: &IdentityRequest) -> Result<IdentityReport> {
        Ok(self.post(&self.config.identity_path, request).await?)
    }

    fn name(&self) -> &'static str {
        "http-identity"
    }
}

#[async_trait]
impl QualityCheck for HttpAnalysisClient {
    async fn check(&self, request: &QualityRequest) -> Result<QualityReport> {
        Ok(self.post(&self.config.quality_path, request).await?)
    }

    fn name(&self) -> &'static str {
        "http-quality"
    }
}

#[async_trait]
impl Transcriber for HttpAnalysisClient {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<TranscriptionReport> {
        Ok(self.post(&self.config.transcription_path, request).await?)
    }

    fn name(&self) -> &'static str {
        "http-transcription"
    }
}

#[async_trait]
impl ContentScorer for HttpAnalysisClient {
    async fn score(&self, request: &ContentRequest) -> Result<ContentReport> {
        Ok(self.post(&self.config.content_path, request).await?)
    }

    fn name(&self) -> &'static str {
        "http-content"
    }
}

#[async_trait]
impl BehavioralScorer for HttpAnalysisClient {
    async fn score(&self, request: &BehavioralRequest) -> Result<BehavioralReport> {
        Ok(self.post(&self.config.behavioral_path, request).await?)
    }

    fn name(&self) -> &'static str {
        "http-behavioral"
    }
}

#[async_trait]
impl NarrativeWriter for HttpAnalysisClient {
    async fn write(&self, request: &NarrativeRequest) -> Result<String> {
        let path = self
            .config
            .narrative_path
            .as_deref()
            .ok_or(ServiceError::NarrativeDisabled)?;
        let resp: NarrativeResponse = self.post(path, request).await?;
        Ok(resp.reasoning_text)
    }

    fn name(&self) -> &'static str {
        "http-narrative"
    }
}
