//! Webhook notifier for assessments that need a human
//!
//! Sent after the decision is final and the workspace is verified clean.
//! Delivery is best-effort: a failed webhook is logged and never changes
//! the decision returned to the caller.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{defaults, WebhookConfig};
use crate::scoring::rules::IDENTITY_FAILED_FLAG;
use crate::types::{AssessmentRecord, Decision, Verdict};

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Webhook returned status {0}")]
    ServerError(reqwest::StatusCode),
}

/// Why a human should look at this assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    IdentityFailure,
    ReviewRequired,
}

impl ReviewKind {
    pub fn path(self) -> &'static str {
        match self {
            ReviewKind::IdentityFailure => "/api/webhooks/identity-failure",
            ReviewKind::ReviewRequired => "/api/webhooks/review-required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub verified: bool,
    pub confidence: f64,
}

/// Webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewNotice {
    #[serde(skip)]
    pub kind: Option<ReviewKind>,
    pub user_id: String,
    pub username: String,
    pub assessment_id: Uuid,
    pub verdict: Verdict,
    pub final_score: f64,
    /// `None` when the identity step did not produce a report
    pub identity_verification: Option<IdentitySummary>,
    pub red_flags: Vec<String>,
    pub requires_human_review: bool,
    pub failure_reason: String,
}

impl ReviewNotice {
    /// Build a notice if the outcome needs a human: identity failed, or the
    /// verdict is REVIEW.
    pub fn for_outcome(record: &AssessmentRecord, decision: &Decision) -> Option<Self> {
        let identity = record.identity();
        let identity_failed = decision.red_flags.iter().any(|f| f == IDENTITY_FAILED_FLAG);

        let (kind, failure_reason) = if identity_failed {
            let reason = match (identity.payload(), identity.failure()) {
                (Some(r), _) => format!(
                    "Identity verification failed (confidence: {:.1}%)",
                    r.confidence
                ),
                (None, Some(f)) => format!("Identity verification could not be completed: {f}"),
                (None, None) => "Identity verification did not run".to_string(),
            };
            (ReviewKind::IdentityFailure, reason)
        } else if decision.verdict == Verdict::Review {
            (
                ReviewKind::ReviewRequired,
                format!("Borderline score {:.1} requires human review", decision.final_score),
            )
        } else {
            return None;
        };

        Some(Self {
            kind: Some(kind),
            user_id: record.candidate_id.clone(),
            username: record.candidate_name.clone(),
            assessment_id: record.assessment_id,
            verdict: decision.verdict,
            final_score: decision.final_score,
            identity_verification: identity.payload().map(|r| IdentitySummary {
                verified: r.verified,
                confidence: r.confidence,
            }),
            red_flags: decision.red_flags.clone(),
            requires_human_review: true,
            failure_reason,
        })
    }
}

/// Posts review notices to `<base_url><kind path>`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    base_url: String,
}

impl WebhookNotifier {
    /// `Ok(None)` when no webhook URL is configured.
    pub fn from_config(config: &WebhookConfig) -> Result<Option<Self>, WebhookError> {
        let Some(ref base_url) = config.base_url else {
            return Ok(None);
        };
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(defaults::HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Some(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }))
    }

    pub async fn send(&self, notice: &ReviewNotice) -> Result<(), WebhookError> {
        let kind = notice.kind.unwrap_or(ReviewKind::ReviewRequired);
        let endpoint = format!("{}{}", self.base_url, kind.path());

        let resp = self.http.post(&endpoint).json(notice).send().await?;
        if !resp.status().is_success() {
            warn!(endpoint = %endpoint, status = %resp.status(), "Webhook rejected");
            return Err(WebhookError::ServerError(resp.status()));
        }
        info!(
            candidate_id = %notice.user_id,
            kind = ?kind,
            "Human-review webhook sent"
        );
        Ok(())
    }
}
