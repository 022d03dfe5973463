//! Assessment Configuration - thresholds, weights, timeouts and endpoints
//!
//! Every tunable that the scoring and orchestration code depends on lives
//! here. Each struct implements `Default` with the production values, so a
//! missing config file behaves exactly like the stock service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::types::StageName;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the assessor.
///
/// Load with `AssessConfig::load()` which searches:
/// 1. `$ASSESSOR_CONFIG` env var
/// 2. `./assessor.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessConfig {
    /// Verdict thresholds and stage weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Per-stage execution limits
    #[serde(default)]
    pub stages: StageConfig,

    /// Scratch workspace location
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Remote analysis service endpoints
    #[serde(default)]
    pub services: ServicesConfig,

    /// Fetching submitted media into the workspace
    #[serde(default)]
    pub media: MediaConfig,

    /// Human-review webhook
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl AssessConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ASSESSOR_CONFIG` environment variable
    /// 2. `./assessor.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that is found but fails to parse or validate is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(defaults::CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_with(explicit.as_deref(), Path::new(defaults::CONFIG_FILE_NAME))
    }

    /// Search order behind [`AssessConfig::load`], with the env value and the
    /// local path supplied by the caller.
    ///
    /// An explicit path must exist. The local path is optional; defaults are
    /// used only when neither source names a file.
    pub fn load_with(explicit: Option<&Path>, local: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(
                path = %path.display(),
                "Loaded assessor config from {}",
                defaults::CONFIG_ENV_VAR
            );
            return Ok(config);
        }

        if local.exists() {
            let config = Self::load_from_file(local)?;
            info!(path = %local.display(), "Loaded assessor config");
            return Ok(config);
        }

        info!("No {} found, using built-in defaults", defaults::CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings with a suggested correction.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Override the verdict thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, pass: f64, review: f64) -> Self {
        self.scoring.pass_threshold = pass;
        self.scoring.review_threshold = review;
        self
    }

    /// Override the two scoring weights; gatekeeper weights are left as-is.
    #[must_use]
    pub fn with_weights(mut self, content: f64, behavioral: f64) -> Self {
        self.scoring.weights.content = content;
        self.scoring.weights.behavioral = behavioral;
        self
    }

    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stages.timeout_seconds = timeout.as_secs_f64();
        self
    }

    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace.root = Some(root.into());
        self
    }

    /// Validate thresholds, weights and timeouts for internal consistency.
    ///
    /// Rules:
    /// - Thresholds are finite and within 0-100
    /// - `review_threshold <= pass_threshold`
    /// - Each weight is within 0-1 and all weights sum to 1
    /// - Timeouts are finite and positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let s = &self.scoring;

        Self::check_percent(s.pass_threshold, "scoring.pass_threshold", &mut errors);
        Self::check_percent(s.review_threshold, "scoring.review_threshold", &mut errors);
        if s.review_threshold > s.pass_threshold {
            errors.push(format!(
                "scoring.review_threshold ({:.1}) must be <= pass_threshold ({:.1})",
                s.review_threshold, s.pass_threshold
            ));
        }

        for stage in StageName::ALL {
            let w = s.weights.get(stage);
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                errors.push(format!("scoring.weights.{stage} = {w} must be within 0.0-1.0"));
            }
        }
        let weight_sum = s.weights.sum();
        if (weight_sum - 1.0).abs() > defaults::WEIGHT_SUM_TOLERANCE {
            errors.push(format!(
                "scoring.weights must sum to 1.0, got {weight_sum:.4}"
            ));
        }

        Self::check_timeout(self.stages.timeout_seconds, "stages.timeout_seconds", &mut errors);
        Self::check_timeout(
            self.stages.narrative_timeout_seconds,
            "stages.narrative_timeout_seconds",
            &mut errors,
        );
        Self::check_timeout(self.media.timeout_seconds, "media.timeout_seconds", &mut errors);
        if self.webhook.timeout_seconds == 0 {
            errors.push("webhook.timeout_seconds must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_percent(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            errors.push(format!("{name} = {value} must be within 0-100"));
        }
    }

    fn check_timeout(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} = {value} must be a positive number of seconds"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Scoring
// ============================================================================

/// Verdict thresholds and weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// `final_score >= pass_threshold` → PASS
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    /// `review_threshold <= final_score < pass_threshold` → REVIEW
    #[serde(default = "default_review_threshold")]
    pub review_threshold: f64,
    #[serde(default)]
    pub weights: ScoringWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pass_threshold: defaults::PASS_THRESHOLD,
            review_threshold: defaults::REVIEW_THRESHOLD,
            weights: ScoringWeights::default(),
        }
    }
}

fn default_pass_threshold() -> f64 {
    defaults::PASS_THRESHOLD
}

fn default_review_threshold() -> f64 {
    defaults::REVIEW_THRESHOLD
}

/// Weight of each stage in the final score.
///
/// A stage with weight 0 is a gatekeeper: its score is reported but never
/// contributes to the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub content: f64,
    pub behavioral: f64,
    pub identity: f64,
    pub quality: f64,
    pub transcription: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            content: defaults::CONTENT_WEIGHT,
            behavioral: defaults::BEHAVIORAL_WEIGHT,
            identity: 0.0,
            quality: 0.0,
            transcription: 0.0,
        }
    }
}

impl ScoringWeights {
    pub fn get(&self, stage: StageName) -> f64 {
        match stage {
            StageName::Identity => self.identity,
            StageName::Quality => self.quality,
            StageName::Transcription => self.transcription,
            StageName::Content => self.content,
            StageName::Behavioral => self.behavioral,
        }
    }

    pub fn sum(&self) -> f64 {
        StageName::ALL.iter().map(|s| self.get(*s)).sum()
    }

    /// Stages that contribute to the final score.
    pub fn scoring_stages(&self) -> impl Iterator<Item = StageName> + '_ {
        StageName::ALL.into_iter().filter(move |s| self.get(*s) > 0.0)
    }

    pub fn is_gatekeeper(&self, stage: StageName) -> bool {
        self.get(stage) <= 0.0
    }
}

// ============================================================================
// Stages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Upper bound on each stage invocation
    pub timeout_seconds: f64,
    /// Upper bound on the narrative (reasoning) step
    pub narrative_timeout_seconds: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::STAGE_TIMEOUT_SECS,
            narrative_timeout_seconds: defaults::NARRATIVE_TIMEOUT_SECS,
        }
    }
}

impl StageConfig {
    /// Per-stage timeout. Callers validate first; invalid values clamp to the default.
    pub fn per_stage_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or(Duration::from_secs_f64(defaults::STAGE_TIMEOUT_SECS))
    }

    pub fn narrative_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.narrative_timeout_seconds)
            .unwrap_or(Duration::from_secs_f64(defaults::NARRATIVE_TIMEOUT_SECS))
    }
}

// ============================================================================
// Workspace
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Parent directory for per-request workspaces (default: `$TMPDIR/video_assessments`)
    pub root: Option<PathBuf>,
}

impl WorkspaceConfig {
    pub fn root_dir(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(defaults::WORKSPACE_DIR_NAME))
    }
}

// ============================================================================
// Services
// ============================================================================

/// Remote analysis service endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub base_url: String,
    pub identity_path: String,
    pub quality_path: String,
    pub transcription_path: String,
    pub content_path: String,
    pub behavioral_path: String,
    /// `None` disables the narrative step (template reasoning only)
    pub narrative_path: Option<String>,
    /// Bearer token sent with every request
    pub api_key: Option<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::SERVICES_BASE_URL.to_string(),
            identity_path: "/v1/identity".to_string(),
            quality_path: "/v1/quality".to_string(),
            transcription_path: "/v1/transcription".to_string(),
            content_path: "/v1/content".to_string(),
            behavioral_path: "/v1/behavioral".to_string(),
            narrative_path: Some("/v1/narrative".to_string()),
            api_key: None,
        }
    }
}

// ============================================================================
// Media
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Base URL `gs://bucket/object` references resolve against
    pub gcs_base_url: String,
    /// Bearer token sent with remote fetches
    pub auth_token: Option<String>,
    /// Upper bound on each file fetch
    pub timeout_seconds: f64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            gcs_base_url: defaults::GCS_BASE_URL.to_string(),
            auth_token: None,
            timeout_seconds: defaults::MEDIA_FETCH_TIMEOUT_SECS,
        }
    }
}

impl MediaConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or(Duration::from_secs_f64(defaults::MEDIA_FETCH_TIMEOUT_SECS))
    }
}

// ============================================================================
// Webhook
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// `None` disables human-review notifications
    pub base_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: defaults::WEBHOOK_TIMEOUT_SECS,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::SERVER_ADDR.to_string(),
        }
    }
}
