//! Config validation: unknown-key detection with Levenshtein suggestions
//! and sanity checks on otherwise-valid scoring values.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::AssessConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `AssessConfig`.
///
/// Any new field added to the config structs must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [scoring]
        "scoring",
        "scoring.pass_threshold",
        "scoring.review_threshold",
        // [scoring.weights]
        "scoring.weights",
        "scoring.weights.content",
        "scoring.weights.behavioral",
        "scoring.weights.identity",
        "scoring.weights.quality",
        "scoring.weights.transcription",
        // [stages]
        "stages",
        "stages.timeout_seconds",
        "stages.narrative_timeout_seconds",
        // [workspace]
        "workspace",
        "workspace.root",
        // [services]
        "services",
        "services.base_url",
        "services.identity_path",
        "services.quality_path",
        "services.transcription_path",
        "services.content_path",
        "services.behavioral_path",
        "services.narrative_path",
        "services.api_key",
        // [media]
        "media",
        "media.gcs_base_url",
        "media.auth_token",
        "media.timeout_seconds",
        // [webhook]
        "webhook",
        "webhook.base_url",
        "webhook.timeout_seconds",
        // [server]
        "server",
        "server.addr",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by(|(ka, da), (kb, db)| da.cmp(db).then_with(|| ka.cmp(kb)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys. Existing configs always continue
/// to load.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut found = walk_toml_keys(&value, "");
    found.sort();

    found
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Scoring Sanity Checks
// ============================================================================

/// Flag values that pass `validate()` but are probably a mistake.
pub fn validate_scoring_sanity(config: &AssessConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let s = &config.scoring;

    if (s.pass_threshold - s.review_threshold).abs() < f64::EPSILON {
        warnings.push(ValidationWarning {
            field: "scoring.review_threshold".to_string(),
            message: format!(
                "review_threshold equals pass_threshold ({:.1}); no score can produce REVIEW",
                s.pass_threshold
            ),
            suggestion: None,
        });
    }

    if s.weights.scoring_stages().count() == 1 {
        warnings.push(ValidationWarning {
            field: "scoring.weights".to_string(),
            message: "All weight is on a single stage; its failure always forces FAIL".to_string(),
            suggestion: None,
        });
    }

    if config.stages.timeout_seconds > 600.0 {
        warnings.push(ValidationWarning {
            field: "stages.timeout_seconds".to_string(),
            message: format!(
                "stages.timeout_seconds = {} exceeds 10 minutes; a hung service will stall the request",
                config.stages.timeout_seconds
            ),
            suggestion: None,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================
