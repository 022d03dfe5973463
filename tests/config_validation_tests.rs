//! Config Validation Tests
//!
//! Typo detection on raw TOML, structural validation of thresholds and
//! weights, and sanity warnings. These exercise the config layer
//! independently from the pipeline.

use std::io::Write;

use interview_assessor::config::validation::{
    known_config_keys, suggest_correction, validate_scoring_sanity, validate_unknown_keys,
};
use interview_assessor::config::{AssessConfig, ConfigError};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_weights_warns_with_suggestion() {
    let toml_str = r#"
[scoring.weights]
behavioural = 0.3
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("behavioural"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("scoring.weights.behavioral"),
        "Should suggest the correct spelling"
    );
}

#[test]
fn typo_in_stage_timeout_warns() {
    let toml_str = r#"
[stages]
timeout_secods = 90
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("stages.timeout_seconds"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[scoring]
pass_threshold = 70.0
review_threshold = 60.0

[scoring.weights]
content = 0.6
behavioral = 0.4
identity = 0.0
quality = 0.0
transcription = 0.0

[stages]
timeout_seconds = 90
narrative_timeout_seconds = 20

[workspace]
root = "/var/tmp/assessments"

[services]
base_url = "http://analysis.internal:8090"
narrative_path = "/v1/narrative"

[media]
gcs_base_url = "https://storage.googleapis.com"
timeout_seconds = 300

[webhook]
base_url = "http://backend.internal"
timeout_seconds = 5

[server]
addr = "0.0.0.0:9090"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Expected zero warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn unrelated_key_has_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("completely_unrelated_setting", &known).is_none());
}

#[test]
fn unknown_keys_do_not_block_loading() {
    let config = AssessConfig::from_toml_str(
        r#"
[scoring]
pass_treshold = 80.0
"#,
    )
    .expect("unknown keys only warn");
    assert_eq!(config.scoring.pass_threshold, 65.0);
}

// ============================================================================
// Structural Validation
// ============================================================================

#[test]
fn weights_not_summing_to_one_rejected() {
    let err = AssessConfig::from_toml_str(
        r#"
[scoring.weights]
content = 0.5
behavioral = 0.6
"#,
    )
    .unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.contains("sum to 1.0")), "errors: {errors:?}");
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn every_problem_is_reported_at_once() {
    let config = AssessConfig::default()
        .with_thresholds(50.0, 120.0)
        .with_weights(1.5, 0.3);
    let Err(ConfigError::Validation(errors)) = config.validate() else {
        panic!("expected validation errors");
    };
    assert!(errors.iter().any(|e| e.contains("scoring.review_threshold")));
    assert!(errors.iter().any(|e| e.contains("scoring.weights.content")));
    assert!(errors.iter().any(|e| e.contains("sum to 1.0")));
}

#[test]
fn negative_timeout_rejected() {
    let err = AssessConfig::from_toml_str(
        r#"
[stages]
timeout_seconds = -5.0
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("stages.timeout_seconds"), "{err}");
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = AssessConfig::from_toml_str("[scoring\npass_threshold = 70").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)), "{err}");
}

#[test]
fn file_roundtrip_preserves_overrides() {
    let config = AssessConfig::default()
        .with_thresholds(72.0, 58.0)
        .with_weights(0.8, 0.2);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

    let loaded = AssessConfig::load_from_file(file.path()).unwrap();
    assert_eq!(loaded.scoring.pass_threshold, 72.0);
    assert_eq!(loaded.scoring.review_threshold, 58.0);
    assert_eq!(loaded.scoring.weights.content, 0.8);
    assert_eq!(loaded.scoring.weights.behavioral, 0.2);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AssessConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}

// ============================================================================
// Sanity Warnings
// ============================================================================

#[test]
fn defaults_have_no_sanity_warnings() {
    assert!(validate_scoring_sanity(&AssessConfig::default()).is_empty());
}

#[test]
fn single_scoring_stage_warns() {
    let config = AssessConfig::default().with_weights(1.0, 0.0);
    assert!(config.validate().is_ok());
    let warnings = validate_scoring_sanity(&config);
    assert!(warnings.iter().any(|w| w.field == "scoring.weights"));
}

#[test]
fn very_long_timeout_warns() {
    let config = AssessConfig::default().with_stage_timeout(std::time::Duration::from_secs(900));
    let warnings = validate_scoring_sanity(&config);
    assert!(warnings.iter().any(|w| w.field == "stages.timeout_seconds"));
}

// ============================================================================
// Search Order
// ============================================================================

#[test]
fn invalid_local_file_is_rejected_not_replaced_by_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("assessor.toml");
    std::fs::write(&local, "[scoring.weights]\ncontent = 0.5\nbehavioral = 0.6\n").unwrap();

    let err = AssessConfig::load_with(None, &local).unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.contains("sum to 1.0")), "errors: {errors:?}");
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn invalid_explicit_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let explicit = dir.path().join("custom.toml");
    std::fs::write(&explicit, "[scoring\npass_threshold = 70").unwrap();

    let err = AssessConfig::load_with(Some(&explicit), &dir.path().join("absent.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)), "{err}");
}

#[test]
fn explicit_path_to_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AssessConfig::load_with(
        Some(&dir.path().join("missing.toml")),
        &dir.path().join("absent.toml"),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)), "{err}");
}

#[test]
fn explicit_path_wins_over_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let explicit = dir.path().join("custom.toml");
    let local = dir.path().join("assessor.toml");
    std::fs::write(&explicit, "[scoring]\npass_threshold = 75.0\n").unwrap();
    std::fs::write(&local, "[scoring]\npass_threshold = 68.0\n").unwrap();

    let config = AssessConfig::load_with(Some(&explicit), &local).unwrap();
    assert_eq!(config.scoring.pass_threshold, 75.0);
}

#[test]
fn no_file_anywhere_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AssessConfig::load_with(None, &dir.path().join("assessor.toml")).unwrap();
    assert_eq!(config, AssessConfig::default());
}
