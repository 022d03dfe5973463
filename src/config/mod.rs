//! Assessor Configuration Module
//!
//! Thresholds, weights and timeouts loaded from TOML, with built-in defaults
//! matching the production scoring policy.
//!
//! ## Loading Order
//!
//! 1. `ASSESSOR_CONFIG` environment variable (path to TOML file)
//! 2. `assessor.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded `AssessConfig` is passed explicitly to the pipeline and the
//! HTTP layer; there is no process-wide config.

mod assess_config;
pub mod defaults;
pub mod validation;

pub use assess_config::*;
