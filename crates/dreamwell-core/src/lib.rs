use thiserror::Error;

mod app_config;
mod config;
pub mod weights;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use weights::ScoringWeights;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Splits a comma-separated keyword field into trimmed, non-empty terms.
///
/// Company and product keywords are stored as free-text comma lists; every
/// consumer (search, deep-search prompts) goes through this one parse.
#[must_use]
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
