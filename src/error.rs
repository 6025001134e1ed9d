//! Errors raised while loading configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid deprecated route at index {index}: {reason}")]
    InvalidRoute { index: usize, reason: String },

    #[error("failed to create metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}
