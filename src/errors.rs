//! Centralised error type for the metrics pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("HTTP error fetching {0}: {1}")]
    Fetch(String, #[source] reqwest::Error),

    #[error("Invalid JSON from {0}: {1}")]
    Decode(String, #[source] serde_json::Error),

    #[error("Parse error for {0}: {1}")]
    Parse(String, #[source] feed_rs::parser::ParseFeedError),

    #[error("Parquet error reading {0}: {1}")]
    Parquet(String, #[source] parquet::errors::ParquetError),

    #[error("Invalid URL {0}: {1}")]
    Url(String, #[source] url::ParseError),

    #[error("No population row found for state {0}")]
    MissingPopulation(String),

    #[error("Malformed record for {dataset}: {reason}")]
    MalformedRecord { dataset: String, reason: String },

    #[error("I/O error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("YAML encoding error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
