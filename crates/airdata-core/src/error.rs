use airdata_bucket::BucketError;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid Awair API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Awair request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Awair API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode Awair response: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to write CSV row: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV output: {0}")]
    Flush(#[source] std::io::Error),
}

#[derive(Debug, Error)]
#[error("failed to upload {key}: {source}")]
pub struct PublishError {
    pub key: String,
    #[source]
    pub source: BucketError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// First failure of an export run. Pipeline errors display as the underlying error.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("no readings returned for {from} - {to}")]
    EmptyWindow {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}
