//! Typed errors for the report pipeline.
//!
//! Only [`ValidationError`] can fail a whole request. Collector and model
//! errors are absorbed by the pipeline and surface in the report as issues.

use thiserror::Error;

/// The request itself is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("business type must not be empty")]
    EmptyBusinessType,

    #[error("location must not be empty")]
    EmptyLocation,
}

/// Failure of a single collector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    /// Network, auth, timeout, or vendor-side failure.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source answered but had nothing for this query.
    #[error("no results: {0}")]
    EmptyResult(String),
}

impl From<reqwest::Error> for CollectError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CollectError::SourceUnavailable("request timed out".to_string())
        } else if e.is_connect() {
            CollectError::SourceUnavailable("connection failed".to_string())
        } else if let Some(status) = e.status() {
            CollectError::SourceUnavailable(format!("HTTP {}", status))
        } else {
            CollectError::SourceUnavailable(e.to_string())
        }
    }
}

/// Failure of the language-model call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model returned malformed output: {0}")]
    Malformed(String),
}
