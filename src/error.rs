//! Error types for the retrieval, search, configuration and summarization layers.
//!
//! None of these are fatal to a batch run. Fetch errors are folded into
//! [`RetrievalOutcome::Failure`](crate::models::RetrievalOutcome) at the
//! strategy boundary, search errors are logged per backend and skipped.

use thiserror::Error;

/// A single retrieval strategy failed for one URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("bot challenge page")]
    Challenge,

    #[error("empty response body")]
    Empty,

    #[error("browser error: {0}")]
    Browser(String),

    #[error("challenge solver error: {0}")]
    Solver(String),

    #[error("{0} not configured")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// A search backend call failed for one query.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{backend} returned status {status}")]
    Status { backend: &'static str, status: u16 },

    #[error("failed to parse {backend} response: {message}")]
    Parse {
        backend: &'static str,
        message: String,
    },

    #[error("could not obtain a search token from {0}")]
    Token(&'static str),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Network(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed completion response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SummarizeError {
    fn from(err: reqwest::Error) -> Self {
        SummarizeError::Network(err.to_string())
    }
}
