//! Error types

use std::time::Duration;

/// Why a single fetch attempt failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Timeouts are never retried automatically; a slow server is not a flaky link.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Timeout(_))
    }
}

/// Errors raised while assembling the loader configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid argument: {0}")]
    Args(#[from] pico_args::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid base URL {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}
