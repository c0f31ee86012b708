//! Completion service errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        error_type: Option<String>,
    },

    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("API key contains invalid characters")]
    InvalidApiKey,

    #[error("API key is not configured")]
    MissingApiKey,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service reachable but unable to produce text.
    #[error("completion unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// HTTP status to report when proxying this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::ApiError { status, .. } => *status,
            Self::RateLimitExceeded(_) => 429,
            _ => 500,
        }
    }

    /// Short error kind, mirrored into proxy error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::ApiError { .. } => "api_error",
            Self::RateLimitExceeded(_) => "rate_limit",
            Self::InvalidApiKey => "invalid_api_key",
            Self::MissingApiKey => "missing_api_key",
            Self::Json(_) => "json",
            Self::Unavailable(_) => "unavailable",
        }
    }
}
