//! Egress error taxonomy
//!
//! Rate limiting is its own variant rather than a generic service error:
//! callers present the two differently.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EgressError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit exceeded{}", retry_after_secs.map(|s| format!(": retry after {}s", s)).unwrap_or_default())]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    #[error("Shield service error ({status_code}): {message}")]
    Service { status_code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, EgressError>;
