//! Error types for Veil Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Pattern compilation failed: {0}")]
    PatternCompile(#[from] regex::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
