//! Veil Egress Connector
//!
//! This crate provides the HTTP boundary to the authoritative shield
//! service:
//! - `sanitize`: remote detection/substitution of sensitive values
//! - `audit`: quality scoring of already-redacted text
//! - `chat`: forwarding sanitized text to the downstream consumer

pub mod client;
pub mod error;
pub mod retry_after;
pub mod shield;

pub use client::{create_client, with_retry, HttpClientConfig};
pub use error::{EgressError, Result};
pub use retry_after::parse_retry_after;
pub use shield::{
    AuditResponse, ChatResponse, SanitizeRequest, SanitizeResponse, ShieldConfig,
    ShieldConnector,
};
