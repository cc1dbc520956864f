//! Remote shield boundary
//!
//! The orchestrator only sees the three remote operations and their
//! outcomes (success, failure, rate-limited); transport mechanics, retry,
//! and backoff live behind this trait in the egress crate.

use async_trait::async_trait;
use veil_egress::{AuditResponse, ChatResponse, Result, SanitizeRequest, SanitizeResponse};

/// The authoritative detection, audit, and forwarding operations
#[async_trait]
pub trait RemoteShield: Send + Sync {
    /// Detect and substitute sensitive values in raw text
    async fn sanitize(&self, request: &SanitizeRequest) -> Result<SanitizeResponse>;

    /// Score already-redacted text for safety and usability
    async fn audit(&self, redacted_text: &str) -> Result<AuditResponse>;

    /// Forward sanitized text to the downstream consumer
    async fn chat(&self, request: &SanitizeRequest) -> Result<ChatResponse>;
}

#[async_trait]
impl RemoteShield for veil_egress::ShieldConnector {
    async fn sanitize(&self, request: &SanitizeRequest) -> Result<SanitizeResponse> {
        veil_egress::ShieldConnector::sanitize(self, request).await
    }

    async fn audit(&self, redacted_text: &str) -> Result<AuditResponse> {
        veil_egress::ShieldConnector::audit(self, redacted_text).await
    }

    async fn chat(&self, request: &SanitizeRequest) -> Result<ChatResponse> {
        veil_egress::ShieldConnector::chat(self, request).await
    }
}
