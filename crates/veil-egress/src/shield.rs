//! Shield service connector
//!
//! Speaks the shield service's three endpoints: `/sanitize` (authoritative
//! detection and substitution), `/audit` (quality scoring of redacted
//! text), and `/chat` (forwarding sanitized text downstream). A 429 maps to
//! `EgressError::RateLimitExceeded` so callers can present it differently
//! from a generic outage.

use crate::{
    client::{create_client, with_retry, HttpClientConfig},
    parse_retry_after, EgressError, Result,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use veil_core::{EntityFilter, MaskingMode, SubstitutionMap};

/// The service rejects larger submissions outright; fail fast client-side.
pub const MAX_TEXT_LEN: usize = 10_000;

/// Shield connector configuration
#[derive(Debug, Clone)]
pub struct ShieldConfig {
    /// Base URL of the shield service
    pub base_url: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl ShieldConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_config: HttpClientConfig::default(),
        }
    }

    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }
}

/// Request body for `/sanitize` and `/chat`
#[derive(Debug, Clone, Serialize)]
pub struct SanitizeRequest {
    pub text: String,
    pub mode: MaskingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
}

impl SanitizeRequest {
    pub fn new(text: impl Into<String>, mode: MaskingMode, filter: &EntityFilter) -> Self {
        Self {
            text: text.into(),
            mode,
            entities: filter.enabled_types(),
        }
    }
}

/// `/sanitize` response: substituted text plus the detected originals
#[derive(Debug, Clone, Deserialize)]
pub struct SanitizeResponse {
    pub clean_text: String,

    /// Per-occurrence entity labels, in detection order
    #[serde(default)]
    pub items: Vec<String>,

    #[serde(default)]
    pub processing_time_ms: f64,

    /// Original value → replacement token; present in synthetic/hash modes
    #[serde(default)]
    pub synthetic_map: Option<SubstitutionMap>,
}

#[derive(Debug, Clone, Serialize)]
struct AuditRequest<'a> {
    redacted_text: &'a str,
}

/// `/audit` response after key normalization
#[derive(Debug, Clone, PartialEq)]
pub struct AuditResponse {
    pub safety_score: u8,
    pub usability_score: u8,
    pub critique: String,
}

impl AuditResponse {
    /// The scoring pipeline is an LLM crew; key spellings drift. Accept the
    /// known variants and fall back to neutral defaults.
    fn from_value(raw: &serde_json::Value) -> Self {
        Self {
            safety_score: read_score(raw, &["safety_score", "safetyscore", "safety score"], 50),
            usability_score: read_score(
                raw,
                &["usability_score", "usabilityscore", "usability score"],
                80,
            ),
            critique: raw
                .get("critique")
                .or_else(|| raw.get("critique_summary"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("Audit complete.")
                .to_string(),
        }
    }
}

fn read_score(raw: &serde_json::Value, keys: &[&str], default: u8) -> u8 {
    for key in keys {
        if let Some(score) = raw.get(key).and_then(serde_json::Value::as_f64) {
            return score.clamp(0.0, 100.0) as u8;
        }
    }
    default
}

/// `/chat` response: the downstream consumer's reply
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub reply: String,

    #[serde(default)]
    pub sanitized_prompt: Option<String>,

    #[serde(default)]
    pub synthetic_map: Option<SubstitutionMap>,
}

/// HTTP connector to the shield service
pub struct ShieldConnector {
    config: ShieldConfig,
    client: Client,
    session_id: String,
}

impl ShieldConnector {
    pub fn new(config: ShieldConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self {
            config,
            client,
            session_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Submit raw text for authoritative detection and substitution
    #[instrument(skip(self, request), fields(text_len = request.text.len()))]
    pub async fn sanitize(&self, request: &SanitizeRequest) -> Result<SanitizeResponse> {
        validate_text(&request.text)?;

        let body = self.post_json("sanitize", request).await?;
        serde_json::from_value(body)
            .map_err(|e| EgressError::Parse(format!("Bad sanitize response: {}", e)))
    }

    /// Score already-redacted text for safety and usability
    #[instrument(skip(self, redacted_text), fields(text_len = redacted_text.len()))]
    pub async fn audit(&self, redacted_text: &str) -> Result<AuditResponse> {
        validate_text(redacted_text)?;

        let body = self
            .post_json("audit", &AuditRequest { redacted_text })
            .await?;
        Ok(AuditResponse::from_value(&body))
    }

    /// Forward sanitized text to the downstream consumer
    #[instrument(skip(self, request), fields(text_len = request.text.len()))]
    pub async fn chat(&self, request: &SanitizeRequest) -> Result<ChatResponse> {
        validate_text(&request.text)?;

        let body = self.post_json("chat", request).await?;
        serde_json::from_value(body)
            .map_err(|e| EgressError::Parse(format!("Bad chat response: {}", e)))
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<serde_json::Value> {
        let max_retries = self.config.client_config.max_retries;
        with_retry(max_retries, || async {
            let response = self
                .client
                .post(format!("{}/{}", self.config.base_url, path))
                .header("X-Session-ID", self.session_id.as_str())
                .json(body)
                .send()
                .await?;

            handle_response(response).await
        })
        .await
    }
}

async fn handle_response(response: reqwest::Response) -> Result<serde_json::Value> {
    let status = response.status();

    if !status.is_success() {
        let status_code = status.as_u16();
        if status_code == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(EgressError::RateLimitExceeded { retry_after_secs });
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        return Err(EgressError::Service {
            status_code,
            message,
        });
    }

    debug!(status = %status, "shield response received");
    response
        .json()
        .await
        .map_err(|e| EgressError::Parse(format!("Response body is not JSON: {}", e)))
}

fn validate_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(EgressError::InvalidRequest("text is empty".to_string()));
    }
    if text.len() > MAX_TEXT_LEN {
        return Err(EgressError::InvalidRequest(format!(
            "text too long ({} > {} chars)",
            text.len(),
            MAX_TEXT_LEN
        )));
    }
    Ok(())
}
