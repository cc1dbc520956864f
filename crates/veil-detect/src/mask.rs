//! Local masking pass
//!
//! When the shield service is unreachable the fallback path still has to
//! produce a sanitized string to forward downstream. Static mode splices in
//! the catalog's display labels; hash-token mode derives a deterministic
//! HMAC token per value. Synthetic value generation lives in the service,
//! so synthetic mode degrades to static labels locally.

use crate::segment::segment;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use veil_core::{MaskingMode, SegmentKind, Span};

type HmacSha256 = Hmac<Sha256>;

/// Applies spans to text under a masking mode
pub struct Masker {
    hmac_key: Option<Vec<u8>>,
}

impl Masker {
    /// Create a masker. Without a secret, hash-token mode falls back to
    /// static labels.
    pub fn new(hmac_secret: Option<String>) -> Self {
        Self {
            hmac_key: hmac_secret.map(|s| s.into_bytes()),
        }
    }

    /// Produce the sanitized text for `spans` over `text`. Uses the same
    /// overlap-drop policy as the segmenter, so the rendered segments and
    /// the forwarded string always agree.
    pub fn apply(&self, text: &str, spans: &[Span], mode: MaskingMode) -> String {
        let mut sanitized = String::with_capacity(text.len());

        for seg in segment(text, spans) {
            match (seg.kind, seg.span) {
                (SegmentKind::Redacted, Some(span)) => match mode {
                    MaskingMode::Static | MaskingMode::Synthetic => {
                        sanitized.push_str(&span.replacement_value);
                    }
                    MaskingMode::HashToken => sanitized.push_str(&self.token(&span)),
                },
                (_, _) => sanitized.push_str(&seg.text),
            }
        }

        sanitized
    }

    /// Deterministic `[TYPE:hash]` token for a span's original value
    fn token(&self, span: &Span) -> String {
        let Some(key) = &self.hmac_key else {
            return span.replacement_value.clone();
        };

        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(span.original_value.as_bytes());
        let hash = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());
        let short_hash = &hash[..16.min(hash.len())];

        format!("[{}:{}]", span.entity_type, short_hash)
    }
}
