//! Entity pattern catalog
//!
//! Ordered list of entity-type definitions, each a compiled regex plus a
//! canonical display replacement. Compiled once at startup; a pattern that
//! fails to compile is a fatal construction error, never a runtime
//! condition.

use regex::Regex;
use veil_core::Result;

/// One entity-type definition: a compiled pattern plus its display label
pub struct EntityPattern {
    /// Canonical entity type id (e.g. "CREDIT_CARD")
    pub type_id: &'static str,

    /// Compiled matcher for this entity type
    pub regex: Regex,

    /// Static display replacement (e.g. "[CREDIT_CARD]")
    pub replacement: &'static str,
}

/// The full ordered set of built-in entity patterns
pub struct PatternCatalog {
    patterns: Vec<EntityPattern>,
}

impl PatternCatalog {
    /// Compile the built-in catalog
    pub fn new() -> Result<Self> {
        let definitions: &[(&'static str, &'static str, &'static str)] = &[
            // 16-digit cards, contiguous or grouped by dash/space
            ("CREDIT_CARD", r"\b(?:\d{4}[-\s]?){3}\d{4}\b", "[CREDIT_CARD]"),
            // SSN with dashes: 123-45-6789
            ("SSN", r"\b\d{3}-\d{2}-\d{4}\b", "[SSN]"),
            (
                "EMAIL",
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b",
                "[EMAIL]",
            ),
            // (123) 456-7890, 123-456-7890, 123.456.7890, +1 123 456 7890
            (
                "PHONE",
                r"(?:\+\d{1,2}[-.\s])?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b",
                "[PHONE]",
            ),
            ("AWS_KEY", r"\bAKIA[0-9A-Z]{16}\b", "[AWS_KEY]"),
            (
                "API_KEY",
                r"\b(?:sk-[A-Za-z0-9]{20,}|ghp_[A-Za-z0-9]{36}|xox[baprs]-[A-Za-z0-9-]{10,})\b",
                "[API_KEY]",
            ),
            // IPv4 dotted quad and full-form IPv6
            (
                "IP",
                r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b|\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b",
                "[IP]",
            ),
        ];

        let mut patterns = Vec::with_capacity(definitions.len());
        for (type_id, pattern, replacement) in definitions {
            patterns.push(EntityPattern {
                type_id,
                regex: Regex::new(pattern)?,
                replacement,
            });
        }

        Ok(Self { patterns })
    }

    /// The catalog's entity patterns, in fixed order
    pub fn definitions(&self) -> &[EntityPattern] {
        &self.patterns
    }
}
