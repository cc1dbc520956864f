//! Shared types for the Veil redaction pipeline

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mapping from an original sensitive value to its replacement token, as
/// produced by the authoritative detector. Insertion order is preserved so
/// reconciliation processes pairs in the order the service emitted them.
pub type SubstitutionMap = IndexMap<String, String>;

/// A labeled, offset-bounded region of text identified as sensitive.
///
/// Offsets are byte positions into the text the span describes, with
/// `start < end` (end exclusive). Spans are value objects: constructed once
/// per submission, never mutated, freely cloned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Canonical entity category (e.g. "EMAIL", "SSN", "PERSON")
    pub entity_type: String,

    /// The sensitive value this span replaces
    pub original_value: String,

    /// The display replacement (static label or substitution token)
    pub replacement_value: String,

    /// Start position in the text
    pub start: usize,

    /// End position in the text (exclusive)
    pub end: usize,
}

/// Kind of display segment produced by the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Untouched text between redactions
    Plain,

    /// A redaction highlight carrying its span
    Redacted,
}

/// One piece of the alternating plain/redacted display sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Whether this segment is plain text or a redaction highlight
    pub kind: SegmentKind,

    /// Display text: the raw slice for plain segments, the replacement
    /// value for redacted ones
    pub text: String,

    /// The span behind a redacted segment; `None` for plain segments
    pub span: Option<Span>,
}

/// Policy selecting how matched values are replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaskingMode {
    /// Replace with the static type label (e.g. "[EMAIL]")
    #[default]
    Static,

    /// Replace with a synthetic plausible value (generated by the
    /// authoritative service; local fallback degrades to static labels)
    Synthetic,

    /// Replace with a deterministic HMAC-derived token
    HashToken,
}

/// Set of enabled entity-type identifiers, matched against catalog type ids
/// and normalized labels. `EntityFilter::all()` enables everything.
///
/// Passed explicitly into detection calls; there is no ambient/global
/// configuration state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFilter {
    enabled: Option<HashSet<String>>,
}

impl EntityFilter {
    /// Filter that enables every entity type
    pub fn all() -> Self {
        Self { enabled: None }
    }

    /// Filter that enables only the given entity types
    pub fn only<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: Some(types.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether the given entity type passes the filter
    pub fn is_enabled(&self, type_id: &str) -> bool {
        match &self.enabled {
            None => true,
            Some(set) => set.contains(type_id),
        }
    }

    /// The explicit enabled set, if one was configured
    pub fn enabled_types(&self) -> Option<Vec<String>> {
        self.enabled
            .as_ref()
            .map(|set| set.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_all_enables_everything() {
        let filter = EntityFilter::all();
        assert!(filter.is_enabled("EMAIL"));
        assert!(filter.is_enabled("anything"));
        assert!(filter.enabled_types().is_none());
    }

    #[test]
    fn filter_only_restricts() {
        let filter = EntityFilter::only(["EMAIL", "SSN"]);
        assert!(filter.is_enabled("EMAIL"));
        assert!(filter.is_enabled("SSN"));
        assert!(!filter.is_enabled("PHONE"));
    }

    #[test]
    fn masking_mode_wire_values() {
        assert_eq!(
            serde_json::to_string(&MaskingMode::Static).unwrap(),
            "\"static\""
        );
        assert_eq!(
            serde_json::to_string(&MaskingMode::HashToken).unwrap(),
            "\"hash_token\""
        );
        let mode: MaskingMode = serde_json::from_str("\"synthetic\"").unwrap();
        assert_eq!(mode, MaskingMode::Synthetic);
    }

    #[test]
    fn substitution_map_preserves_insertion_order() {
        let mut map = SubstitutionMap::new();
        map.insert("zeta".to_string(), "<PERSON>".to_string());
        map.insert("alpha".to_string(), "<EMAIL>".to_string());

        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }
}
