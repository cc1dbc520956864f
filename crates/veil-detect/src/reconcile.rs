//! External-result reconciliation
//!
//! The shield service returns a fully substituted text plus (in synthetic
//! and hash modes) a map from original value to replacement token. This
//! module reconstructs labeled spans in the substituted text's coordinate
//! space so the renderer can treat authoritative and local detections
//! identically.

use crate::normalize::{infer_label, normalize_label};
use std::collections::HashSet;
use tracing::debug;
use veil_core::{Span, SubstitutionMap};

/// Reconstruct labeled spans over `substituted`.
///
/// With a non-empty `substitution_map`, each (value, token) pair is scanned
/// left-to-right; occurrences whose exact range was already claimed by an
/// earlier pair are skipped, which guards against one token being a
/// substring of another. Without a map, bracketed `<LABEL>` tags embedded
/// in the substituted text are used instead; the true original value is not
/// recoverable in that mode, so the tag text stands in for it.
///
/// `occurrence_labels` carries the service's per-occurrence entity labels
/// and is consulted only when a token's own shape gives no label.
///
/// Never fails: malformed input yields an empty result. Output is sorted by
/// start offset with exact `(start, end)` duplicates removed; overlapping
/// but distinct ranges are kept as-is for the renderer to police.
pub fn reconcile(
    original: &str,
    substituted: &str,
    occurrence_labels: &[String],
    substitution_map: Option<&SubstitutionMap>,
) -> Vec<Span> {
    let mut spans = match substitution_map.filter(|map| !map.is_empty()) {
        Some(map) => reconcile_mapped(substituted, occurrence_labels, map),
        None => reconcile_tagged(substituted),
    };

    spans.sort_by_key(|s| (s.start, s.end));
    spans.dedup_by(|a, b| a.start == b.start && a.end == b.end);

    debug!(
        original_len = original.len(),
        substituted_len = substituted.len(),
        span_count = spans.len(),
        "reconciled external result"
    );
    spans
}

/// Map-driven mode: locate every token occurrence, one pair at a time
fn reconcile_mapped(
    substituted: &str,
    occurrence_labels: &[String],
    map: &SubstitutionMap,
) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut claimed: HashSet<(usize, usize)> = HashSet::new();
    let mut occurrence_idx = 0usize;

    for (value, token) in map {
        if token.is_empty() {
            continue;
        }

        let mut cursor = 0usize;
        while cursor <= substituted.len() {
            let Some(found) = substituted[cursor..].find(token.as_str()) else {
                break;
            };
            let start = cursor + found;
            let end = start + token.len();

            if claimed.contains(&(start, end)) {
                // This exact occurrence belongs to an earlier pair whose
                // token is a substring of ours; step one char and retry.
                cursor = next_char_boundary(substituted, start);
                continue;
            }

            let hint = occurrence_labels.get(occurrence_idx).map(String::as_str);
            spans.push(Span {
                entity_type: classify_token(token, value, hint),
                original_value: value.clone(),
                replacement_value: token.clone(),
                start,
                end,
            });
            claimed.insert((start, end));
            occurrence_idx += 1;
            cursor = end;
        }
    }

    spans
}

/// Tag-driven mode: the substituted text itself carries `<LABEL>` tags
fn reconcile_tagged(substituted: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0usize;

    while let Some(found) = substituted[cursor..].find('<') {
        let start = cursor + found;
        let Some(close) = substituted[start + 1..].find('>') else {
            break;
        };
        let end = start + 1 + close + 1;
        let inner = &substituted[start + 1..end - 1];

        if is_label(inner) {
            let tag = &substituted[start..end];
            spans.push(Span {
                entity_type: normalize_label(inner),
                original_value: tag.to_string(),
                replacement_value: tag.to_string(),
                start,
                end,
            });
            cursor = end;
        } else {
            cursor = next_char_boundary(substituted, start);
        }
    }

    spans
}

/// Classify the label for one token occurrence: bracketed tag shape first,
/// then "LABEL N" numbered shape, then the service's per-occurrence hint,
/// and finally shape inference on the original value.
fn classify_token(token: &str, value: &str, hint: Option<&str>) -> String {
    if let Some(inner) = bracketed_inner(token) {
        return normalize_label(inner);
    }
    if let Some(word) = numbered_label(token) {
        return normalize_label(word);
    }
    if let Some(hint) = hint {
        return normalize_label(hint);
    }
    infer_label(value).to_string()
}

/// `<LABEL>` → `LABEL`
fn bracketed_inner(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    is_label(inner).then_some(inner)
}

/// `PERSON 2` → `PERSON` (leading word of an uppercase numbered placeholder)
fn numbered_label(token: &str) -> Option<&str> {
    let mut parts = token.split_whitespace();
    let first = parts.next().filter(|word| is_label(word))?;
    let mut rest: Vec<&str> = parts.collect();
    let ordinal = rest.pop()?;
    if !ordinal.bytes().all(|b| b.is_ascii_digit()) || !rest.iter().all(|word| is_label(word)) {
        return None;
    }
    Some(first)
}

fn is_label(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    index
        + text[index..]
            .chars()
            .next()
            .map_or(1, |c| c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> SubstitutionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn mapped_single_occurrence() {
        let map = map(&[("John Doe", "<PERSON>")]);
        let spans = reconcile("Contact John Doe now", "Contact <PERSON> now", &[], Some(&map));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].entity_type, "PERSON");
        assert_eq!(spans[0].original_value, "John Doe");
        assert_eq!(spans[0].replacement_value, "<PERSON>");
        assert_eq!(spans[0].start, 8);
        assert_eq!(spans[0].end, 16);
    }

    #[test]
    fn mapped_repeated_token() {
        let map = map(&[("Jane", "<PERSON>")]);
        let spans = reconcile(
            "Jane met Jane",
            "<PERSON> met <PERSON>",
            &[],
            Some(&map),
        );

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[1].start, 13);
        assert!(spans.iter().all(|s| s.original_value == "Jane"));
    }

    #[test]
    fn substring_token_skips_claimed_range() {
        // "ID 7" was consumed first; "ID 7" is a prefix of "ID 71", so the
        // second pair must skip the claimed range and land on its own.
        let map = map(&[("alpha", "ID 7"), ("beta", "ID 7x")]);
        let spans = reconcile("alpha beta", "ID 7 and ID 7x", &[], Some(&map));

        // "ID 7" matches at 0 and at 9 (inside "ID 7x"); "ID 7x" at 9
        let starts: Vec<(usize, usize)> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert!(starts.contains(&(0, 4)));
        assert!(starts.contains(&(9, 14)));
    }

    #[test]
    fn numbered_placeholder_classifies_by_leading_word() {
        let map = map(&[("Jane Smith", "PERSON 1")]);
        let spans = reconcile("Jane Smith called", "PERSON 1 called", &[], Some(&map));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].entity_type, "PERSON");
    }

    #[test]
    fn occurrence_label_hint_used_without_token_shape() {
        let map = map(&[("555-123-4567", "TOK-A")]);
        let labels = vec!["PHONE_NUMBER".to_string()];
        let spans = reconcile("call 555-123-4567", "call TOK-A", &labels, Some(&map));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].entity_type, "PHONE");
    }

    #[test]
    fn shapeless_token_falls_back_to_value_inference() {
        let map = map(&[("jane@x.com", "k3j2h1")]);
        let spans = reconcile("mail jane@x.com", "mail k3j2h1", &[], Some(&map));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].entity_type, "EMAIL");
    }

    #[test]
    fn tagged_mode_in_document_order() {
        let spans = reconcile("a@b.c sent 555", "<EMAIL> sent <PHONE_NUMBER>", &[], None);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].entity_type, "EMAIL");
        assert_eq!(spans[0].original_value, "<EMAIL>");
        assert_eq!(spans[0].replacement_value, "<EMAIL>");
        assert_eq!(spans[1].entity_type, "PHONE");
        assert!(spans[0].start < spans[1].start);
    }

    #[test]
    fn tagged_mode_ignores_non_label_angles() {
        let spans = reconcile("", "if a < b then <SSN> else x > y", &[], None);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].entity_type, "SSN");
    }

    #[test]
    fn empty_map_falls_back_to_tagged_mode() {
        let empty = SubstitutionMap::new();
        let spans = reconcile("x", "<EMAIL> here", &[], Some(&empty));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].entity_type, "EMAIL");
    }

    #[test]
    fn no_matches_yield_empty_result() {
        let map = map(&[("ghost", "<PERSON>")]);
        assert!(reconcile("ghost", "nothing was replaced", &[], Some(&map)).is_empty());
        assert!(reconcile("", "", &[], None).is_empty());
    }

    #[test]
    fn duplicate_tokens_claim_per_pair_in_map_order() {
        // Two values sharing one token text: the first pair's scan claims
        // every occurrence, the second pair finds them all claimed. No
        // exact (start, end) duplicate survives either way.
        let map = map(&[("Jane", "<PERSON>"), ("John", "<PERSON>")]);
        let spans = reconcile(
            "Jane and John",
            "<PERSON> and <PERSON>",
            &[],
            Some(&map),
        );

        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.original_value == "Jane"));
        assert_ne!(
            (spans[0].start, spans[0].end),
            (spans[1].start, spans[1].end)
        );
    }

    #[test]
    fn reconcile_is_idempotent() {
        let map = map(&[("Jane", "<PERSON>"), ("jane@x.com", "<EMAIL>")]);
        let original = "Jane mailed from jane@x.com";
        let substituted = "<PERSON> mailed from <EMAIL>";
        let labels = vec!["PERSON".to_string(), "EMAIL_ADDRESS".to_string()];

        let first = reconcile(original, substituted, &labels, Some(&map));
        let second = reconcile(original, substituted, &labels, Some(&map));
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
