//! Span renderer / segmenter
//!
//! Turns text plus an ordered span list into the alternating plain/redacted
//! sequence the display layer renders. Reconciliation can legitimately hand
//! us overlapping ranges (exact duplicates are removed upstream, overlaps
//! are not), so the policy here is explicit: keep the earliest start, drop
//! any span that begins before the previous kept span ends.

use tracing::warn;
use veil_core::{Segment, SegmentKind, Span};

/// Segment `text` for display. `spans` must be sorted by start offset;
/// overlapping, inverted, or out-of-range spans are dropped with a warning
/// rather than corrupting the output.
pub fn segment(text: &str, spans: &[Span]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_end = 0usize;

    for span in spans {
        if span.start < last_end
            || span.start >= span.end
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            warn!(
                entity_type = %span.entity_type,
                start = span.start,
                end = span.end,
                "dropping overlapping or malformed span"
            );
            continue;
        }

        if span.start > last_end {
            segments.push(Segment {
                kind: SegmentKind::Plain,
                text: text[last_end..span.start].to_string(),
                span: None,
            });
        }

        segments.push(Segment {
            kind: SegmentKind::Redacted,
            text: span.replacement_value.clone(),
            span: Some(span.clone()),
        });
        last_end = span.end;
    }

    if last_end < text.len() {
        segments.push(Segment {
            kind: SegmentKind::Plain,
            text: text[last_end..].to_string(),
            span: None,
        });
    }

    segments
}
