//! Retry-After header parsing
//!
//! The shield service signals rate limits with a `retry-after` header that
//! is either a number of seconds or an RFC 7231 HTTP-date.

use tracing::debug;

/// Parse a `retry-after` header value into seconds from now.
///
/// Numeric form is tried first (the common case), then RFC 2822 date form.
/// Returns `None` when the value cannot be parsed.
pub fn parse_retry_after(header_value: &str) -> Option<u64> {
    if let Ok(seconds) = header_value.trim().parse::<u64>() {
        return Some(seconds);
    }

    if let Ok(target_time) = chrono::DateTime::parse_from_rfc2822(header_value) {
        let duration = target_time.signed_duration_since(chrono::Utc::now());
        // Past dates mean the limit already lifted
        return Some(duration.num_seconds().max(0) as u64);
    }

    debug!(header_value, "Failed to parse retry-after header");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_format() {
        assert_eq!(parse_retry_after("60"), Some(60));
        assert_eq!(parse_retry_after("0"), Some(0));
        assert_eq!(parse_retry_after("  120  "), Some(120));
    }

    #[test]
    fn rejects_invalid_input() {
        assert_eq!(parse_retry_after(""), None);
        assert_eq!(parse_retry_after("invalid"), None);
        assert_eq!(parse_retry_after("-60"), None);
    }

    #[test]
    fn parses_http_date_format() {
        let future = chrono::Utc::now() + chrono::Duration::seconds(120);
        let seconds = parse_retry_after(&future.to_rfc2822()).unwrap();
        assert!((118..=122).contains(&seconds), "got {}", seconds);
    }

    #[test]
    fn past_dates_mean_retry_now() {
        let past = chrono::Utc::now() - chrono::Duration::seconds(60);
        assert_eq!(parse_retry_after(&past.to_rfc2822()), Some(0));
    }
}
