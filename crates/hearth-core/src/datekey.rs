//! Strict `YYYY-MM-DD` date-key validation.
//!
//! History lookups take a caller-supplied date string that is used to
//! build a file name. Anything that does not match the exact pattern is
//! rejected before touching the filesystem (path traversal defense).

use once_cell::sync::Lazy;
use regex::Regex;

static DATE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date-key pattern"));

/// Returns `true` if `value` is a strict 4-digit-year/2-digit-month/
/// 2-digit-day key.
pub fn is_valid(value: &str) -> bool {
    DATE_KEY.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_date_keys() {
        assert!(is_valid("2026-08-31"));
        assert!(is_valid("1999-01-01"));
    }

    #[test]
    fn rejects_traversal_and_malformed_keys() {
        assert!(!is_valid("../etc/passwd"));
        assert!(!is_valid("2026-08-31/../secret"));
        assert!(!is_valid("2026-8-31"));
        assert!(!is_valid("20260831"));
        assert!(!is_valid("2026-08-31 "));
        assert!(!is_valid(""));
    }
}
