//! One-time-code flows: challenge issuance and code-for-session exchange.
//!
//! Validation that can fail locally (email syntax, code format) happens
//! before any provider call so malformed input never burns rate-limit or
//! attempt budget. The provider is the system of record for challenge
//! state; these components classify its answers and keep the audit trail.

pub mod coordinator;
pub mod exchanger;

pub use coordinator::{ChallengeCoordinator, ChallengeReceipt};
pub use exchanger::TokenExchanger;

use regex::Regex;

/// Normalize an email for issuance and lookups.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// The code contract is exactly six ASCII digits.
#[must_use]
pub fn valid_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_code_requires_six_ascii_digits() {
        assert!(valid_code("000000"));
        assert!(valid_code("123456"));
        assert!(!valid_code("12345"));
        assert!(!valid_code("1234567"));
        assert!(!valid_code("12345a"));
        assert!(!valid_code("12 456"));
        assert!(!valid_code("１２３４５６"));
    }
}
