//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation logic so every operation enforces the same invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Normalize a promotional or referral code: NFKC, trimmed, uppercased.
pub(crate) fn normalize_code(value: &str) -> ResultEngine<String> {
    let normalized: String = value.nfkc().collect::<String>().trim().to_uppercase();
    if normalized.is_empty() {
        return Err(EngineError::InvalidInput("code must not be empty".to_string()));
    }
    if normalized.chars().any(char::is_whitespace) {
        return Err(EngineError::InvalidInput(
            "code must not contain spaces".to_string(),
        ));
    }
    Ok(normalized)
}

/// Generate an 8 characters uppercase alphanumeric code.
pub(crate) fn generate_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn normalize_username(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let valid_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !(3..=32).contains(&trimmed.len()) || !valid_chars {
        return Err(EngineError::InvalidInput(
            "username must be 3 to 32 characters among letters, digits, '_', '.', '-'"
                .to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let invalid = || EngineError::InvalidInput(format!("invalid email: {email}"));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    match domain.split_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() && !tld.ends_with('.') => {
            Ok(email)
        }
        _ => Err(invalid()),
    }
}

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn validate_password(value: &str) -> ResultEngine<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_nfkc_uppercased() {
        assert_eq!(normalize_code("  summer25 ").unwrap(), "SUMMER25");
        // Fullwidth letters fold to ASCII under NFKC.
        assert_eq!(normalize_code("ＳＵＭＭＥＲ").unwrap(), "SUMMER");
        assert!(normalize_code("   ").is_err());
        assert!(normalize_code("two words").is_err());
    }

    #[test]
    fn generated_codes_are_normalized() {
        let code = generate_code();
        assert_eq!(code.len(), 8);
        assert_eq!(normalize_code(&code).unwrap(), code);
    }

    #[test]
    fn email_validation() {
        assert_eq!(normalize_email(" Alice@Example.COM ").unwrap(), "alice@example.com");
        assert!(normalize_email("alice").is_err());
        assert!(normalize_email("alice@localhost").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("a@b@example.com").is_err());
    }

    #[test]
    fn username_validation() {
        assert_eq!(normalize_username(" mario.rossi ").unwrap(), "mario.rossi");
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("mario rossi").is_err());
    }
}
