//! Short code generation and validation.

use crate::error::AppError;
use base64::Engine as _;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Length of random bytes before base64 encoding.
const CODE_LENGTH_BYTES: usize = 9;

/// Codes that collide with management routes on the same host.
pub const RESERVED_CODES: &[&str] = &["links", "health"];

static SHORT_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("short code pattern is valid"));

/// Generates a random 12-character short code.
///
/// Uses `getrandom` for entropy and URL-safe base64 without padding, so the
/// result always satisfies [`validate_short_code`] (letters, digits, `-`, `_`).
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random source fails.
pub fn generate_code() -> Result<String, AppError> {
    let mut buffer = [0u8; CODE_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate short code",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Returns true if `code` uses only the short code charset.
///
/// Codes failing this check can never be stored, so the redirect path answers
/// them without touching the cache or database.
pub fn is_well_formed_code(code: &str) -> bool {
    SHORT_CODE_REGEX.is_match(code)
}

/// Validates a caller-supplied short code.
///
/// # Rules
///
/// - Non-empty
/// - Only ASCII letters, digits, hyphens and underscores
/// - Not one of [`RESERVED_CODES`]
///
/// # Errors
///
/// Returns [`AppError::InvalidCode`] if any rule is violated.
pub fn validate_short_code(code: &str) -> Result<(), AppError> {
    if code.is_empty() {
        return Err(AppError::invalid_code(
            "Short code must not be empty",
            json!({ "short_code": code }),
        ));
    }

    if !is_well_formed_code(code) {
        return Err(AppError::invalid_code(
            "Short code can only contain letters, digits, hyphens and underscores",
            json!({ "short_code": code }),
        ));
    }

    if RESERVED_CODES.contains(&code) {
        return Err(AppError::invalid_code(
            "This short code is reserved",
            json!({ "short_code": code }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_has_correct_length() {
        let code = generate_code().unwrap();
        assert_eq!(code.len(), 12);
    }

    #[test]
    fn test_generated_code_is_valid() {
        for _ in 0..200 {
            let code = generate_code().unwrap();
            assert!(validate_short_code(&code).is_ok(), "invalid: {code}");
        }
    }

    #[test]
    fn test_generate_code_produces_unique_codes() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code().unwrap()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_validate_accepts_full_charset() {
        for code in ["promo1", "A", "Spring_Sale-2025", "___", "-", "x-y_Z9"] {
            assert!(validate_short_code(code).is_ok(), "rejected: {code}");
        }
    }

    #[test]
    fn test_validate_empty_string() {
        let err = validate_short_code("").unwrap_err();
        assert!(matches!(err, AppError::InvalidCode { .. }));
    }

    #[test]
    fn test_validate_rejects_characters_outside_charset() {
        for code in [
            "my code", "promo!", "a/b", "ü", "dot.ted", "q?x=1", "tab\t", "émoji😀", "%20",
        ] {
            let err = validate_short_code(code).unwrap_err();
            assert!(
                matches!(err, AppError::InvalidCode { .. }),
                "accepted: {code}"
            );
        }
    }

    #[test]
    fn test_well_formed_code() {
        assert!(is_well_formed_code("promo1"));
        assert!(is_well_formed_code("links"));
        for code in ["", "a\0b", "dot.ted", "promo1\n", "a b"] {
            assert!(!is_well_formed_code(code), "accepted: {code:?}");
        }
    }

    #[test]
    fn test_validate_rejects_trailing_newline() {
        assert!(validate_short_code("promo1\n").is_err());
    }

    #[test]
    fn test_validate_all_reserved_codes() {
        for &reserved in RESERVED_CODES {
            let err = validate_short_code(reserved).unwrap_err();
            assert_eq!(err.to_string(), "This short code is reserved");
        }
    }

    #[test]
    fn test_reserved_check_is_case_sensitive() {
        assert!(validate_short_code("Links").is_ok());
    }
}
