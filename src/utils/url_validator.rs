//! Destination URL validation.

use url::Url;

/// Errors that can occur while validating a destination URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("URL must not contain control characters")]
    ControlCharacter,
}

/// Checks that `input` is an absolute http(s) URL with a host.
///
/// The URL is not rewritten: callers store `input` exactly as given so that a
/// redirect sends visitors to the same string the owner entered. The parser
/// silently drops tabs and newlines, so control characters are rejected up
/// front; anything stored must be usable verbatim as a `Location` header.
///
/// # Errors
///
/// Returns [`UrlValidationError::ControlCharacter`] if `input` contains ASCII or
/// Unicode control characters.
/// Returns [`UrlValidationError::InvalidFormat`] for relative or malformed URLs.
/// Returns [`UrlValidationError::UnsupportedProtocol`] for `javascript:`, `data:`,
/// `file:` and every other non-HTTP scheme.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_destination_url("https://example.com/x").is_ok());
/// assert!(validate_destination_url("/relative/path").is_err());
/// assert!(validate_destination_url("javascript:alert(1)").is_err());
/// ```
pub fn validate_destination_url(input: &str) -> Result<(), UrlValidationError> {
    if input.chars().any(char::is_control) {
        return Err(UrlValidationError::ControlCharacter);
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_destination_url("http://example.com").is_ok());
        assert!(validate_destination_url("https://example.com/x").is_ok());
    }

    #[test]
    fn test_accepts_query_fragment_and_port() {
        assert!(validate_destination_url("https://example.com:8443/a?utm_source=ig#top").is_ok());
    }

    #[test]
    fn test_accepts_ip_host() {
        assert!(validate_destination_url("http://192.168.1.10/path").is_ok());
        assert!(validate_destination_url("http://[::1]:8080/").is_ok());
    }

    #[test]
    fn test_rejects_relative_url() {
        let err = validate_destination_url("/relative/path").unwrap_err();
        assert!(matches!(err, UrlValidationError::InvalidFormat(_)));
    }

    #[test]
    fn test_rejects_missing_scheme() {
        assert!(validate_destination_url("example.com/page").is_err());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(validate_destination_url("").is_err());
    }

    #[test]
    fn test_rejects_control_characters() {
        for input in [
            "https://example.com/a\nb",
            "https://example.com/a\r\nSet-Cookie: x=1",
            "https://exa\tmple.com/",
            "https://example.com/\0",
            "https://example.com/\u{7f}",
            "https://example.com/\u{85}",
        ] {
            let err = validate_destination_url(input).unwrap_err();
            assert!(
                matches!(err, UrlValidationError::ControlCharacter),
                "accepted: {input:?}"
            );
        }
    }

    #[test]
    fn test_accepted_urls_are_valid_location_headers() {
        for input in [
            "https://example.com/path?utm_source=mail&x=%20y#frag",
            "https://example.com/a b",
            "http://[::1]:8080/~user",
        ] {
            assert!(validate_destination_url(input).is_ok(), "rejected: {input}");
            assert!(axum::http::HeaderValue::from_str(input).is_ok(), "{input}");
        }
    }

    #[test]
    fn test_rejects_dangerous_schemes() {
        for input in [
            "javascript:alert(1)",
            "data:text/html,<b>hi</b>",
            "file:///etc/passwd",
            "ftp://example.com/file",
        ] {
            let err = validate_destination_url(input).unwrap_err();
            assert!(
                matches!(err, UrlValidationError::UnsupportedProtocol),
                "accepted: {input}"
            );
        }
    }
}
