//! Subscriber URL validation
//!
//! A subscriber URL must parse as an absolute URL with a scheme and a host.
//! Only `http` and `https` are accepted since every delivery is an HTTP POST.
//! No DNS resolution is performed.

use url::Url;

/// Schemes a subscriber may register with
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Validation error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("URL is empty")]
    Empty,
    #[error("URL has leading or trailing whitespace")]
    SurroundingWhitespace,
    #[error("URL could not be parsed: {0}")]
    Unparseable(String),
    #[error("URL contains control characters")]
    ControlCharacters,
    #[error("URL has no authority (expected \"//\" after the scheme)")]
    MissingAuthority,
    #[error("URL has no host")]
    MissingHost,
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Validate a candidate subscriber URL, reporting why it was rejected.
pub fn validate_subscriber_url(candidate: &str) -> ValidationResult<()> {
    if candidate.is_empty() {
        return Err(ValidationError::Empty);
    }

    // The parser trims these silently; the stored key must be what it saw.
    if candidate.trim() != candidate {
        return Err(ValidationError::SurroundingWhitespace);
    }

    // Inner tabs and newlines are stripped by the parser as well.
    if candidate.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacters);
    }

    let parsed = Url::parse(candidate).map_err(|e| ValidationError::Unparseable(e.to_string()))?;

    let scheme = parsed.scheme();
    if !ALLOWED_SCHEMES.contains(&scheme) {
        return Err(ValidationError::UnsupportedScheme(scheme.to_string()));
    }

    // `http:a` and `http:/a` parse as `http://a/`; require the authority verbatim.
    let after_scheme = candidate
        .split_once(':')
        .map_or("", |(_, rest)| rest);
    if !after_scheme.starts_with("//") {
        return Err(ValidationError::MissingAuthority);
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingHost),
    }
}

/// Returns true if `candidate` is acceptable as a subscriber callback URL
#[must_use]
pub fn is_valid_subscriber_url(candidate: &str) -> bool {
    validate_subscriber_url(candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(is_valid_subscriber_url("http://a"));
        assert!(is_valid_subscriber_url("https://x.y:1/z?q=1"));
        assert!(is_valid_subscriber_url("http://127.0.0.1:9000/hook"));
        assert!(is_valid_subscriber_url("http://[::1]:8080/"));
        assert!(is_valid_subscriber_url("https://example.com/path#frag"));
    }

    #[test]
    fn test_rejects_boundary_inputs() {
        assert_eq!(validate_subscriber_url(""), Err(ValidationError::Empty));
        assert!(!is_valid_subscriber_url("not-a-url"));
        assert!(!is_valid_subscriber_url("/relative/path"));
        assert!(!is_valid_subscriber_url("http://"));
        assert!(!is_valid_subscriber_url("example.com"));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert_eq!(
            validate_subscriber_url("ftp://host"),
            Err(ValidationError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(!is_valid_subscriber_url("mailto:someone@example.com"));
        assert!(!is_valid_subscriber_url("file:///etc/passwd"));
    }

    #[test]
    fn test_rejects_surrounding_whitespace() {
        assert_eq!(
            validate_subscriber_url(" http://a"),
            Err(ValidationError::SurroundingWhitespace)
        );
        assert_eq!(
            validate_subscriber_url("http://a\n"),
            Err(ValidationError::SurroundingWhitespace)
        );
    }

    #[test]
    fn test_rejects_missing_authority() {
        for candidate in ["http:a", "http:/a", "http:\\\\a", "https:example.com/hook"] {
            assert_eq!(
                validate_subscriber_url(candidate),
                Err(ValidationError::MissingAuthority),
                "{candidate:?}"
            );
        }
        assert!(is_valid_subscriber_url("HTTP://a"));
    }

    #[test]
    fn test_rejects_inner_control_characters() {
        for candidate in ["http://exa\tmple.com", "http://a\n/b", "http://a/\u{7f}"] {
            assert_eq!(
                validate_subscriber_url(candidate),
                Err(ValidationError::ControlCharacters),
                "{candidate:?}"
            );
        }
    }
}
