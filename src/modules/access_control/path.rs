//! Request path screening.
//!
//! Whitelist patterns are matched segment by segment against the raw path,
//! and upstream servers normalize the path they receive. A path is only
//! matched when both sides would read it the same way, so anything that a
//! server may rewrite (dot segments, escaped separators, backslashes, path
//! parameters) is refused up front.

use thiserror::Error;

/// Why a request path was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathViolation {
    /// The path does not start with `/`.
    #[error("path is not absolute")]
    NotAbsolute,

    /// A `.` or `..` segment.
    #[error("dot segment in path")]
    DotSegment,

    /// An empty segment between two slashes.
    #[error("empty segment in path")]
    EmptySegment,

    /// A literal backslash.
    #[error("backslash in path")]
    Backslash,

    /// A `;` path parameter.
    #[error("path parameter in path")]
    Semicolon,

    /// A percent escape that decodes to a separator, dot, percent, `;` or NUL.
    #[error("encoded '{0}' in path")]
    EncodedReserved(char),

    /// A raw control character.
    #[error("control character in path")]
    ControlCharacter,
}

/// Bytes that must never appear percent-encoded in a path.
const RESERVED_ESCAPES: &[u8] = b"./\\%;\0";

/// Check that `path` is in canonical form.
///
/// # Errors
///
/// Returns the first `PathViolation` found.
pub fn check_path(path: &str) -> Result<(), PathViolation> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PathViolation::NotAbsolute);
    };

    let bytes = path.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\\' => return Err(PathViolation::Backslash),
            b';' => return Err(PathViolation::Semicolon),
            b'%' => {
                if let Some(decoded) = decode_escape(&bytes[i + 1..]) {
                    if RESERVED_ESCAPES.contains(&decoded) {
                        return Err(PathViolation::EncodedReserved(char::from(decoded)));
                    }
                }
            },
            b if b.is_ascii_control() => return Err(PathViolation::ControlCharacter),
            _ => {},
        }
    }

    if rest.is_empty() {
        return Ok(());
    }

    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;
    for (idx, segment) in segments.iter().enumerate() {
        match *segment {
            "." | ".." => return Err(PathViolation::DotSegment),
            // A single trailing slash is fine
            "" if idx != last => return Err(PathViolation::EmptySegment),
            _ => {},
        }
    }

    Ok(())
}

/// Check if `path` is in canonical form.
#[must_use]
pub fn is_canonical_path(path: &str) -> bool {
    check_path(path).is_ok()
}

fn decode_escape(hex: &[u8]) -> Option<u8> {
    let hi = char::from(*hex.first()?).to_digit(16)?;
    let lo = char::from(*hex.get(1)?).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_paths() {
        for path in [
            "/",
            "/users",
            "/users/",
            "/actuator/health",
            "/users/u1/orders",
            "/files/report.v2.pdf",
            "/.well-known/openid-configuration",
            "/search%20results",
        ] {
            assert!(is_canonical_path(path), "{path}");
        }
    }

    #[test]
    fn test_dot_segments() {
        assert_eq!(check_path("/actuator/../users"), Err(PathViolation::DotSegment));
        assert_eq!(check_path("/actuator/./health"), Err(PathViolation::DotSegment));
        assert_eq!(check_path("/.."), Err(PathViolation::DotSegment));
        assert_eq!(check_path("/actuator/.."), Err(PathViolation::DotSegment));
    }

    #[test]
    fn test_encoded_reserved_characters() {
        assert_eq!(
            check_path("/actuator/%2e%2e/users"),
            Err(PathViolation::EncodedReserved('.'))
        );
        assert_eq!(
            check_path("/actuator/%2E%2E/users"),
            Err(PathViolation::EncodedReserved('.'))
        );
        assert_eq!(
            check_path("/actuator%2fusers"),
            Err(PathViolation::EncodedReserved('/'))
        );
        assert_eq!(
            check_path("/actuator%5C..%5Cusers"),
            Err(PathViolation::EncodedReserved('\\'))
        );
        assert_eq!(
            check_path("/actuator/%252e%252e/users"),
            Err(PathViolation::EncodedReserved('%'))
        );
        assert_eq!(check_path("/users%00"), Err(PathViolation::EncodedReserved('\0')));
        // Incomplete escapes are left alone
        assert!(is_canonical_path("/users%2"));
    }

    #[test]
    fn test_other_violations() {
        assert_eq!(check_path("users"), Err(PathViolation::NotAbsolute));
        assert_eq!(check_path(""), Err(PathViolation::NotAbsolute));
        assert_eq!(check_path("/actuator\\..\\users"), Err(PathViolation::Backslash));
        assert_eq!(check_path("/actuator/..;/users"), Err(PathViolation::Semicolon));
        assert_eq!(check_path("/actuator//users"), Err(PathViolation::EmptySegment));
        assert_eq!(check_path("//users"), Err(PathViolation::EmptySegment));
        assert_eq!(check_path("/users\t"), Err(PathViolation::ControlCharacter));
    }
}
