//! `Authorization: Bearer <token>` parsing.

use contacthub_core::HeaderError;

/// Extracts the token from an `Authorization` header value.
///
/// The value must split on single spaces into exactly two parts, the first of which is
/// `bearer` in any case.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, HeaderError> {
    let header = match header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(HeaderError::MissingHeader),
    };

    let mut parts = header.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(HeaderError::MalformedHeader);
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(HeaderError::MalformedHeader);
    }
    if token.is_empty() {
        return Err(HeaderError::EmptyToken);
    }

    Ok(token)
}
