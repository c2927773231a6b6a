use axum::http::HeaderMap;
use shared::ServiceError;

/// Checks a caller-supplied key against the configured one.
///
/// A deployment that never set `API_KEY`, or left it empty, fails closed:
/// the call is rejected as misconfigured, not waved through.
pub fn check_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), ServiceError> {
    let expected = match expected {
        Some(key) if !key.is_empty() => key,
        _ => return Err(ServiceError::Misconfigured),
    };
    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(ServiceError::Unauthorized),
    }
}

pub fn header_key(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-api-key").and_then(|v| v.to_str().ok())
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_config_is_misconfigured() {
        assert!(matches!(
            check_key(None, Some("whatever")),
            Err(ServiceError::Misconfigured)
        ));
    }

    #[test]
    fn test_empty_configured_key_is_misconfigured() {
        // an empty expected key must not let an empty supplied key through
        assert!(matches!(
            check_key(Some(""), Some("")),
            Err(ServiceError::Misconfigured)
        ));
        assert!(matches!(
            check_key(Some(""), Some("anything")),
            Err(ServiceError::Misconfigured)
        ));
    }

    #[test]
    fn test_wrong_or_absent_key_is_unauthorized() {
        assert!(matches!(
            check_key(Some("secret"), Some("wrong")),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            check_key(Some("secret"), None),
            Err(ServiceError::Unauthorized)
        ));
        // same prefix, different length
        assert!(matches!(
            check_key(Some("secret"), Some("secret1")),
            Err(ServiceError::Unauthorized)
        ));
    }

    #[test]
    fn test_matching_key_passes() {
        assert!(check_key(Some("secret"), Some("secret")).is_ok());
    }

    #[test]
    fn test_header_key_reads_x_api_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_key(&headers), None);
        headers.insert("x-api-key", HeaderValue::from_static("abc"));
        assert_eq!(header_key(&headers), Some("abc"));
    }
}
