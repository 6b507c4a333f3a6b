//! Caller identification.
//!
//! Authentication proper lives in front of this service; by the time a
//! request arrives here it either carries a user id or it does not.
//! Admin endpoints use a separate bearer token from the configuration.

use axum::http::HeaderMap;

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Header carrying the authenticated user's id.
pub const USER_HEADER: &str = "x-user-id";

/// The calling user's id, if the request carries one.
pub fn current_user(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(USER_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// The calling user's id, or `Unauthorized` for anonymous requests.
pub fn require_user(headers: &HeaderMap) -> Result<String, ServerError> {
    current_user(headers)
        .ok_or_else(|| ServerError::Unauthorized("Authentication required".to_string()))
}

/// Check the admin bearer token against the configured one.
pub fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    // Constant-time comparison to prevent timing attacks on admin token.
    use subtle::ConstantTimeEq;
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    #[test]
    fn user_header_round_trip() {
        let headers = headers_with(USER_HEADER, "user-a");
        assert_eq!(current_user(&headers).as_deref(), Some("user-a"));
        assert_eq!(require_user(&headers).unwrap(), "user-a");
    }

    #[test]
    fn missing_or_blank_user_is_anonymous() {
        assert_eq!(current_user(&HeaderMap::new()), None);
        assert!(require_user(&HeaderMap::new()).is_err());

        let blank = headers_with(USER_HEADER, "   ");
        assert_eq!(current_user(&blank), None);
    }

    #[test]
    fn admin_token_is_checked() {
        let config = ServerConfig {
            admin_token: Some("secret".to_string()),
            ..Default::default()
        };

        let good = headers_with("authorization", "Bearer secret");
        assert!(verify_admin_token(&good, &config).is_ok());

        let bad = headers_with("authorization", "Bearer nope");
        assert!(verify_admin_token(&bad, &config).is_err());

        assert!(verify_admin_token(&HeaderMap::new(), &config).is_err());
    }

    #[test]
    fn admin_api_disabled_without_token() {
        let config = ServerConfig::default();
        let headers = headers_with("authorization", "Bearer anything");
        assert!(matches!(
            verify_admin_token(&headers, &config),
            Err(ServerError::Forbidden(_))
        ));
    }
}
