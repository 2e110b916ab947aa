//! Authentication endpoint definitions and wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tokens::{AccessToken, RefreshToken};

/// POST, exchanges credentials for a token pair.
pub const LOGIN: &str = "/auth/login";

/// POST, exchanges a refresh token for a new token pair.
pub const REFRESH: &str = "/auth/refresh";

/// POST, invalidates the session server-side.
pub const LOGOUT: &str = "/auth/logout";

/// GET, returns the signed-in user's profile.
pub const CURRENT_USER: &str = "/auth/me";

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Token pair as returned by login and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// The access token, if present and non-empty.
    pub fn access(&self) -> Option<AccessToken> {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
    }

    /// The refresh token, if present and non-empty.
    pub fn refresh(&self) -> Option<RefreshToken> {
        self.refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(RefreshToken::new)
    }
}

/// Body of a successful login or refresh response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub tokens: TokenPair,
    #[serde(default)]
    pub user: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_request_body() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "r1",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"refresh_token": "r1"}));
    }

    #[test]
    fn refresh_response_without_refresh_token() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"tokens":{"access_token":"a2"}}"#).unwrap();
        assert_eq!(response.tokens.access().unwrap().as_str(), "a2");
        assert!(response.tokens.refresh().is_none());
        assert!(response.user.is_none());
    }

    #[test]
    fn empty_tokens_are_absent() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"tokens":{"access_token":"","refresh_token":""}}"#)
                .unwrap();
        assert!(response.tokens.access().is_none());
        assert!(response.tokens.refresh().is_none());
    }
}
