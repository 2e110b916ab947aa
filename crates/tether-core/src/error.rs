//! Error types for the tether client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, credential-store and input
//! validation errors. The request executor never returns these directly; it
//! folds every failure into a [`ResponseEnvelope`](crate::ResponseEnvelope).
//! Callers that prefer `?` can convert a failed envelope back into an
//! [`Error`] with [`ResponseEnvelope::into_result`](crate::ResponseEnvelope::into_result).

use std::fmt;
use thiserror::Error;

/// The unified error type for tether operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (missing credentials, expired session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (non-2xx responses, unexpected bodies).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The credential store could not be read or written.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation errors (base URL, request paths).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Transport-level errors: no HTTP response was obtained.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No access token is stored for an endpoint that requires one.
    #[error("not authenticated")]
    Unauthenticated,

    /// The access token was rejected and could not be renewed.
    #[error("session expired")]
    SessionExpired,
}

/// Protocol-level errors from non-2xx responses.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error message from the server, if the body carried one.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Build a protocol error from a raw response body.
    ///
    /// The message is the first string found in the `error`, `message` or
    /// `detail` fields, or the `message` of a nested `error` object.
    pub fn from_body(status: u16, body: &str) -> Self {
        Self::new(status, extract_message(body))
    }

    /// The message to show a user: the server's, or a generic one.
    pub fn display_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("Request failed with status {}", self.status))
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    for field in ["error", "message", "detail"] {
        match value.get(field) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Object(obj)) => {
                if let Some(serde_json::Value::String(s)) = obj.get("message") {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }

    None
}

/// Credential store failures.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backing storage could not be accessed.
    #[error("credential store unavailable: {message}")]
    Unavailable { message: String },

    /// The stored data could not be parsed.
    #[error("credential store corrupt: {message}")]
    Corrupt { message: String },
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Invalid request path.
    #[error("invalid path '{value}': {reason}")]
    Path { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_error_field() {
        let err = ProtocolError::from_body(500, r#"{"error":"database down"}"#);
        assert_eq!(err.message.as_deref(), Some("database down"));
    }

    #[test]
    fn falls_back_to_message_and_detail() {
        let err = ProtocolError::from_body(400, r#"{"message":"bad role"}"#);
        assert_eq!(err.message.as_deref(), Some("bad role"));

        let err = ProtocolError::from_body(422, r#"{"detail":"missing field"}"#);
        assert_eq!(err.message.as_deref(), Some("missing field"));
    }

    #[test]
    fn extracts_nested_error_object() {
        let err = ProtocolError::from_body(403, r#"{"error":{"code":"E1","message":"forbidden"}}"#);
        assert_eq!(err.message.as_deref(), Some("forbidden"));
    }

    #[test]
    fn non_json_body_has_no_message() {
        let err = ProtocolError::from_body(502, "Bad Gateway");
        assert!(err.message.is_none());
        assert_eq!(err.display_message(), "Request failed with status 502");
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[test]
    fn display_includes_message() {
        let err = ProtocolError::new(500, Some("boom".to_string()));
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
