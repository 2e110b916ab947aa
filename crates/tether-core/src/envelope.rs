//! The uniform response envelope.
//!
//! Every executor operation answers with a [`ResponseEnvelope`], whatever
//! happened on the wire. The serialized shape is always
//! `{ success, data?, error?, status }`; the error class and the degraded
//! flag are kept for in-process inspection only.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AuthError, Error, ProtocolError, StoreError, TransportError};

/// Status reported when no HTTP response exists: transport failures, store
/// failures, and protected calls attempted without a stored token.
pub const STATUS_NO_RESPONSE: u16 = 0;

/// Message used for every transport failure.
pub const MSG_TRANSPORT: &str = "Network error: unable to reach the server";

/// Message used when a protected call is made without a stored token.
pub const MSG_UNAUTHENTICATED: &str = "Not authenticated";

/// Message used when the session could not be renewed.
pub const MSG_SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No credential for an endpoint that requires one; nothing was sent.
    Unauthenticated,
    /// The access token was rejected and could not be renewed.
    AuthenticationExpired,
    /// The server answered with a non-2xx status.
    RequestFailed,
    /// No response was obtained.
    TransportFailure,
    /// The credential store failed.
    Store,
}

impl ErrorKind {
    /// Whether a degradable call may answer this failure with its fallback.
    pub fn is_maskable(self) -> bool {
        matches!(self, ErrorKind::RequestFailed | ErrorKind::TransportFailure)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::AuthenticationExpired => "authentication_expired",
            ErrorKind::RequestFailed => "request_failed",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::Store => "store",
        };
        f.write_str(s)
    }
}

/// Uniform result of one logical call.
///
/// Invariants: a successful envelope never carries an error message; a
/// failed envelope never carries data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T = Value> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    status: u16,
    #[serde(skip)]
    kind: Option<ErrorKind>,
    #[serde(skip)]
    degraded: bool,
}

impl<T> ResponseEnvelope<T> {
    /// A successful envelope carrying the response body.
    pub fn success(status: u16, data: Option<T>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            status,
            kind: None,
            degraded: false,
        }
    }

    /// A failed envelope.
    pub fn failure(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            status,
            kind: Some(kind),
            degraded: false,
        }
    }

    /// A successful envelope carrying a fallback payload in place of the
    /// failed response. `status` is the status of the failure it replaces.
    pub fn fallback(status: u16, data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status,
            kind: None,
            degraded: true,
        }
    }

    pub(crate) fn unauthenticated() -> Self {
        Self::failure(
            ErrorKind::Unauthenticated,
            STATUS_NO_RESPONSE,
            MSG_UNAUTHENTICATED,
        )
    }

    pub(crate) fn session_expired(status: u16) -> Self {
        Self::failure(ErrorKind::AuthenticationExpired, status, MSG_SESSION_EXPIRED)
    }

    pub(crate) fn transport_failure() -> Self {
        Self::failure(
            ErrorKind::TransportFailure,
            STATUS_NO_RESPONSE,
            MSG_TRANSPORT,
        )
    }

    pub(crate) fn store_failure(err: &StoreError) -> Self {
        Self::failure(ErrorKind::Store, STATUS_NO_RESPONSE, err.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The failure class, for failed envelopes.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    /// True when `data` is a fallback payload rather than a real response.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Transform the payload, keeping status and flags.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            status: self.status,
            kind: self.kind,
            degraded: self.degraded,
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<Option<T>, Error> {
        if self.success {
            return Ok(self.data);
        }

        let message = self.error.unwrap_or_default();
        let err = match self.kind.unwrap_or(ErrorKind::RequestFailed) {
            ErrorKind::Unauthenticated => Error::Auth(AuthError::Unauthenticated),
            ErrorKind::AuthenticationExpired => Error::Auth(AuthError::SessionExpired),
            ErrorKind::RequestFailed => {
                Error::Protocol(ProtocolError::new(self.status, Some(message)))
            }
            ErrorKind::TransportFailure => {
                Error::Transport(TransportError::Connection { message })
            }
            ErrorKind::Store => Error::Store(StoreError::Unavailable { message }),
        };
        Err(err)
    }
}

impl ResponseEnvelope<Value> {
    /// Decode the JSON payload into a typed envelope.
    ///
    /// A successful body that does not match `U` becomes a
    /// [`ErrorKind::RequestFailed`] envelope with the original status.
    pub fn decode<U: DeserializeOwned>(self) -> ResponseEnvelope<U> {
        let ResponseEnvelope {
            success,
            data,
            error,
            status,
            kind,
            degraded,
        } = self;

        let data = match data.map(serde_json::from_value::<U>) {
            None => None,
            Some(Ok(decoded)) => Some(decoded),
            Some(Err(e)) => {
                return ResponseEnvelope::failure(
                    ErrorKind::RequestFailed,
                    status,
                    format!("Invalid response body: {}", e),
                );
            }
        };

        ResponseEnvelope {
            success,
            data,
            error,
            status,
            kind,
            degraded,
        }
    }
}
