//! tether-core - Session-aware request execution.
//!
//! Every call goes through an [`Executor`], which attaches the stored access
//! token, transparently refreshes it once on a 401, and reports the outcome
//! as a uniform [`ResponseEnvelope`]. Degradable calls carry a fallback
//! payload that masks server and network failures.
//!
//! The network and the credential store are both traits ([`Transport`],
//! [`CredentialStore`]) so the protocol can run against in-memory fakes.

pub mod config;
pub mod credentials;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod http;
pub mod request;
pub mod session;
pub mod store;
pub mod tokens;
pub mod types;

pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use credentials::Credentials;
pub use envelope::{
    ErrorKind, MSG_SESSION_EXPIRED, MSG_TRANSPORT, MSG_UNAUTHENTICATED, ResponseEnvelope,
    STATUS_NO_RESPONSE,
};
pub use error::Error;
pub use executor::Executor;
pub use http::{HttpRequest, HttpResponse, Method, Transport};
pub use request::RequestDescriptor;
pub use session::CredentialManager;
pub use store::{CredentialStore, MemoryStore, Slot};
pub use tokens::{AccessToken, RefreshToken};
pub use types::BaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
