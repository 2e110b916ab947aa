//! tether-http - reqwest transport and API client.
//!
//! # Example
//!
//! ```no_run
//! use tether_core::{BaseUrl, ClientConfig, CredentialManager, Credentials};
//! use tether_http::ApiClient;
//!
//! # async fn example() -> Result<(), tether_core::Error> {
//! let config = ClientConfig::new(BaseUrl::new("https://api.example.com")?);
//! let client = ApiClient::new(config, CredentialManager::in_memory())?;
//!
//! let login = client
//!     .login(&Credentials::new("ada@example.com", "hunter2"))
//!     .await;
//! if login.is_success() {
//!     let feed = client.recommendations().await;
//!     println!("{}", serde_json::to_string(&feed).unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod transport;

pub use client::{ApiClient, RECOMMENDATIONS, fallback_recommendations};
pub use transport::ReqwestTransport;
