//! Client configuration.

use std::time::Duration;

use crate::types::BaseUrl;

/// Default bound on every network leg (initial request, refresh, retry).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration shared by the request executor and its transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; request paths are appended to it.
    pub base_url: BaseUrl,
    /// Timeout applied to each network leg independently.
    pub timeout: Duration,
    /// `User-Agent` header sent by network transports.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with default timeout and user agent.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("tether/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Override the per-leg timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
