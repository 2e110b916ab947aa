//! Builds the API client from CLI settings and the persisted session.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use tether_core::{BaseUrl, ClientConfig, CredentialManager};
use tether_file::FileCredentialStore;
use tether_http::ApiClient;

use crate::cli::ClientArgs;

/// Open the session store and build a client over it.
pub fn connect(args: &ClientArgs) -> Result<ApiClient> {
    let base_url = BaseUrl::new(&args.base_url).context("Invalid base URL")?;

    let store = match &args.store {
        Some(path) => FileCredentialStore::new(path),
        None => FileCredentialStore::default_location()
            .context("Could not determine session directory")?,
    };
    debug!(path = %store.path().display(), base_url = %base_url, "Using session store");

    let config = ClientConfig::new(base_url)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_user_agent(concat!("tether/", env!("TETHER_VERSION")));

    ApiClient::new(config, CredentialManager::new(store)).context("Failed to build HTTP client")
}
