//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tether_core::{ErrorKind, ResponseEnvelope, STATUS_NO_RESPONSE};
use tether_http::ApiClient;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Show the identity cached at login instead of asking the backend
    #[arg(long)]
    pub offline: bool,
}

pub async fn run(client: &ApiClient, args: WhoamiArgs) -> Result<ResponseEnvelope> {
    if !args.offline {
        return Ok(client.current_user().await);
    }

    let identity = client
        .credentials()
        .identity()
        .context("Failed to read session")?;

    Ok(match identity {
        Some(identity) => ResponseEnvelope::success(STATUS_NO_RESPONSE, Some(identity)),
        None => ResponseEnvelope::failure(
            ErrorKind::Unauthenticated,
            STATUS_NO_RESPONSE,
            "No cached identity. Run 'tether login' first.",
        ),
    })
}
