//! Command implementations.
//!
//! Every command returns the envelope of the operation it ran; `main`
//! prints it and derives the exit status from it.

pub mod login;
pub mod request;
pub mod set_role;
pub mod whoami;

use anyhow::Result;
use tether_core::ResponseEnvelope;
use tether_http::ApiClient;

use crate::cli::Commands;
use crate::output;

pub async fn handle(command: Commands, client: &ApiClient) -> Result<ResponseEnvelope> {
    match command {
        Commands::Login(args) => login::run(client, args).await,
        Commands::Logout => {
            let envelope = client.logout().await;
            if envelope.is_success() {
                output::success("Logged out");
            }
            Ok(envelope)
        }
        Commands::Whoami(args) => whoami::run(client, args).await,
        Commands::Refresh => {
            let envelope = client.refresh().await;
            if envelope.is_success() {
                output::success("Session refreshed");
            }
            Ok(envelope)
        }
        Commands::Recommendations => Ok(client.recommendations().await),
        Commands::SetRole(args) => set_role::run(client, args).await,
        Commands::Request(args) => request::run(client, args).await,
    }
}
