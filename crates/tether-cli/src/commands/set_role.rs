//! Set-role command implementation.

use anyhow::Result;
use clap::Args;

use tether_core::ResponseEnvelope;
use tether_http::ApiClient;

use crate::output;

#[derive(Args, Debug)]
pub struct SetRoleArgs {
    /// Id of the user to update
    pub user_id: String,

    /// New role name
    pub role: String,
}

pub async fn run(client: &ApiClient, args: SetRoleArgs) -> Result<ResponseEnvelope> {
    let envelope = client.update_user_role(&args.user_id, &args.role).await;
    if envelope.is_success() {
        output::success(&format!("User {} is now {}", args.user_id, args.role));
    }
    Ok(envelope)
}
