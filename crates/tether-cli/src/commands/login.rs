//! Login command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use tether_core::{Credentials, ResponseEnvelope};
use tether_http::ApiClient;

use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "TETHER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(client: &ApiClient, args: LoginArgs) -> Result<ResponseEnvelope> {
    let credentials = Credentials::new(&args.email, &args.password);

    eprintln!("{}", "Logging in...".dimmed());
    let envelope = client.login(&credentials).await;

    if envelope.is_success() {
        output::success(&format!("Logged in as {}", credentials.email()));
    }
    Ok(envelope)
}
