//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{login, request, set_role, whoami};

/// Exercise a session-aware API client from the terminal.
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(author, version = env!("TETHER_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command that talks to the backend.
#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Backend base URL
    #[arg(
        long,
        env = "TETHER_BASE_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Session file (defaults to the platform data directory)
    #[arg(long, env = "TETHER_STORE", global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a session with email and password
    Login(login::LoginArgs),

    /// End the session and forget stored tokens
    Logout,

    /// Show the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new token pair
    Refresh,

    /// Fetch recommendations (falls back to a default list)
    Recommendations,

    /// Change a user's role
    SetRole(set_role::SetRoleArgs),

    /// Issue an arbitrary request through the session
    Request(request::RequestArgs),
}
