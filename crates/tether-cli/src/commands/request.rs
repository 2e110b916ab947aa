//! Request command implementation.

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use tether_core::{Method, RequestDescriptor, ResponseEnvelope};
use tether_http::ApiClient;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: Method,

    /// Path relative to the base URL, e.g. /items/1
    pub path: String,

    /// JSON request body
    #[arg(long, value_parser = parse_json)]
    pub data: Option<Value>,

    /// Send without the access token
    #[arg(long)]
    pub public: bool,

    /// JSON payload to serve if the backend fails or is unreachable
    #[arg(long, value_parser = parse_json)]
    pub fallback: Option<Value>,
}

pub async fn run(client: &ApiClient, args: RequestArgs) -> Result<ResponseEnvelope> {
    Ok(client.execute(&descriptor(args)).await)
}

fn descriptor(args: RequestArgs) -> RequestDescriptor {
    let mut descriptor = RequestDescriptor::new(args.method, args.path);
    if let Some(data) = args.data {
        descriptor = descriptor.with_body(data);
    }
    if args.public {
        descriptor = descriptor.public();
    }
    if let Some(fallback) = args.fallback {
        descriptor = descriptor.with_fallback(fallback);
    }
    descriptor
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {}", e))
}
