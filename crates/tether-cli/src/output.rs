//! Output formatting helpers.
//!
//! Envelopes go to stdout as JSON; human-readable status lines go to stderr
//! so the JSON stays pipeable.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use tether_core::ResponseEnvelope;

/// Print a success message.
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning.
pub fn warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print an envelope and a one-line summary of its outcome.
pub fn envelope<T: Serialize>(envelope: &ResponseEnvelope<T>) -> Result<()> {
    json_pretty(envelope)?;

    if !envelope.is_success() {
        error(envelope.error().unwrap_or("Request failed"));
    } else if envelope.is_degraded() {
        warning("Backend unavailable; served fallback data");
    }
    Ok(())
}
