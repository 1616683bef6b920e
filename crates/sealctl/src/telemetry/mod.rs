//! Structured JSON logging for `sealctl`.
//!
//! Logs go to stderr so stdout carries only command output (envelopes,
//! plaintext, JSON reports). Level comes from `RUST_LOG` when set, otherwise
//! from `SEAL_LOG_LEVEL` (default: `info`).

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise sealctl tracing subscriber: {e}"))
}
