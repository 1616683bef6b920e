//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Seal and open authenticated envelopes; run allow-listed executables.
///
/// Settings come from `SEAL_*` environment variables. Logs are written to
/// stderr as JSON.
#[derive(Debug, Parser)]
#[command(name = "sealctl", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a random key for the configured algorithm.
    Keygen,

    /// Encrypt plaintext under `SEAL_KEY`.
    Encrypt(IoArgs),

    /// Authenticate and decrypt an envelope under `SEAL_KEY`.
    Decrypt(IoArgs),

    /// Describe an envelope without decrypting it.
    Inspect(IoArgs),

    /// Run an allow-listed executable with escaped arguments.
    Exec {
        /// Absolute, canonical path of the executable.
        executable: PathBuf,

        /// Working directory for the child process.
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Arguments passed to the executable after escaping.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct IoArgs {
    /// Read from this file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Use the raw binary envelope layout instead of URL-safe base64 text.
    #[arg(long)]
    pub binary: bool,
}
