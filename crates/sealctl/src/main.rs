//! `sealctl`: command-line entry point.
//!
//! Startup sequence:
//! 1. Parse arguments.
//! 2. Load and validate [`Config`] from `SEAL_*` environment variables.
//! 3. Initialise structured JSON logging on stderr.
//! 4. Build the cipher (and gate, for `exec`) and dispatch the subcommand.
//!
//! Failures are written to stderr as an
//! [`ErrorResponse`](common::protocol::ErrorResponse) and the process exits
//! with the code of the failure's [`ErrorKind`].

mod cli;
mod commands;
mod config;
mod telemetry;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use common::error::ServiceError;
use common::protocol::ErrorResponse;
use common::ErrorKind;
use executor::{ExecError, Gate};
use sealed::{EnvelopeCipher, SealError, SensitiveBytes};
use tracing::{debug, info};

use cli::{Cli, Command};
use config::Config;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = classify(&e);
            let body = ErrorResponse::new(kind.code(), format!("{e:#}"));
            match serde_json::to_string(&body) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("ERROR: {e:#}"),
            }
            ExitCode::from(u8::try_from(kind.exit_code()).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        ServiceError::new(ErrorKind::Construction, format!("configuration invalid: {e:#}"))
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    debug!(config = ?cfg, "configuration loaded");

    // -----------------------------------------------------------------------
    // 3. Cipher
    // -----------------------------------------------------------------------
    let mut cipher = EnvelopeCipher::from_config(&cfg.cipher_config())?;
    if let Some(key) = cfg.master_key().map_err(|e| {
        ServiceError::new(ErrorKind::Construction, format!("{e:#}"))
    })? {
        cipher = cipher.with_master_key(key)?;
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        algorithm = %cipher.spec(),
        "sealctl starting"
    );

    // -----------------------------------------------------------------------
    // 4. Dispatch
    // -----------------------------------------------------------------------
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Keygen => commands::keygen(&cipher, &mut out)?,
        Command::Encrypt(opts) => {
            let plaintext = SensitiveBytes::new(commands::read_input(opts.input.as_deref())?);
            commands::encrypt(&cipher, plaintext, opts.binary, &mut out)?;
        }
        Command::Decrypt(opts) => {
            let input = commands::read_input(opts.input.as_deref())?;
            commands::decrypt(&cipher, &input, opts.binary, &mut out)?;
        }
        Command::Inspect(opts) => {
            let input = commands::read_input(opts.input.as_deref())?;
            commands::inspect(&input, opts.binary, &mut out)?;
        }
        Command::Exec {
            executable,
            workdir,
            args,
        } => {
            let exec_cfg = cfg.executor_config();
            let gate = Gate::new(&exec_cfg)?;
            commands::exec(&gate, exec_cfg.codec()?, executable, workdir, args, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Map a failure to its taxonomy kind by finding the first typed cause.
fn classify(err: &anyhow::Error) -> ErrorKind {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<SealError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<ExecError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<ServiceError>() {
            return e.kind;
        }
    }
    ErrorKind::Internal
}
