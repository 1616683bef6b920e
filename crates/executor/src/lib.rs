//! Gated execution of external programs.
//!
//! A [`CommandLine`] is built once from an executable path and raw
//! parameters. Every parameter is escaped for the target shell by
//! [`encode_for_os`] while building, so the resulting value is immutable and
//! never re-escaped. [`Gate::execute`] then checks the executable against the
//! configured allow-list before spawning it with an empty environment.

pub mod command;
pub mod config;
pub mod encoder;
pub mod error;
pub mod gate;

pub use command::{CommandLine, CommandLineBuilder};
pub use config::ExecutorConfig;
pub use encoder::{encode_for_os, OsCodec};
pub use error::ExecError;
pub use gate::{ExecOutput, Gate};
