//! [`CommandLine`]: an executable plus already-escaped parameters.

use std::path::{Path, PathBuf};

use crate::encoder::{encode_for_os, OsCodec};

/// Immutable command description handed to [`Gate::execute`](crate::Gate::execute).
///
/// Parameters are escaped exactly once, by [`CommandLineBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    executable: PathBuf,
    args: Vec<String>,
    workdir: Option<PathBuf>,
    codec: OsCodec,
}

impl CommandLine {
    pub fn builder(executable: impl Into<PathBuf>) -> CommandLineBuilder {
        CommandLineBuilder {
            executable: executable.into(),
            raw_args: Vec::new(),
            workdir: None,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Escaped parameters, in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    pub fn codec(&self) -> OsCodec {
        self.codec
    }
}

/// Collects raw parameters for a [`CommandLine`].
#[derive(Debug, Clone)]
pub struct CommandLineBuilder {
    executable: PathBuf,
    raw_args: Vec<String>,
    workdir: Option<PathBuf>,
}

impl CommandLineBuilder {
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.raw_args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory for the child. Defaults to the caller's.
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Escape every parameter under `codec` and freeze the result.
    pub fn build(self, codec: OsCodec) -> CommandLine {
        CommandLine {
            executable: self.executable,
            args: self
                .raw_args
                .iter()
                .map(|a| encode_for_os(codec, a))
                .collect(),
            workdir: self.workdir,
            codec,
        }
    }
}
