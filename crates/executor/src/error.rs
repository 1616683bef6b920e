//! Errors produced by the execution gate.

use std::io;
use std::path::PathBuf;

use common::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no such executable: {0}")]
    NotFound(PathBuf),

    #[error("executable path is not absolute: {0}")]
    NotAbsolute(PathBuf),

    #[error("executable path is not canonical: {0}")]
    NotCanonical(PathBuf),

    /// The canonical path is not listed in the allow-list.
    #[error("executable is not allow-listed: {0}")]
    NotAllowed(PathBuf),

    #[error("no such working directory: {0}")]
    MissingWorkdir(PathBuf),

    #[error("invalid executor configuration: {0}")]
    InvalidConfig(String),

    /// Spawning the process or reading its output failed.
    #[error("execution failed: {0}")]
    Io(#[from] io::Error),
}

impl ExecError {
    /// Returns the taxonomy category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecError::NotFound(_)
            | ExecError::NotAbsolute(_)
            | ExecError::NotCanonical(_)
            | ExecError::NotAllowed(_)
            | ExecError::MissingWorkdir(_) => ErrorKind::Policy,
            ExecError::InvalidConfig(_) => ErrorKind::Construction,
            ExecError::Io(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_rejections_are_policy() {
        assert_eq!(
            ExecError::NotAllowed("/bin/sh".into()).kind(),
            ErrorKind::Policy
        );
        assert_eq!(
            ExecError::MissingWorkdir("/nope".into()).kind(),
            ErrorKind::Policy
        );
        assert_eq!(ErrorKind::Policy.exit_code(), 7);
    }

    #[test]
    fn io_is_internal() {
        let err = ExecError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
