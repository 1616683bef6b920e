//! Error taxonomy shared across crates.

use std::fmt;

use thiserror::Error;

/// Classification of every failure the workspace can surface.
///
/// Library error enums expose a `kind()` accessor returning one of these so
/// callers can branch on the category without matching on crate-specific
/// variants. Each kind maps to a stable process exit code for `sealctl`:
/// - [`ErrorKind::Construction`] → 2
/// - [`ErrorKind::MalformedInput`] → 3
/// - [`ErrorKind::UnsupportedFormat`] → 3
/// - [`ErrorKind::Integrity`] → 4
/// - [`ErrorKind::Expired`] → 5
/// - [`ErrorKind::State`] → 6
/// - [`ErrorKind::Policy`] → 7
/// - [`ErrorKind::Internal`] → 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid parameters supplied by the caller (algorithm, key length).
    Construction,
    /// Serialized input failed length or bounds validation.
    MalformedInput,
    /// Serialized input carries a version byte this build does not understand.
    UnsupportedFormat,
    /// Authentication failed. Deliberately undifferentiated.
    Integrity,
    /// Envelope is older than the configured maximum age.
    Expired,
    /// Operation not valid for the current state of a value (wiped buffer,
    /// legacy re-serialisation, missing master key).
    State,
    /// A policy gate refused the request (executable allow-list, paths).
    Policy,
    /// Unexpected failure inside a dependency (random source, process spawn).
    Internal,
}

impl ErrorKind {
    /// Returns the process exit code `sealctl` uses for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Construction => 2,
            ErrorKind::MalformedInput | ErrorKind::UnsupportedFormat => 3,
            ErrorKind::Integrity => 4,
            ErrorKind::Expired => 5,
            ErrorKind::State => 6,
            ErrorKind::Policy => 7,
            ErrorKind::Internal => 1,
        }
    }

    /// Short machine-readable code (e.g. `"integrity"`).
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Construction => "construction",
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Expired => "expired",
            ErrorKind::State => "state",
            ErrorKind::Policy => "policy",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified failure carrying a message that is safe to show to callers.
///
/// Used at binary boundaries where the originating crate's error type is no
/// longer needed, only its category and a redacted description.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    /// Category of the failure.
    pub kind: ErrorKind,
    /// Human-readable description. Never contains key or plaintext material.
    pub message: String,
}

impl ServiceError {
    /// Construct a [`ServiceError`] from a kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(ErrorKind::Construction.exit_code(), 2);
        assert_eq!(ErrorKind::MalformedInput.exit_code(), 3);
        assert_eq!(ErrorKind::UnsupportedFormat.exit_code(), 3);
        assert_eq!(ErrorKind::Integrity.exit_code(), 4);
        assert_eq!(ErrorKind::Expired.exit_code(), 5);
        assert_eq!(ErrorKind::State.exit_code(), 6);
        assert_eq!(ErrorKind::Policy.exit_code(), 7);
        assert_eq!(ErrorKind::Internal.exit_code(), 1);
    }

    #[test]
    fn integrity_and_expired_are_distinct() {
        assert_ne!(ErrorKind::Integrity, ErrorKind::Expired);
        assert_ne!(
            ErrorKind::Integrity.exit_code(),
            ErrorKind::Expired.exit_code()
        );
    }

    #[test]
    fn display_includes_code_and_message() {
        let e = ServiceError::new(ErrorKind::Policy, "executable not allow-listed");
        let s = e.to_string();
        assert!(s.starts_with("policy: "));
        assert!(s.contains("executable not allow-listed"));
        assert_eq!(e.exit_code(), 7);
    }
}
