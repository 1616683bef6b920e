//! Errors produced by the envelope layer.

use common::ErrorKind;
use thiserror::Error;

/// Errors produced by the envelope layer.
///
/// Use [`SealError::kind`] to branch on the failure category.
#[derive(Debug, Error)]
pub enum SealError {
    /// The algorithm descriptor parameters are not a supported combination.
    #[error("invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    /// The raw key does not match the algorithm's key size.
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    /// Envelope fields violate an invariant (IV length, empty ciphertext, tag
    /// presence or length).
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Cipher configuration values are out of range.
    #[error("invalid cipher configuration: {0}")]
    InvalidConfig(String),

    /// Serialized bytes failed length or bounds validation.
    #[error("malformed envelope encoding: {0}")]
    Malformed(String),

    /// Serialized bytes carry an unknown version byte.
    #[error("unsupported envelope format version: {0:#04x}")]
    UnsupportedFormat(u8),

    /// Authentication failed. Covers tag mismatch as well as padding and AEAD
    /// rejections so the cause cannot be told apart from the outside.
    #[error("envelope authentication failed")]
    Integrity,

    /// The envelope is older than the configured maximum age.
    #[error("envelope expired: age {age_millis} ms exceeds maximum {max_age_millis} ms")]
    Expired { age_millis: u64, max_age_millis: u64 },

    /// The plaintext is not valid UTF-8 where text was requested.
    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,

    /// The buffer has been wiped and can no longer be read.
    #[error("sensitive buffer has been wiped")]
    Wiped,

    /// The operation is not valid for this value.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// The OS random source or a primitive failed unexpectedly.
    #[error("internal crypto failure: {0}")]
    Internal(String),
}

impl SealError {
    /// Returns the taxonomy category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SealError::InvalidAlgorithm(_)
            | SealError::InvalidKeyLength { .. }
            | SealError::InvalidEnvelope(_)
            | SealError::InvalidConfig(_) => ErrorKind::Construction,
            SealError::Malformed(_) | SealError::InvalidUtf8 => ErrorKind::MalformedInput,
            SealError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            SealError::Integrity => ErrorKind::Integrity,
            SealError::Expired { .. } => ErrorKind::Expired,
            SealError::Wiped | SealError::UnsupportedOperation(_) => ErrorKind::State,
            SealError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        SealError::Malformed(msg.into())
    }
}
