//! Report types printed by `sealctl` as JSON.
//!
//! None of these carry key material, plaintext, IVs or integrity tags; only
//! algorithm parameters, lengths and timestamps.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Envelope inspection
// ---------------------------------------------------------------------------

/// Metadata describing a serialized envelope, produced by `sealctl inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeReport {
    /// `"legacy"` or `"current"`.
    pub format_version: String,
    /// Transformation string, e.g. `"AES/CBC/PKCS5Padding"`.
    pub algorithm: String,
    /// Key size in bits.
    pub key_size_bits: u32,
    /// Cipher block size in bytes.
    pub block_size_bytes: u32,
    /// IV length in bytes.
    pub iv_length_bytes: u32,
    /// Length of the raw ciphertext in bytes.
    pub ciphertext_length: usize,
    /// Whether an integrity tag is present.
    pub integrity_tag_present: bool,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at_millis: i64,
    /// Creation time rendered as RFC 3339, when representable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// Output of `sealctl keygen`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResponse {
    /// Transformation string the key was generated for.
    pub algorithm: String,
    /// Key size in bits.
    pub key_size_bits: u32,
    /// Base64 (standard alphabet) encoded key bytes.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

/// Output of `sealctl exec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecResponse {
    /// Exit status of the child, `None` if terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Error body written to stderr on any failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"integrity"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
