//! [`Envelope`]: algorithm descriptor + IV + ciphertext + integrity tag +
//! creation timestamp, tagged with the wire format it belongs to.
//!
//! Envelopes are immutable once constructed. The two constructors enforce the
//! per-format invariants:
//!
//! - [`FormatVersion::Current`]: the integrity tag is present and exactly
//!   [`TAG_LEN`] bytes.
//! - [`FormatVersion::Legacy`]: no integrity tag. Only produced by decoding old
//!   streams, never by [`EnvelopeCipher::encrypt`](crate::EnvelopeCipher::encrypt).

use chrono::DateTime;
use common::protocol::EnvelopeReport;

use crate::algorithm::AlgorithmSpec;
use crate::error::SealError;

/// Byte length of the HMAC-SHA256 integrity tag.
pub const TAG_LEN: usize = 32;

/// Wire format an envelope was produced by or decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Pre-tag layout. Decrypt-only.
    Legacy,
    /// Layout carrying a separate integrity tag.
    Current,
}

impl FormatVersion {
    /// Version byte marking an explicitly-versioned legacy stream.
    pub const LEGACY_MARKER: u8 = 0x01;

    /// Version byte marking a current stream.
    pub const CURRENT_MARKER: u8 = 0x02;

    /// The version byte written for this format.
    pub fn marker(self) -> u8 {
        match self {
            FormatVersion::Legacy => Self::LEGACY_MARKER,
            FormatVersion::Current => Self::CURRENT_MARKER,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormatVersion::Legacy => "legacy",
            FormatVersion::Current => "current",
        }
    }
}

/// An encrypted value together with everything needed to authenticate and
/// decrypt it, given the key.
///
/// Equality is field-by-field, byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    spec: AlgorithmSpec,
    iv: Vec<u8>,
    raw_ciphertext: Vec<u8>,
    integrity_tag: Option<Vec<u8>>,
    created_at_millis: i64,
    format_version: FormatVersion,
}

impl Envelope {
    /// Build a current-format envelope.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidEnvelope`] if the IV length does not match
    /// the algorithm, the ciphertext is empty, or the tag is not [`TAG_LEN`] bytes.
    pub fn current(
        spec: AlgorithmSpec,
        iv: Vec<u8>,
        raw_ciphertext: Vec<u8>,
        integrity_tag: Vec<u8>,
        created_at_millis: i64,
    ) -> Result<Self, SealError> {
        check_body(&spec, &iv, &raw_ciphertext)?;
        if integrity_tag.len() != TAG_LEN {
            return Err(SealError::InvalidEnvelope(format!(
                "integrity tag must be {TAG_LEN} bytes, got {}",
                integrity_tag.len()
            )));
        }
        Ok(Self {
            spec,
            iv,
            raw_ciphertext,
            integrity_tag: Some(integrity_tag),
            created_at_millis,
            format_version: FormatVersion::Current,
        })
    }

    /// Build a legacy-format envelope (no integrity tag).
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidEnvelope`] if the IV length does not match
    /// the algorithm or the ciphertext is empty.
    pub fn legacy(
        spec: AlgorithmSpec,
        iv: Vec<u8>,
        raw_ciphertext: Vec<u8>,
        created_at_millis: i64,
    ) -> Result<Self, SealError> {
        check_body(&spec, &iv, &raw_ciphertext)?;
        Ok(Self {
            spec,
            iv,
            raw_ciphertext,
            integrity_tag: None,
            created_at_millis,
            format_version: FormatVersion::Legacy,
        })
    }

    pub fn spec(&self) -> &AlgorithmSpec {
        &self.spec
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn raw_ciphertext(&self) -> &[u8] {
        &self.raw_ciphertext
    }

    pub fn integrity_tag(&self) -> Option<&[u8]> {
        self.integrity_tag.as_deref()
    }

    pub fn created_at_millis(&self) -> i64 {
        self.created_at_millis
    }

    pub fn format_version(&self) -> FormatVersion {
        self.format_version
    }

    /// Describe this envelope without exposing IV, ciphertext or tag bytes.
    pub fn report(&self) -> EnvelopeReport {
        EnvelopeReport {
            format_version: self.format_version.as_str().to_owned(),
            algorithm: self.spec.cipher_name().to_owned(),
            key_size_bits: self.spec.key_size_bits(),
            block_size_bytes: self.spec.block_size_bytes(),
            iv_length_bytes: self.spec.iv_length_bytes(),
            ciphertext_length: self.raw_ciphertext.len(),
            integrity_tag_present: self.integrity_tag.is_some(),
            created_at_millis: self.created_at_millis,
            created_at: DateTime::from_timestamp_millis(self.created_at_millis)
                .map(|t| t.to_rfc3339()),
        }
    }
}

fn check_body(spec: &AlgorithmSpec, iv: &[u8], raw_ciphertext: &[u8]) -> Result<(), SealError> {
    if iv.len() != spec.iv_length_bytes() as usize {
        return Err(SealError::InvalidEnvelope(format!(
            "IV must be {} bytes, got {}",
            spec.iv_length_bytes(),
            iv.len()
        )));
    }
    if raw_ciphertext.is_empty() {
        return Err(SealError::InvalidEnvelope(
            "ciphertext must not be empty".into(),
        ));
    }
    Ok(())
}
