//! Portable binary encoding of [`Envelope`] values.
//!
//! # Current layout
//!
//! All integers are big-endian. A *field* is a `u32` length followed by that
//! many bytes.
//!
//! ```text
//! ┌─────────┬─────────────┬──────────┬────────────┬───────┬────────────┬─────────────┬───────────┐
//! │ Version │ Cipher name │ Key size │ Block size │  IV   │ Ciphertext │ Integrity   │ Timestamp │
//! │ 1 byte  │   field     │   u32    │    u32     │ field │   field    │ tag field   │    i64    │
//! └─────────┴─────────────┴──────────┴────────────┴───────┴────────────┴─────────────┴───────────┘
//! ```
//!
//! # Legacy layout
//!
//! Identical but without the integrity-tag field. It is either preceded by the
//! legacy marker byte or by no version byte at all. In the unversioned case
//! the stream opens with the cipher-name length, whose high byte is always
//! `0x00` because names are capped at [`MAX_CIPHER_NAME_LEN`].
//!
//! Legacy streams are decoded only. [`serialize`] refuses legacy envelopes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::{Buf, BufMut, BytesMut};

use crate::algorithm::{AlgorithmSpec, MAX_CIPHER_NAME_LEN};
use crate::envelope::{Envelope, FormatVersion};
use crate::error::SealError;

/// First byte of an unversioned legacy stream.
const UNVERSIONED_MARKER: u8 = 0x00;

/// Bytes taken by a field's length prefix.
const LEN_PREFIX: usize = 4;

/// Encode a current-format envelope.
///
/// # Errors
///
/// Returns [`SealError::UnsupportedOperation`] for a legacy envelope, and
/// [`SealError::InvalidEnvelope`] if a field is too large for a `u32` length.
pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>, SealError> {
    if envelope.format_version() != FormatVersion::Current {
        return Err(SealError::UnsupportedOperation(
            "legacy envelopes are decode-only and cannot be serialized",
        ));
    }
    let Some(tag) = envelope.integrity_tag() else {
        return Err(SealError::InvalidEnvelope(
            "current envelope is missing its integrity tag".into(),
        ));
    };
    let spec = envelope.spec();

    let mut out = BytesMut::with_capacity(serialized_len(envelope));
    out.put_u8(FormatVersion::CURRENT_MARKER);
    put_field(&mut out, spec.cipher_name().as_bytes())?;
    out.put_u32(spec.key_size_bits());
    out.put_u32(spec.block_size_bytes());
    put_field(&mut out, envelope.iv())?;
    put_field(&mut out, envelope.raw_ciphertext())?;
    put_field(&mut out, tag)?;
    out.put_i64(envelope.created_at_millis());
    Ok(out.to_vec())
}

/// Decode an envelope, selecting the layout from the version byte.
///
/// # Errors
///
/// - [`SealError::Malformed`] if the input is empty, any length prefix
///   overruns the buffer, trailing bytes remain, or the decoded fields violate
///   an envelope invariant.
/// - [`SealError::UnsupportedFormat`] for an unknown version byte.
pub fn deserialize(bytes: &[u8]) -> Result<Envelope, SealError> {
    let Some(&first) = bytes.first() else {
        return Err(SealError::malformed("empty input"));
    };

    match first {
        UNVERSIONED_MARKER => decode_legacy(FieldReader::new(bytes)),
        FormatVersion::LEGACY_MARKER => decode_legacy(FieldReader::new(&bytes[1..])),
        FormatVersion::CURRENT_MARKER => decode_current(FieldReader::new(&bytes[1..])),
        other => Err(SealError::UnsupportedFormat(other)),
    }
}

/// Encode as unpadded URL-safe base64 of the binary layout.
pub fn to_portable_string(envelope: &Envelope) -> Result<String, SealError> {
    Ok(URL_SAFE_NO_PAD.encode(serialize(envelope)?))
}

/// Decode the output of [`to_portable_string`].
///
/// # Errors
///
/// Returns [`SealError::Malformed`] for invalid base64, otherwise whatever
/// [`deserialize`] returns.
pub fn from_portable_string(s: &str) -> Result<Envelope, SealError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(s.trim())
        .map_err(|_| SealError::malformed("invalid base64"))?;
    deserialize(&bytes)
}

/// Exact encoded length of a current-format envelope.
pub fn serialized_len(envelope: &Envelope) -> usize {
    1 + LEN_PREFIX
        + envelope.spec().cipher_name().len()
        + 4
        + 4
        + LEN_PREFIX
        + envelope.iv().len()
        + LEN_PREFIX
        + envelope.raw_ciphertext().len()
        + LEN_PREFIX
        + envelope.integrity_tag().map_or(0, <[u8]>::len)
        + 8
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

fn put_field(out: &mut BytesMut, field: &[u8]) -> Result<(), SealError> {
    let len = u32::try_from(field.len())
        .map_err(|_| SealError::InvalidEnvelope("field exceeds u32 length".into()))?;
    out.put_u32(len);
    out.put_slice(field);
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Fields shared by both layouts, still borrowed from the input.
struct Body<'a> {
    cipher_name: &'a str,
    key_size_bits: u32,
    block_size_bytes: u32,
    iv: &'a [u8],
    ciphertext: &'a [u8],
}

fn decode_current(mut r: FieldReader<'_>) -> Result<Envelope, SealError> {
    let body = read_body(&mut r)?;
    let tag = r.read_field("integrity tag")?;
    let created_at_millis = r.read_i64("timestamp")?;
    r.finish()?;

    let spec = body_spec(&body)?;
    Envelope::current(
        spec,
        body.iv.to_vec(),
        body.ciphertext.to_vec(),
        tag.to_vec(),
        created_at_millis,
    )
    .map_err(into_malformed)
}

fn decode_legacy(mut r: FieldReader<'_>) -> Result<Envelope, SealError> {
    let body = read_body(&mut r)?;
    let created_at_millis = r.read_i64("timestamp")?;
    r.finish()?;

    let spec = body_spec(&body)?;
    Envelope::legacy(
        spec,
        body.iv.to_vec(),
        body.ciphertext.to_vec(),
        created_at_millis,
    )
    .map_err(into_malformed)
}

fn read_body<'a>(r: &mut FieldReader<'a>) -> Result<Body<'a>, SealError> {
    let name = r.read_field("cipher name")?;
    if name.len() > MAX_CIPHER_NAME_LEN {
        return Err(SealError::malformed("cipher name too long"));
    }
    let cipher_name =
        std::str::from_utf8(name).map_err(|_| SealError::malformed("cipher name is not UTF-8"))?;
    let key_size_bits = r.read_u32("key size")?;
    let block_size_bytes = r.read_u32("block size")?;
    let iv = r.read_field("IV")?;
    let ciphertext = r.read_field("ciphertext")?;
    Ok(Body {
        cipher_name,
        key_size_bits,
        block_size_bytes,
        iv,
        ciphertext,
    })
}

fn body_spec(body: &Body<'_>) -> Result<AlgorithmSpec, SealError> {
    AlgorithmSpec::with_iv_length(
        body.cipher_name,
        body.key_size_bits,
        body.block_size_bytes,
        body.iv.len(),
    )
    .map_err(into_malformed)
}

fn into_malformed(e: SealError) -> SealError {
    match e {
        SealError::InvalidAlgorithm(msg) | SealError::InvalidEnvelope(msg) => {
            SealError::Malformed(msg)
        }
        other => other,
    }
}

/// Bounds-checked cursor over untrusted input.
///
/// Every read checks the remaining length first; field lengths are compared
/// against the remaining input before anything is sliced or allocated.
struct FieldReader<'a> {
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn need(&self, n: usize, what: &str) -> Result<(), SealError> {
        if self.buf.remaining() < n {
            return Err(SealError::malformed(format!(
                "truncated {what}: need {n} bytes, {} remain",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    fn read_u32(&mut self, what: &str) -> Result<u32, SealError> {
        self.need(4, what)?;
        Ok(self.buf.get_u32())
    }

    fn read_i64(&mut self, what: &str) -> Result<i64, SealError> {
        self.need(8, what)?;
        Ok(self.buf.get_i64())
    }

    fn read_field(&mut self, what: &str) -> Result<&'a [u8], SealError> {
        let len = self.read_u32(what)? as usize;
        self.need(len, what)?;
        let (field, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(field)
    }

    fn finish(self) -> Result<(), SealError> {
        if self.buf.has_remaining() {
            return Err(SealError::malformed(format!(
                "{} trailing bytes after envelope",
                self.buf.remaining()
            )));
        }
        Ok(())
    }
}
