//! [`AlgorithmSpec`]: immutable descriptor of the symmetric transformation.
//!
//! The cipher name is a `CIPHER/MODE/PADDING` transformation string. Supported
//! combinations:
//!
//! | Transformation          | Key sizes (bits) | Block | IV |
//! |-------------------------|------------------|-------|----|
//! | `AES/CBC/PKCS5Padding`  | 128, 192, 256    | 16    | 16 |
//! | `AES/GCM-SIV/NoPadding` | 128, 256         | 16    | 12 |

use std::fmt;

use crate::error::SealError;

/// Transformation string for AES in CBC mode with PKCS#5 padding.
pub const AES_CBC_PKCS5: &str = "AES/CBC/PKCS5Padding";

/// Transformation string for AES-GCM-SIV (RFC 8452).
pub const AES_GCM_SIV: &str = "AES/GCM-SIV/NoPadding";

/// AES block length in bytes.
pub const AES_BLOCK_LEN: u32 = 16;

/// AES-GCM-SIV nonce length in bytes.
pub const GCM_SIV_NONCE_LEN: u32 = 12;

/// Upper bound on the encoded cipher name length.
pub const MAX_CIPHER_NAME_LEN: usize = 255;

/// Block cipher mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Cbc,
    GcmSiv,
}

/// Padding scheme applied before encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Padding {
    Pkcs5,
    NoPadding,
}

/// Immutable descriptor of a symmetric transformation.
///
/// Constructed only through validating constructors; every value satisfies
/// `iv_length_bytes == block_size_bytes` for CBC.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlgorithmSpec {
    cipher_name: String,
    mode: Mode,
    padding: Padding,
    key_size_bits: u32,
    block_size_bytes: u32,
    iv_length_bytes: u32,
}

impl AlgorithmSpec {
    /// Build a descriptor from a transformation string, key size and block size.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidAlgorithm`] if the key size is zero or not a
    /// multiple of 8, the block size is zero or does not match the cipher, or
    /// the transformation/key-size combination is unsupported.
    pub fn new(
        cipher_name: &str,
        key_size_bits: u32,
        block_size_bytes: u32,
    ) -> Result<Self, SealError> {
        if key_size_bits == 0 || key_size_bits % 8 != 0 {
            return Err(SealError::InvalidAlgorithm(format!(
                "key size must be a non-zero multiple of 8 bits, got {key_size_bits}"
            )));
        }
        if block_size_bytes == 0 {
            return Err(SealError::InvalidAlgorithm(
                "block size must be non-zero".into(),
            ));
        }
        if cipher_name.is_empty() || cipher_name.len() > MAX_CIPHER_NAME_LEN {
            return Err(SealError::InvalidAlgorithm(format!(
                "cipher name must be 1..={MAX_CIPHER_NAME_LEN} bytes"
            )));
        }

        let (mode, padding) = parse_transformation(cipher_name)?;
        if block_size_bytes != AES_BLOCK_LEN {
            return Err(SealError::InvalidAlgorithm(format!(
                "AES block size is {AES_BLOCK_LEN} bytes, got {block_size_bytes}"
            )));
        }

        let key_ok = match mode {
            Mode::Cbc => matches!(key_size_bits, 128 | 192 | 256),
            Mode::GcmSiv => matches!(key_size_bits, 128 | 256),
        };
        if !key_ok {
            return Err(SealError::InvalidAlgorithm(format!(
                "unsupported key size {key_size_bits} for {cipher_name}"
            )));
        }

        let iv_length_bytes = match mode {
            Mode::Cbc => block_size_bytes,
            Mode::GcmSiv => GCM_SIV_NONCE_LEN,
        };

        Ok(Self {
            cipher_name: canonical_name(mode).to_owned(),
            mode,
            padding,
            key_size_bits,
            block_size_bytes,
            iv_length_bytes,
        })
    }

    /// Build a descriptor using the cipher's native block size.
    pub fn for_transformation(cipher_name: &str, key_size_bits: u32) -> Result<Self, SealError> {
        Self::new(cipher_name, key_size_bits, AES_BLOCK_LEN)
    }

    /// Build a descriptor and check it against an observed IV length.
    ///
    /// Used when decoding, where the IV length comes from the wire.
    pub(crate) fn with_iv_length(
        cipher_name: &str,
        key_size_bits: u32,
        block_size_bytes: u32,
        iv_length_bytes: usize,
    ) -> Result<Self, SealError> {
        let spec = Self::new(cipher_name, key_size_bits, block_size_bytes)?;
        if spec.iv_length_bytes as usize != iv_length_bytes {
            return Err(SealError::InvalidAlgorithm(format!(
                "{} requires a {}-byte IV, got {iv_length_bytes}",
                spec.cipher_name, spec.iv_length_bytes
            )));
        }
        Ok(spec)
    }

    pub fn cipher_name(&self) -> &str {
        &self.cipher_name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn key_size_bits(&self) -> u32 {
        self.key_size_bits
    }

    /// Key length in bytes (`key_size_bits / 8`).
    pub fn key_len(&self) -> usize {
        (self.key_size_bits / 8) as usize
    }

    pub fn block_size_bytes(&self) -> u32 {
        self.block_size_bytes
    }

    pub fn iv_length_bytes(&self) -> u32 {
        self.iv_length_bytes
    }
}

impl Default for AlgorithmSpec {
    /// `AES/CBC/PKCS5Padding` with a 128-bit key.
    fn default() -> Self {
        Self {
            cipher_name: AES_CBC_PKCS5.to_owned(),
            mode: Mode::Cbc,
            padding: Padding::Pkcs5,
            key_size_bits: 128,
            block_size_bytes: AES_BLOCK_LEN,
            iv_length_bytes: AES_BLOCK_LEN,
        }
    }
}

impl fmt::Display for AlgorithmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}-bit key)", self.cipher_name, self.key_size_bits)
    }
}

fn parse_transformation(name: &str) -> Result<(Mode, Padding), SealError> {
    let unsupported = || SealError::InvalidAlgorithm(format!("unsupported transformation: {name}"));

    let mut parts = name.split('/');
    let (Some(cipher), Some(mode), Some(padding), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(unsupported());
    };

    if !cipher.eq_ignore_ascii_case("AES") {
        return Err(unsupported());
    }
    let mode = if mode.eq_ignore_ascii_case("CBC") {
        Mode::Cbc
    } else if mode.eq_ignore_ascii_case("GCM-SIV") {
        Mode::GcmSiv
    } else {
        return Err(unsupported());
    };
    let padding = if padding.eq_ignore_ascii_case("PKCS5Padding") {
        Padding::Pkcs5
    } else if padding.eq_ignore_ascii_case("NoPadding") {
        Padding::NoPadding
    } else {
        return Err(unsupported());
    };

    match (mode, padding) {
        (Mode::Cbc, Padding::Pkcs5) | (Mode::GcmSiv, Padding::NoPadding) => Ok((mode, padding)),
        _ => Err(unsupported()),
    }
}

fn canonical_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Cbc => AES_CBC_PKCS5,
        Mode::GcmSiv => AES_GCM_SIV,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbc_iv_matches_block_size() {
        let spec = AlgorithmSpec::new(AES_CBC_PKCS5, 256, 16).unwrap();
        assert_eq!(spec.iv_length_bytes(), spec.block_size_bytes());
        assert_eq!(spec.key_len(), 32);
        assert_eq!(spec.mode(), Mode::Cbc);
        assert_eq!(spec.padding(), Padding::Pkcs5);
    }

    #[test]
    fn gcm_siv_uses_twelve_byte_nonce() {
        let spec = AlgorithmSpec::for_transformation(AES_GCM_SIV, 128).unwrap();
        assert_eq!(spec.iv_length_bytes(), GCM_SIV_NONCE_LEN);
        assert_eq!(spec.block_size_bytes(), AES_BLOCK_LEN);
    }

    #[test]
    fn rejects_key_size_not_multiple_of_eight() {
        assert!(AlgorithmSpec::new(AES_CBC_PKCS5, 129, 16).is_err());
        assert!(AlgorithmSpec::new(AES_CBC_PKCS5, 0, 16).is_err());
    }

    #[test]
    fn rejects_zero_block_size() {
        let err = AlgorithmSpec::new(AES_CBC_PKCS5, 128, 0).unwrap_err();
        assert!(err.to_string().contains("block size"));
    }

    #[test]
    fn rejects_wrong_block_size() {
        assert!(AlgorithmSpec::new(AES_CBC_PKCS5, 128, 8).is_err());
    }

    #[test]
    fn rejects_unsupported_key_sizes() {
        assert!(AlgorithmSpec::for_transformation(AES_CBC_PKCS5, 64).is_err());
        assert!(AlgorithmSpec::for_transformation(AES_GCM_SIV, 192).is_err());
    }

    #[test]
    fn rejects_unknown_transformations() {
        for name in [
            "DES/CBC/PKCS5Padding",
            "AES/ECB/PKCS5Padding",
            "AES/CBC/NoPadding",
            "AES/GCM-SIV/PKCS5Padding",
            "AES/CBC",
            "AES/CBC/PKCS5Padding/extra",
            "",
        ] {
            assert!(
                AlgorithmSpec::for_transformation(name, 128).is_err(),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn name_is_canonicalised() {
        let spec = AlgorithmSpec::for_transformation("aes/cbc/pkcs5padding", 128).unwrap();
        assert_eq!(spec.cipher_name(), AES_CBC_PKCS5);
        assert_eq!(spec, AlgorithmSpec::default());
    }

    #[test]
    fn with_iv_length_checks_observed_iv() {
        assert!(AlgorithmSpec::with_iv_length(AES_CBC_PKCS5, 128, 16, 16).is_ok());
        assert!(AlgorithmSpec::with_iv_length(AES_CBC_PKCS5, 128, 16, 12).is_err());
        assert!(AlgorithmSpec::with_iv_length(AES_GCM_SIV, 256, 16, 12).is_ok());
    }

    #[test]
    fn display_mentions_key_size() {
        assert_eq!(
            AlgorithmSpec::default().to_string(),
            "AES/CBC/PKCS5Padding (128-bit key)"
        );
    }
}
