//! Key generation, validation and derivation.
//!
//! A single raw key is never used directly. HKDF-SHA256 derives two
//! independent keys from it:
//!
//! - the **confidentiality key** (same length as the raw key) for the block
//!   cipher, and
//! - the **integrity key** ([`INTEGRITY_KEY_LEN`] bytes) for the HMAC tag.
//!
//! Derivation is deterministic, so decrypt re-derives exactly the keys encrypt
//! used.

use std::fmt;

use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::algorithm::AlgorithmSpec;
use crate::error::SealError;

/// Byte length of the derived HMAC-SHA256 key.
pub const INTEGRITY_KEY_LEN: usize = 32;

/// Domain-separation salt shared by both derivations.
const KDF_SALT: &[u8] = b"sealed/envelope-kdf/v1";

const CONFIDENTIALITY_LABEL: &[u8] = b"confidentiality";
const INTEGRITY_LABEL: &[u8] = b"integrity";

/// Symmetric key bytes, zeroed on drop.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<Vec<u8>>);

impl SecretKey {
    /// Copy `bytes` into a new key. No length check; see [`validate`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for SecretKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}

/// The two keys derived from one raw key.
#[derive(Debug)]
pub struct DerivedKeys {
    pub confidentiality: SecretKey,
    pub integrity: SecretKey,
}

impl DerivedKeys {
    /// Derive both keys from `raw_key`.
    pub fn derive(raw_key: &SecretKey) -> Result<Self, SealError> {
        Ok(Self {
            confidentiality: derive_confidentiality_key(raw_key)?,
            integrity: derive_integrity_key(raw_key)?,
        })
    }
}

/// Generate a fresh random key of exactly `spec.key_size_bits()` from the OS
/// CSPRNG.
///
/// # Errors
///
/// Returns [`SealError::Internal`] if the OS random source fails.
pub fn generate(spec: &AlgorithmSpec) -> Result<SecretKey, SealError> {
    let mut key = Zeroizing::new(vec![0u8; spec.key_len()]);
    fill_random(&mut key)?;
    Ok(SecretKey(key))
}

/// Check that `key` is exactly `spec.key_size_bits() / 8` bytes.
///
/// # Errors
///
/// Returns [`SealError::InvalidKeyLength`] on mismatch.
pub fn validate(key: &SecretKey, spec: &AlgorithmSpec) -> Result<(), SealError> {
    if key.len() != spec.key_len() {
        return Err(SealError::InvalidKeyLength {
            expected: spec.key_len(),
            got: key.len(),
        });
    }
    Ok(())
}

/// Derive the block-cipher key. Output length equals the raw key length.
///
/// Callers check the raw key with [`validate`] first.
pub fn derive_confidentiality_key(raw_key: &SecretKey) -> Result<SecretKey, SealError> {
    hkdf_expand(raw_key, CONFIDENTIALITY_LABEL, raw_key.len())
}

/// Derive the HMAC key ([`INTEGRITY_KEY_LEN`] bytes).
pub fn derive_integrity_key(raw_key: &SecretKey) -> Result<SecretKey, SealError> {
    hkdf_expand(raw_key, INTEGRITY_LABEL, INTEGRITY_KEY_LEN)
}

/// Fill `buf` from the OS CSPRNG.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), SealError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| SealError::Internal(format!("OS random source failed: {e}")))
}

fn hkdf_expand(raw_key: &SecretKey, label: &[u8], len: usize) -> Result<SecretKey, SealError> {
    let hk = Hkdf::<Sha256>::new(Some(KDF_SALT), raw_key.as_bytes());
    let mut okm = Zeroizing::new(vec![0u8; len]);
    hk.expand(label, &mut okm)
        .map_err(|e| SealError::Internal(format!("HKDF expand failed: {e}")))?;
    Ok(SecretKey(okm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AES_CBC_PKCS5;

    #[test]
    fn generate_matches_spec_length() {
        for bits in [128, 192, 256] {
            let spec = AlgorithmSpec::for_transformation(AES_CBC_PKCS5, bits).unwrap();
            let key = generate(&spec).unwrap();
            assert_eq!(key.len() * 8, bits as usize);
            assert!(validate(&key, &spec).is_ok());
        }
    }

    #[test]
    fn generated_keys_differ() {
        let spec = AlgorithmSpec::default();
        assert_ne!(
            generate(&spec).unwrap().as_bytes(),
            generate(&spec).unwrap().as_bytes()
        );
    }

    #[test]
    fn validate_rejects_wrong_length() {
        let spec = AlgorithmSpec::default();
        let err = validate(&SecretKey::from_bytes(&[0u8; 15]), &spec).unwrap_err();
        assert!(matches!(
            err,
            SealError::InvalidKeyLength {
                expected: 16,
                got: 15
            }
        ));
        assert!(validate(&SecretKey::from_bytes(&[0u8; 32]), &spec).is_err());
    }

    #[test]
    fn derivation_is_deterministic() {
        let raw = SecretKey::from_bytes(&[0x42; 16]);
        assert_eq!(
            derive_integrity_key(&raw).unwrap().as_bytes(),
            derive_integrity_key(&raw).unwrap().as_bytes()
        );
        assert_eq!(
            derive_confidentiality_key(&raw).unwrap().as_bytes(),
            derive_confidentiality_key(&raw).unwrap().as_bytes()
        );
    }

    #[test]
    fn derived_keys_are_separated() {
        let raw = SecretKey::from_bytes(&[0u8; 16]);
        let keys = DerivedKeys::derive(&raw).unwrap();
        assert_eq!(keys.confidentiality.len(), 16);
        assert_eq!(keys.integrity.len(), INTEGRITY_KEY_LEN);
        assert_ne!(keys.confidentiality.as_bytes(), raw.as_bytes());
        assert_ne!(&keys.integrity.as_bytes()[..16], keys.confidentiality.as_bytes());
    }

    #[test]
    fn different_raw_keys_give_different_derivations() {
        let a = derive_integrity_key(&SecretKey::from_bytes(&[1; 32])).unwrap();
        let b = derive_integrity_key(&SecretKey::from_bytes(&[2; 32])).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn secret_key_redacted_in_debug() {
        let key = SecretKey::from_bytes(&[0xFF; 16]);
        assert!(format!("{key:?}").contains("REDACTED"));
    }
}
