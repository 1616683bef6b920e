//! Raw symmetric primitives behind [`EnvelopeCipher`](super::EnvelopeCipher).
//!
//! **AES-CBC/PKCS#5** provides confidentiality only; the envelope's HMAC tag
//! supplies integrity. **AES-GCM-SIV** (RFC 8452) is additionally
//! authenticated on its own. Either way, every decryption failure (bad
//! padding, ragged length, AEAD rejection) surfaces as
//! [`SealError::Integrity`] so it is indistinguishable from a tag mismatch.
//!
//! Decrypted bytes are written straight into a [`SensitiveBytes`] buffer, so a
//! failed decryption wipes its partial output on drop.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm_siv::{
    aead::{Aead, AeadInPlace, KeyInit},
    Aes128GcmSiv, Aes256GcmSiv,
};
use cbc::cipher::{block_padding::Pkcs7, BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::algorithm::{AlgorithmSpec, Mode, GCM_SIV_NONCE_LEN};
use crate::error::SealError;
use crate::sensitive::SensitiveBytes;

/// Encrypt `plaintext` under `key` and `iv` with the transformation in `spec`.
pub(crate) fn encrypt(
    spec: &AlgorithmSpec,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, SealError> {
    match (spec.mode(), spec.key_size_bits()) {
        (Mode::Cbc, 128) => cbc_encrypt::<Aes128>(key, iv, plaintext),
        (Mode::Cbc, 192) => cbc_encrypt::<Aes192>(key, iv, plaintext),
        (Mode::Cbc, 256) => cbc_encrypt::<Aes256>(key, iv, plaintext),
        (Mode::GcmSiv, 128) => siv_encrypt::<Aes128GcmSiv>(key, iv, plaintext),
        (Mode::GcmSiv, 256) => siv_encrypt::<Aes256GcmSiv>(key, iv, plaintext),
        _ => Err(unsupported(spec)),
    }
}

/// Decrypt `ciphertext` under `key` and `iv` with the transformation in `spec`.
pub(crate) fn decrypt(
    spec: &AlgorithmSpec,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<SensitiveBytes, SealError> {
    match (spec.mode(), spec.key_size_bits()) {
        (Mode::Cbc, 128) => cbc_decrypt::<Aes128>(key, iv, ciphertext),
        (Mode::Cbc, 192) => cbc_decrypt::<Aes192>(key, iv, ciphertext),
        (Mode::Cbc, 256) => cbc_decrypt::<Aes256>(key, iv, ciphertext),
        (Mode::GcmSiv, 128) => siv_decrypt::<Aes128GcmSiv>(key, iv, ciphertext),
        (Mode::GcmSiv, 256) => siv_decrypt::<Aes256GcmSiv>(key, iv, ciphertext),
        _ => Err(unsupported(spec)),
    }
}

fn unsupported(spec: &AlgorithmSpec) -> SealError {
    SealError::InvalidAlgorithm(format!("no engine for {spec}"))
}

fn bad_key() -> SealError {
    SealError::Internal("derived key or IV has the wrong length for the cipher".into())
}

// ---------------------------------------------------------------------------
// AES-CBC with PKCS#5 padding
// ---------------------------------------------------------------------------

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SealError>
where
    C: BlockCipher + BlockEncryptMut + cbc::cipher::KeyInit,
{
    let enc = cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(|_| bad_key())?;
    Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<SensitiveBytes, SealError>
where
    C: BlockCipher + BlockDecryptMut + cbc::cipher::KeyInit,
{
    let dec = cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(|_| bad_key())?;
    let mut out = SensitiveBytes::from(ciphertext);
    let buf = out.buffer_mut()?;
    let len = dec
        .decrypt_padded_mut::<Pkcs7>(buf)
        .map_err(|_| SealError::Integrity)?
        .len();
    buf.truncate(len);
    Ok(out)
}

// ---------------------------------------------------------------------------
// AES-GCM-SIV
// ---------------------------------------------------------------------------

fn siv_encrypt<A>(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SealError>
where
    A: AeadInPlace + KeyInit,
{
    if nonce.len() != GCM_SIV_NONCE_LEN as usize {
        return Err(bad_key());
    }
    let cipher = A::new_from_slice(key).map_err(|_| bad_key())?;
    cipher
        .encrypt(aes_gcm_siv::aead::Nonce::<A>::from_slice(nonce), plaintext)
        .map_err(|_| SealError::Internal("aead operation failed".into()))
}

fn siv_decrypt<A>(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<SensitiveBytes, SealError>
where
    A: AeadInPlace + KeyInit,
{
    if nonce.len() != GCM_SIV_NONCE_LEN as usize {
        return Err(SealError::Integrity);
    }
    let cipher = A::new_from_slice(key).map_err(|_| bad_key())?;
    let mut out = SensitiveBytes::from(ciphertext);
    cipher
        .decrypt_in_place(
            aes_gcm_siv::aead::Nonce::<A>::from_slice(nonce),
            b"",
            out.buffer_mut()?,
        )
        .map_err(|_| SealError::Integrity)?;
    Ok(out)
}
