//! [`EnvelopeCipher`]: encrypt plaintext into authenticated [`Envelope`]s and
//! back.
//!
//! # Encrypt
//!
//! 1. Draw a fresh IV from the OS CSPRNG (never caller-supplied).
//! 2. Encrypt under the derived confidentiality key.
//! 3. Tag `IV || ciphertext` with HMAC-SHA256 under the derived integrity key.
//! 4. Stamp the creation time and tag the envelope [`FormatVersion::Current`].
//!
//! # Decrypt
//!
//! 1. Check the raw key length against the envelope's algorithm.
//! 2. Verify the tag in constant time, or take the explicit legacy path.
//! 3. Enforce the expiry policy.
//! 4. Decrypt into a [`SensitiveBytes`].
//!
//! The plaintext passed to `encrypt` is only borrowed; the caller keeps
//! ownership and remains responsible for wiping it. Derived keys are zeroed
//! when they go out of scope on every return path.

mod engine;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::algorithm::AlgorithmSpec;
use crate::clock::{Clock, SystemClock};
use crate::config::CipherConfig;
use crate::envelope::{Envelope, FormatVersion};
use crate::error::SealError;
use crate::keys::{self, DerivedKeys, SecretKey};
use crate::sensitive::SensitiveBytes;

type HmacSha256 = Hmac<Sha256>;

/// Maximum-age policy applied on decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Reject envelopes older than this. `None` disables the check.
    pub max_age: Option<Duration>,
    /// Whether the check also applies to legacy envelopes.
    pub enforce_on_legacy: bool,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            max_age: None,
            enforce_on_legacy: true,
        }
    }
}

/// Produces and consumes [`Envelope`] values for one algorithm.
///
/// Holds no mutable state; share freely across threads.
#[derive(Clone)]
pub struct EnvelopeCipher {
    spec: AlgorithmSpec,
    expiry: ExpiryPolicy,
    clock: Arc<dyn Clock>,
    master_key: Option<SecretKey>,
}

impl EnvelopeCipher {
    /// Create a cipher for `spec` with no expiry policy and the system clock.
    pub fn new(spec: AlgorithmSpec) -> Self {
        Self {
            spec,
            expiry: ExpiryPolicy::default(),
            clock: Arc::new(SystemClock),
            master_key: None,
        }
    }

    /// Create a cipher from validated configuration.
    pub fn from_config(cfg: &CipherConfig) -> Result<Self, SealError> {
        let spec = cfg.validate()?;
        Ok(Self::new(spec).with_expiry(cfg.expiry_policy()))
    }

    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach a master key used by [`seal`](Self::seal) and [`open`](Self::open).
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidKeyLength`] if the key does not fit the algorithm.
    pub fn with_master_key(mut self, key: SecretKey) -> Result<Self, SealError> {
        keys::validate(&key, &self.spec)?;
        self.master_key = Some(key);
        Ok(self)
    }

    pub fn spec(&self) -> &AlgorithmSpec {
        &self.spec
    }

    pub fn expiry(&self) -> ExpiryPolicy {
        self.expiry
    }

    /// Generate a random key sized for this cipher's algorithm.
    pub fn generate_key(&self) -> Result<SecretKey, SealError> {
        keys::generate(&self.spec)
    }

    /// Encrypt `plaintext` under `key` into a current-format envelope.
    ///
    /// # Errors
    ///
    /// - [`SealError::InvalidKeyLength`] if `key` does not fit the algorithm.
    /// - [`SealError::Wiped`] if `plaintext` was already wiped.
    /// - [`SealError::Internal`] if the random source or a primitive fails.
    pub fn encrypt(&self, key: &SecretKey, plaintext: &SensitiveBytes) -> Result<Envelope, SealError> {
        keys::validate(key, &self.spec)?;
        let data = plaintext.as_bytes()?;
        let derived = DerivedKeys::derive(key)?;

        let mut iv = vec![0u8; self.spec.iv_length_bytes() as usize];
        keys::fill_random(&mut iv)?;

        let raw_ciphertext =
            engine::encrypt(&self.spec, derived.confidentiality.as_bytes(), &iv, data)?;
        let tag = compute_tag(&derived.integrity, &iv, &raw_ciphertext)?;

        let envelope = Envelope::current(
            self.spec.clone(),
            iv,
            raw_ciphertext,
            tag,
            self.clock.now_millis(),
        )?;
        debug!(
            algorithm = %self.spec.cipher_name(),
            key_size_bits = self.spec.key_size_bits(),
            ciphertext_len = envelope.raw_ciphertext().len(),
            "envelope sealed"
        );
        Ok(envelope)
    }

    /// Authenticate and decrypt `envelope` under `key`.
    ///
    /// The envelope's own algorithm descriptor selects the transformation.
    ///
    /// # Errors
    ///
    /// - [`SealError::InvalidKeyLength`] if `key` does not fit the envelope's
    ///   algorithm.
    /// - [`SealError::Integrity`] if the tag does not verify or the cipher
    ///   rejects the ciphertext. No plaintext is returned.
    /// - [`SealError::Expired`] if the envelope is older than the policy allows.
    ///   Checked only after the tag has verified.
    pub fn decrypt(&self, key: &SecretKey, envelope: &Envelope) -> Result<SensitiveBytes, SealError> {
        let spec = envelope.spec();
        keys::validate(key, spec)?;
        let derived = DerivedKeys::derive(key)?;

        match envelope.format_version() {
            FormatVersion::Current => verify_current(&derived, envelope)?,
            FormatVersion::Legacy => accept_legacy_unauthenticated(envelope),
        }

        self.check_expiry(envelope)?;

        let plaintext = engine::decrypt(
            spec,
            derived.confidentiality.as_bytes(),
            envelope.iv(),
            envelope.raw_ciphertext(),
        )?;
        debug!(
            algorithm = %spec.cipher_name(),
            format_version = envelope.format_version().as_str(),
            "envelope opened"
        );
        Ok(plaintext)
    }

    /// [`encrypt`](Self::encrypt) under the configured master key.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::UnsupportedOperation`] if no master key is set.
    pub fn seal(&self, plaintext: &SensitiveBytes) -> Result<Envelope, SealError> {
        self.encrypt(self.master()?, plaintext)
    }

    /// [`decrypt`](Self::decrypt) under the configured master key.
    pub fn open(&self, envelope: &Envelope) -> Result<SensitiveBytes, SealError> {
        self.decrypt(self.master()?, envelope)
    }

    fn master(&self) -> Result<&SecretKey, SealError> {
        self.master_key
            .as_ref()
            .ok_or(SealError::UnsupportedOperation("no master key configured"))
    }

    fn check_expiry(&self, envelope: &Envelope) -> Result<(), SealError> {
        let Some(max_age) = self.expiry.max_age else {
            return Ok(());
        };
        if envelope.format_version() == FormatVersion::Legacy && !self.expiry.enforce_on_legacy {
            return Ok(());
        }

        let now = self.clock.now_millis();
        // Future-dated envelopes count as age zero.
        let age_millis = now.saturating_sub(envelope.created_at_millis()).max(0) as u64;
        let max_age_millis = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
        if age_millis > max_age_millis {
            return Err(SealError::Expired {
                age_millis,
                max_age_millis,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCipher")
            .field("spec", &self.spec)
            .field("expiry", &self.expiry)
            .field("master_key", &self.master_key)
            .finish_non_exhaustive()
    }
}

/// Verify the tag of a current-format envelope.
fn verify_current(derived: &DerivedKeys, envelope: &Envelope) -> Result<(), SealError> {
    let tag = envelope.integrity_tag().ok_or(SealError::Integrity)?;
    let mac = tag_mac(&derived.integrity, envelope.iv(), envelope.raw_ciphertext())?;
    // `verify_slice` compares in constant time. The tag length is fixed by the
    // envelope invariant, so the length check it performs reveals nothing.
    mac.verify_slice(tag).map_err(|_| SealError::Integrity)
}

/// LEGACY PATH: NO INTEGRITY CHECK.
///
/// The legacy wire format predates the integrity tag, so there is nothing to
/// verify and the ciphertext is trusted as-is. This is reachable only for
/// envelopes decoded from legacy streams; `encrypt` never produces them and
/// the codec refuses to re-encode them. Callers that must not accept
/// unauthenticated input should reject [`FormatVersion::Legacy`] before
/// calling `decrypt`.
fn accept_legacy_unauthenticated(envelope: &Envelope) {
    warn!(
        algorithm = %envelope.spec().cipher_name(),
        "decrypting legacy envelope without integrity verification"
    );
}

/// HMAC-SHA256 over `iv || ciphertext`.
fn compute_tag(integrity_key: &SecretKey, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, SealError> {
    Ok(tag_mac(integrity_key, iv, ciphertext)?
        .finalize()
        .into_bytes()
        .to_vec())
}

fn tag_mac(integrity_key: &SecretKey, iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha256, SealError> {
    let mut mac = HmacSha256::new_from_slice(integrity_key.as_bytes())
        .map_err(|_| SealError::Internal("invalid HMAC key".into()))?;
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac)
}
