//! Authenticated, versioned ciphertext envelopes.
//!
//! An [`Envelope`] bundles an [`AlgorithmSpec`], a fresh IV, the raw
//! ciphertext, an HMAC-SHA256 integrity tag over `IV || ciphertext` and a
//! creation timestamp. [`codec`] turns envelopes into a self-describing,
//! big-endian byte layout that stays readable across format revisions.
//!
//! ```text
//! caller ─► EnvelopeCipher::encrypt ─► Envelope ─► codec::serialize ─► bytes
//! bytes  ─► codec::deserialize ─► Envelope ─► EnvelopeCipher::decrypt ─► SensitiveBytes
//! ```
//!
//! # Security invariants
//!
//! - An IV is generated from the OS CSPRNG on every encrypt call and is never
//!   caller-supplied.
//! - Confidentiality and integrity keys are derived separately from the raw key
//!   via HKDF-SHA256; the raw key is never used directly.
//! - Tag comparison is constant-time, and padding/AEAD failures are reported as
//!   the same [`SealError::Integrity`] as a tag mismatch.
//! - Nothing in this crate logs key material, plaintext, IVs or tags.

pub mod algorithm;
pub mod cipher;
pub mod clock;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod sensitive;

pub use algorithm::AlgorithmSpec;
pub use cipher::{EnvelopeCipher, ExpiryPolicy};
pub use clock::{Clock, SystemClock};
pub use config::CipherConfig;
pub use envelope::{Envelope, FormatVersion};
pub use error::SealError;
pub use keys::SecretKey;
pub use sensitive::SensitiveBytes;
