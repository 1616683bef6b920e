//! Cipher settings as they arrive from configuration sources.
//!
//! [`CipherConfig`] is plain data with serde defaults so it can be embedded in
//! a larger configuration tree; [`CipherConfig::validate`] turns it into an
//! [`AlgorithmSpec`].

use std::time::Duration;

use serde::Deserialize;

use crate::algorithm::{AlgorithmSpec, AES_CBC_PKCS5};
use crate::cipher::ExpiryPolicy;
use crate::error::SealError;

/// Unvalidated cipher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CipherConfig {
    /// Transformation string, e.g. `"AES/CBC/PKCS5Padding"`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Key size in bits.
    #[serde(default = "default_key_size_bits")]
    pub key_size_bits: u32,

    /// Maximum envelope age in seconds. Unset disables expiry.
    #[serde(default)]
    pub max_envelope_age_secs: Option<u64>,

    /// Apply the maximum age to legacy envelopes as well.
    #[serde(default = "default_enforce_expiry_on_legacy")]
    pub enforce_expiry_on_legacy: bool,
}

fn default_algorithm() -> String {
    AES_CBC_PKCS5.into()
}
fn default_key_size_bits() -> u32 {
    128
}
fn default_enforce_expiry_on_legacy() -> bool {
    true
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            key_size_bits: default_key_size_bits(),
            max_envelope_age_secs: None,
            enforce_expiry_on_legacy: default_enforce_expiry_on_legacy(),
        }
    }
}

impl CipherConfig {
    /// Validate all fields and build the algorithm descriptor.
    ///
    /// # Errors
    ///
    /// - [`SealError::InvalidAlgorithm`] for an unsupported algorithm/key size.
    /// - [`SealError::InvalidConfig`] if `max_envelope_age_secs` is zero.
    pub fn validate(&self) -> Result<AlgorithmSpec, SealError> {
        if self.max_envelope_age_secs == Some(0) {
            return Err(SealError::InvalidConfig(
                "max_envelope_age_secs must be > 0 when set".into(),
            ));
        }
        AlgorithmSpec::for_transformation(self.algorithm.trim(), self.key_size_bits)
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            max_age: self.max_envelope_age_secs.map(Duration::from_secs),
            enforce_on_legacy: self.enforce_expiry_on_legacy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{Mode, AES_GCM_SIV};
    use common::ErrorKind;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_algorithm(), "AES/CBC/PKCS5Padding");
        assert_eq!(default_key_size_bits(), 128);
        assert!(default_enforce_expiry_on_legacy());

        let spec = CipherConfig::default().validate().unwrap();
        assert_eq!(spec, AlgorithmSpec::default());
        assert_eq!(CipherConfig::default().expiry_policy(), ExpiryPolicy::default());
    }

    #[test]
    fn gcm_siv_config() {
        let cfg = CipherConfig {
            algorithm: AES_GCM_SIV.into(),
            key_size_bits: 256,
            ..CipherConfig::default()
        };
        assert_eq!(cfg.validate().unwrap().mode(), Mode::GcmSiv);
    }

    #[test]
    fn validate_rejects_unknown_algorithm() {
        let cfg = CipherConfig {
            algorithm: "DES/ECB/NoPadding".into(),
            ..CipherConfig::default()
        };
        assert_eq!(cfg.validate().unwrap_err().kind(), ErrorKind::Construction);
    }

    #[test]
    fn validate_rejects_bad_key_size() {
        let cfg = CipherConfig {
            key_size_bits: 100,
            ..CipherConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_age() {
        let cfg = CipherConfig {
            max_envelope_age_secs: Some(0),
            ..CipherConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SealError::InvalidConfig(_))));
    }

    #[test]
    fn expiry_policy_from_fields() {
        let cfg = CipherConfig {
            max_envelope_age_secs: Some(90),
            enforce_expiry_on_legacy: false,
            ..CipherConfig::default()
        };
        let policy = cfg.expiry_policy();
        assert_eq!(policy.max_age, Some(Duration::from_secs(90)));
        assert!(!policy.enforce_on_legacy);
    }
}
