//! Configuration loading and validation for `sealctl`.
//!
//! All values are read from `SEAL_*` environment variables. List values
//! (`SEAL_ALLOWED_EXECUTABLES`) are comma-separated.

use std::fmt;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use executor::ExecutorConfig;
use sealed::{CipherConfig, SecretKey};
use serde::Deserialize;

const ENV_PREFIX: &str = "SEAL";

/// Validated `sealctl` configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Transformation string, e.g. `"AES/CBC/PKCS5Padding"`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    #[serde(default = "default_key_size_bits")]
    pub key_size_bits: u32,

    /// Reject envelopes older than this many seconds. Unset disables expiry.
    #[serde(default)]
    pub max_envelope_age_secs: Option<u64>,

    #[serde(default = "default_enforce_expiry_on_legacy")]
    pub enforce_expiry_on_legacy: bool,

    /// Base64 (standard alphabet) master key for `encrypt` / `decrypt`.
    #[serde(default)]
    pub key: Option<String>,

    /// Executables `exec` may run.
    #[serde(default)]
    pub allowed_executables: Vec<String>,

    /// `"unix"` or `"windows"`; defaults to the build platform.
    #[serde(default)]
    pub os_codec: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_algorithm() -> String {
    CipherConfig::default().algorithm
}
fn default_key_size_bits() -> u32 {
    CipherConfig::default().key_size_bits
}
fn default_enforce_expiry_on_legacy() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from `SEAL_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                env.try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_executables"),
            )
            .build()
            .context("failed to build sealctl configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise sealctl configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        self.cipher_config()
            .validate()
            .context("SEAL_ALGORITHM / SEAL_KEY_SIZE_BITS / SEAL_MAX_ENVELOPE_AGE_SECS")?;
        self.executor_config()
            .validate()
            .context("SEAL_ALLOWED_EXECUTABLES / SEAL_OS_CODEC")?;
        if let Some(key) = &self.key {
            if key.trim().is_empty() {
                anyhow::bail!("SEAL_KEY must not be empty when set");
            }
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("SEAL_LOG_LEVEL must not be empty");
        }
        Ok(())
    }

    pub fn cipher_config(&self) -> CipherConfig {
        CipherConfig {
            algorithm: self.algorithm.clone(),
            key_size_bits: self.key_size_bits,
            max_envelope_age_secs: self.max_envelope_age_secs,
            enforce_expiry_on_legacy: self.enforce_expiry_on_legacy,
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            allowed_executables: self.allowed_executables.clone(),
            os_codec: self.os_codec.clone(),
        }
    }

    /// Decode `SEAL_KEY`, if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not valid base64.
    pub fn master_key(&self) -> Result<Option<SecretKey>> {
        self.key
            .as_deref()
            .map(|k| {
                STANDARD
                    .decode(k.trim())
                    .map(SecretKey::from)
                    .context("SEAL_KEY is not valid base64")
            })
            .transpose()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("algorithm", &self.algorithm)
            .field("key_size_bits", &self.key_size_bits)
            .field("max_envelope_age_secs", &self.max_envelope_age_secs)
            .field("enforce_expiry_on_legacy", &self.enforce_expiry_on_legacy)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("allowed_executables", &self.allowed_executables)
            .field("os_codec", &self.os_codec)
            .field("log_level", &self.log_level)
            .finish()
    }
}
