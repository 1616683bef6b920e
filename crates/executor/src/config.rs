//! Executor configuration: the executable allow-list.

use std::path::Path;

use serde::Deserialize;

use crate::encoder::OsCodec;
use crate::error::ExecError;

/// Allow-list and escaping settings for [`Gate`](crate::Gate).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecutorConfig {
    /// Exact, absolute, canonical paths of executables that may be run.
    #[serde(default)]
    pub allowed_executables: Vec<String>,

    /// Codec name (`"unix"` / `"windows"`). Defaults to the build platform.
    #[serde(default)]
    pub os_codec: Option<String>,
}

impl ExecutorConfig {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_executables: allowed.into_iter().map(Into::into).collect(),
            os_codec: None,
        }
    }

    /// Check every allow-list entry is a non-empty absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::InvalidConfig`] on the first bad entry or an
    /// unknown codec name.
    pub fn validate(&self) -> Result<(), ExecError> {
        for entry in &self.allowed_executables {
            if entry.trim().is_empty() {
                return Err(ExecError::InvalidConfig(
                    "allowed_executables entries must not be empty".into(),
                ));
            }
            if !Path::new(entry).is_absolute() {
                return Err(ExecError::InvalidConfig(format!(
                    "allowed executable must be an absolute path: {entry}"
                )));
            }
        }
        self.codec()?;
        Ok(())
    }

    /// Resolve the configured codec.
    pub fn codec(&self) -> Result<OsCodec, ExecError> {
        match &self.os_codec {
            Some(name) => name.parse(),
            None => Ok(OsCodec::native()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_nothing() {
        let cfg = ExecutorConfig::default();
        assert!(cfg.allowed_executables.is_empty());
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.codec().unwrap(), OsCodec::native());
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: ExecutorConfig =
            serde_json::from_str(r#"{"allowed_executables":["/usr/bin/env"]}"#).unwrap();
        assert_eq!(cfg.allowed_executables, vec!["/usr/bin/env".to_string()]);
        assert!(cfg.os_codec.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn validate_rejects_relative_entry() {
        let cfg = ExecutorConfig::new(["bin/ls"]);
        assert!(matches!(cfg.validate(), Err(ExecError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_blank_entry() {
        assert!(ExecutorConfig::new(["  "]).validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_codec() {
        let cfg = ExecutorConfig {
            os_codec: Some("vms".into()),
            ..ExecutorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
