//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: `default_branch` must be a valid
//! branch name and `remote` must be a plain remote name.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// How unmatched adds and deletes are paired into renames after native
/// rename detection has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenamePairing {
    /// Pair leftovers one-to-one in list order.
    #[default]
    Order,
    /// Only trust native detection.
    Off,
}

/// User configuration.
///
/// # Example
///
/// ```toml
/// default_branch = "main"
/// remote = "origin"
/// ceiling = "/home/me/src"
/// interactive = true
/// fetch = true
/// rename_pairing = "order"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Branch used when nothing else names one
    pub default_branch: Option<String>,

    /// Remote name consulted when a branch has no configured remote
    pub remote: Option<String>,

    /// Directory the context search never walks above
    pub ceiling: Option<PathBuf>,

    /// Default interactive mode
    pub interactive: Option<bool>,

    /// Whether status fetches before computing sync state
    pub fetch: Option<bool>,

    /// Fallback rename pairing strategy
    pub rename_pairing: Option<RenamePairing>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.default_branch {
            BranchName::new(branch.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("default_branch: {e}"))
            })?;
        }

        if let Some(remote) = &self.remote {
            let bad = remote.is_empty()
                || remote
                    .chars()
                    .any(|c| c.is_whitespace() || c == '/' || c.is_control());
            if bad {
                return Err(ConfigError::InvalidValue(format!(
                    "remote: '{remote}' is not a remote name"
                )));
            }
        }

        if let Some(ceiling) = &self.ceiling {
            if !ceiling.is_absolute() {
                return Err(ConfigError::InvalidValue(format!(
                    "ceiling: '{}' must be an absolute path",
                    ceiling.display()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: GlobalConfig = toml::from_str(
            r#"
            default_branch = "trunk"
            remote = "upstream"
            ceiling = "/home/me"
            interactive = false
            fetch = false
            rename_pairing = "off"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.rename_pairing, Some(RenamePairing::Off));
        assert_eq!(config.interactive, Some(false));
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed: Result<GlobalConfig, _> = toml::from_str("trunk = \"main\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_branch = GlobalConfig {
            default_branch: Some("a..b".into()),
            ..Default::default()
        };
        assert!(bad_branch.validate().is_err());

        let bad_remote = GlobalConfig {
            remote: Some("has space".into()),
            ..Default::default()
        };
        assert!(bad_remote.validate().is_err());

        let relative_ceiling = GlobalConfig {
            ceiling: Some(PathBuf::from("relative/dir")),
            ..Default::default()
        };
        assert!(relative_ceiling.validate().is_err());
    }

    #[test]
    fn unknown_pairing_rejected() {
        let parsed: Result<GlobalConfig, _> = toml::from_str("rename_pairing = \"similarity\"");
        assert!(parsed.is_err());
    }
}
