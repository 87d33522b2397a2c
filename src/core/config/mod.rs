//! core::config
//!
//! User configuration schema and loading.
//!
//! # Scope
//!
//! vgl has a single user-level configuration file. Per-repository state
//! lives in the ContextStore (`<root>/.vgl`), never here.
//!
//! # Precedence
//!
//! 1. Default values
//! 2. The config file
//! 3. CLI flags and their environment variables (applied by the CLI layer)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$VGL_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/vgl/config.toml`
//! 3. `~/.vgl/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use vgl::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("default branch: {}", config.default_branch());
//! println!("remote: {}", config.remote());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RenamePairing};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::BranchName;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let global: GlobalConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        global.validate()?;

        tracing::debug!(path = %path.display(), "config loaded");
        Ok(Self {
            global,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("VGL_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("vgl/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".vgl/config.toml"))
            .filter(|path| path.exists())
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    /// Branch used when nothing else names one. Defaults to `main`.
    pub fn default_branch(&self) -> BranchName {
        self.global
            .default_branch
            .as_deref()
            .and_then(|b| BranchName::new(b).ok())
            .unwrap_or_else(BranchName::default_branch)
    }

    /// Remote name used when a branch names none. Defaults to `origin`.
    pub fn remote(&self) -> &str {
        self.global.remote.as_deref().unwrap_or("origin")
    }

    /// Upward search bound for the context resolver.
    pub fn ceiling(&self) -> Option<&Path> {
        self.global.ceiling.as_deref()
    }

    /// Whether prompts are allowed. Defaults to `true`.
    pub fn interactive(&self) -> bool {
        self.global.interactive.unwrap_or(true)
    }

    /// Whether status fetches first. Defaults to `true`.
    pub fn fetch(&self) -> bool {
        self.global.fetch.unwrap_or(true)
    }

    /// Fallback rename pairing. Defaults to [`RenamePairing::Order`].
    pub fn rename_pairing(&self) -> RenamePairing {
        self.global.rename_pairing.unwrap_or_default()
    }

    /// Where the configuration was read from, if anywhere.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
