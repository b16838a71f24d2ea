#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`EngineConfig`] is passed to [`Engine::with_config`](crate::Engine::with_config)
//! explicitly; there is no process-wide configuration. With the
//! `config-files` feature it can be loaded from TOML or JSON:
//!
//! ```toml
//! # revop.toml
//! slow_operation_ms = 250
//!
//! [history]
//! max_depth = 500
//! max_bytes = 0
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file("revop.toml")?;
//! let config = EngineConfig::from_json_str(json)?;
//! ```
//!
//! Missing fields take their defaults.

#[cfg(feature = "config-files")]
use std::path::Path;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};

use crate::ledger::HistoryConfig;

/// Default threshold above which an apply/reverse is logged as slow.
pub const DEFAULT_SLOW_OPERATION_MS: u64 = 100;

/// Tunables for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct EngineConfig {
    /// Ledger capacity bounds.
    pub history: HistoryConfig,
    /// Log a warning when a single apply/reverse takes longer than this
    /// many milliseconds (0 = never).
    pub slow_operation_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            slow_operation_ms: DEFAULT_SLOW_OPERATION_MS,
        }
    }
}

impl EngineConfig {
    /// Set the history limits.
    #[must_use]
    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    /// Set the slow-operation threshold.
    #[must_use]
    pub fn with_slow_operation_ms(mut self, ms: u64) -> Self {
        self.slow_operation_ms = ms;
        self
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        self.history.validate()
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "config-files")]
    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading an engine configuration.
#[cfg(feature = "config-files")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
