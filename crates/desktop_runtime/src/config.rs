//! Window manager configuration loaded from TOML.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::window_manager::FocusFallback;

/// Environment variable consulted by hosts for a config file path.
pub const CONFIG_PATH_ENV: &str = "DESKTOP_WM_CONFIG";

#[derive(Debug, Error)]
/// Failures while loading [`WindowManagerConfig`].
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The TOML document is malformed or has unknown keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Tunables for the window manager core.
pub struct WindowManagerConfig {
    /// Rule used to pick the next active window after a close, minimize or hide.
    pub focus_fallback: FocusFallback,
    /// Optional cap on simultaneously open windows.
    pub max_windows: Option<usize>,
}

impl WindowManagerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input and [`ConfigError::Invalid`] for a zero
    /// window cap.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_windows == Some(0) {
            return Err(ConfigError::Invalid(
                "max_windows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = WindowManagerConfig::from_toml_str("").expect("defaults");
        assert_eq!(config, WindowManagerConfig::default());
        assert_eq!(config.focus_fallback, FocusFallback::HighestZ);
    }

    #[test]
    fn parses_policy_and_limit() {
        let config = WindowManagerConfig::from_toml_str(
            "focus_fallback = \"most-recently-created\"\nmax_windows = 12\n",
        )
        .expect("config");
        assert_eq!(config.focus_fallback, FocusFallback::MostRecentlyCreated);
        assert_eq!(config.max_windows, Some(12));
    }

    #[test]
    fn rejects_unknown_policy_and_keys() {
        assert!(matches!(
            WindowManagerConfig::from_toml_str("focus_fallback = \"history\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            WindowManagerConfig::from_toml_str("snap_threshold = 24"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_zero_window_cap() {
        assert!(matches!(
            WindowManagerConfig::from_toml_str("max_windows = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
