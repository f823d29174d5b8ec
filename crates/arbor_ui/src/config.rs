//! UI configuration
//!
//! Read from a TOML file such as:
//!
//! ```toml
//! log_filter = "arbor_ui=debug"
//!
//! [window]
//! title = "Mixer"
//! width = 1024
//! height = 640
//! ```
//!
//! Every field is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use arbor_platform::WindowConfig;

use crate::error::{Result, UiError};

/// Top-level configuration for a [`UiCore`](crate::ui_core::UiCore)
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub window: WindowConfig,
    /// `tracing` filter directive, overriding `RUST_LOG`
    pub log_filter: Option<String>,
}

impl UiConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: UiConfig = toml::from_str(content).map_err(|e| UiError::Config(e.to_string()))?;
        config.window.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| UiError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| UiError::Config(e.to_string()))
    }
}
