//! Window configuration

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Window configuration
///
/// Deserializes from a table such as:
///
/// ```toml
/// title = "Drum Sampler"
/// width = 1024
/// height = 640
/// resizable = false
/// ```
///
/// Missing fields fall back to [`WindowConfig::default`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in logical pixels
    pub width: u32,
    /// Initial height in logical pixels
    pub height: u32,
    /// Whether the window can be resized
    pub resizable: bool,
    /// Whether to show window decorations (title bar, borders)
    pub decorations: bool,
    /// Whether the window should be transparent
    pub transparent: bool,
    /// Whether the window should always be on top
    pub always_on_top: bool,
    /// Whether to start in fullscreen mode
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Arbor App".to_string(),
            width: 800,
            height: 600,
            resizable: true,
            decorations: true,
            transparent: false,
            always_on_top: false,
            fullscreen: false,
        }
    }
}

impl WindowConfig {
    /// Create a new window configuration with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the window size
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set whether the window is resizable
    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Set whether to show window decorations
    pub fn decorations(mut self, decorations: bool) -> Self {
        self.decorations = decorations;
        self
    }

    /// Set whether the window is always on top
    pub fn always_on_top(mut self, always_on_top: bool) -> Self {
        self.always_on_top = always_on_top;
        self
    }

    /// Reject configurations no platform can open
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(PlatformError::InvalidConfig("width must be non-zero".into()));
        }
        if self.height == 0 {
            return Err(PlatformError::InvalidConfig("height must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = WindowConfig::new("Synth").size(640, 480).resizable(false);
        assert_eq!(config.title, "Synth");
        assert_eq!((config.width, config.height), (640, 480));
        assert!(!config.resizable);
        assert!(config.decorations);
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        assert!(WindowConfig::default().validate().is_ok());
        assert!(matches!(
            WindowConfig::default().size(0, 10).validate(),
            Err(PlatformError::InvalidConfig(_))
        ));
        assert!(WindowConfig::default().size(10, 0).validate().is_err());
    }
}
