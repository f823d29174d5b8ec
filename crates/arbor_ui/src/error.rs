//! Error types for arbor_ui

use thiserror::Error;

use crate::widget::WidgetId;

/// Errors raised by the widget tree, manager, and UI core
#[derive(Error, Debug)]
pub enum UiError {
    /// An ancestor of the widget has not been added to the tree yet
    #[error("parent {0:?} is not in the window tree")]
    ParentNotInTree(WidgetId),

    /// The widget already has a node in the tree
    #[error("widget {0:?} is already in the window tree")]
    AlreadyInTree(WidgetId),

    /// The handle refers to a widget that has been removed
    #[error("widget {0:?} no longer exists")]
    StaleWidget(WidgetId),

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Platform-level error (invalid window configuration, ...)
    #[error(transparent)]
    Platform(#[from] arbor_platform::PlatformError),
}

/// Result type for arbor_ui operations
pub type Result<T> = std::result::Result<T, UiError>;
