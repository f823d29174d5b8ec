//! Arbor Platform Types
//!
//! The types platform glue uses to feed the UI core: window and input
//! events, window configuration, and the platform error type. Window
//! creation and the event loop itself live in the host application.
//!
//! # Example
//!
//! ```
//! use arbor_platform::*;
//!
//! let events = vec![
//!     Event::Window(WindowEvent::Resized { width: 800, height: 600 }),
//!     Event::Input(InputEvent::Mouse(MouseEvent::Moved { x: 10.0, y: 20.0 })),
//!     Event::Frame,
//! ];
//! assert_eq!(events.len(), 3);
//! ```

mod error;
mod event;
mod input;
mod window;

// Re-export all public types
pub use error::{PlatformError, Result};
pub use event::{ControlFlow, Event, WindowEvent};
pub use input::{InputEvent, Key, KeyState, KeyboardEvent, Modifiers, MouseButton, MouseEvent};
pub use window::WindowConfig;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{PlatformError, Result};
    pub use crate::event::{ControlFlow, Event, WindowEvent};
    pub use crate::input::{
        InputEvent, Key, KeyState, KeyboardEvent, Modifiers, MouseButton, MouseEvent,
    };
    pub use crate::window::WindowConfig;
}
