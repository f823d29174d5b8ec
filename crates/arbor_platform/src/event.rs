//! Platform events delivered to the UI core

use crate::input::InputEvent;

/// Control flow after handling an event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlFlow {
    /// Continue running the event loop
    #[default]
    Continue,
    /// Exit the event loop
    Exit,
}

/// Platform events
#[derive(Clone, Debug)]
pub enum Event {
    /// Window-related event
    Window(WindowEvent),
    /// Input event (mouse, keyboard)
    Input(InputEvent),
    /// Frame tick - time to render
    Frame,
}

/// Window events
#[derive(Clone, Debug, PartialEq)]
pub enum WindowEvent {
    /// Window was resized
    Resized {
        /// New width in logical pixels
        width: u32,
        /// New height in logical pixels
        height: u32,
    },
    /// Window close was requested (e.g., close button clicked)
    CloseRequested,
    /// Window gained or lost focus
    Focused(bool),
}

impl From<InputEvent> for Event {
    fn from(input: InputEvent) -> Self {
        Event::Input(input)
    }
}

impl From<WindowEvent> for Event {
    fn from(window: WindowEvent) -> Self {
        Event::Window(window)
    }
}
