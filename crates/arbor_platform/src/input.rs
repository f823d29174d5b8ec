//! Input event types for keyboard and mouse

/// Input events
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Mouse event
    Mouse(MouseEvent),
    /// Keyboard event
    Keyboard(KeyboardEvent),
}

// ============================================================================
// Mouse Events
// ============================================================================

/// Mouse events
#[derive(Clone, Debug, PartialEq)]
pub enum MouseEvent {
    /// Mouse moved to position with no button held
    Moved {
        /// X position in window coordinates
        x: f32,
        /// Y position in window coordinates
        y: f32,
    },
    /// Mouse moved while a button is held
    Dragged {
        /// Which button is held
        button: MouseButton,
        /// X position in window coordinates
        x: f32,
        /// Y position in window coordinates
        y: f32,
    },
    /// Mouse button pressed
    ButtonPressed {
        /// Which button was pressed
        button: MouseButton,
        /// X position when pressed
        x: f32,
        /// Y position when pressed
        y: f32,
    },
    /// Mouse button released
    ButtonReleased {
        /// Which button was released
        button: MouseButton,
        /// X position when released
        x: f32,
        /// Y position when released
        y: f32,
    },
    /// Second press of a double click
    DoubleClicked {
        /// Which button was double clicked
        button: MouseButton,
        /// X position of the click
        x: f32,
        /// Y position of the click
        y: f32,
    },
    /// Mouse entered the window
    Entered,
    /// Mouse left the window
    Left,
}

/// Mouse buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button (scroll wheel click)
    Middle,
    /// Other button with index
    Other(u16),
}

// ============================================================================
// Keyboard Events
// ============================================================================

/// Keyboard event
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardEvent {
    /// The key that was pressed or released
    pub key: Key,
    /// Whether the key was pressed or released
    pub state: KeyState,
    /// Modifier keys held during this event
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    pub fn pressed(key: Key) -> Self {
        Self {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
        }
    }

    pub fn released(key: Key) -> Self {
        Self {
            key,
            state: KeyState::Released,
            modifiers: Modifiers::default(),
        }
    }
}

/// Key press/release state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Key was pressed
    Pressed,
    /// Key was released
    Released,
}

/// Modifier key state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Shift key is held
    pub shift: bool,
    /// Control key is held
    pub ctrl: bool,
    /// Alt key is held (Option on macOS)
    pub alt: bool,
    /// Meta key is held (Command on macOS, Windows key on Windows)
    pub meta: bool,
}

impl Modifiers {
    /// Check if no modifiers are held
    pub fn is_empty(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt && !self.meta
    }
}

/// Key codes
///
/// Printable input arrives as [`Key::Char`]; the named variants cover the
/// editing and navigation keys widgets react to individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    // Character input (for text input)
    Char(char),

    // Editing keys
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,

    // Navigation
    Left,
    Right,
    Up,
    Down,
    Home,
    End,

    // Modifier keys (for tracking state)
    Shift,
    Ctrl,
    Alt,
    Meta,

    // Unknown key
    Unknown,
}

impl Key {
    /// Character carried by this key, if it produces one
    pub fn as_char(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            Key::Enter => Some('\n'),
            Key::Tab => Some('\t'),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_as_char() {
        assert_eq!(Key::Char('a').as_char(), Some('a'));
        assert_eq!(Key::Enter.as_char(), Some('\n'));
        assert_eq!(Key::Delete.as_char(), None);
        assert_eq!(Key::Left.as_char(), None);
    }

    #[test]
    fn test_keyboard_event_constructors() {
        let down = KeyboardEvent::pressed(Key::Backspace);
        assert_eq!(down.state, KeyState::Pressed);
        assert!(down.modifiers.is_empty());

        let up = KeyboardEvent::released(Key::Char('q'));
        assert_eq!(up.state, KeyState::Released);
    }
}
