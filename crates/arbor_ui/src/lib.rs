//! Arbor UI
//!
//! Widget tree, input routing, and paint traversal for an immediate-mode
//! renderer.
//!
//! - [`WidgetArena`] owns widgets behind generational [`WidgetId`] handles
//! - [`WindowTree`] mirrors parent links and decides draw order and hit-tests
//! - [`Manager`] routes mouse and keyboard input, tracking hover and grabs
//! - [`UiCore`] ties a window manager and a popup manager to one canvas
//!
//! # Example
//!
//! ```rust
//! use arbor_ui::prelude::*;
//!
//! struct Panel(WidgetState);
//!
//! impl Widget for Panel {
//!     fn state(&self) -> &WidgetState {
//!         &self.0
//!     }
//!
//!     fn state_mut(&mut self) -> &mut WidgetState {
//!         &mut self.0
//!     }
//!
//!     fn paint(&self, ctx: &mut dyn DrawContext) {
//!         ctx.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), Color::GRAY);
//!     }
//! }
//!
//! let mut core = UiCore::default();
//! let root = core.add_window(Panel(WidgetState::new(Rect::new(0.0, 0.0, 100.0, 100.0))))?;
//! let child = core.add_child(root, Panel(WidgetState::new(Rect::new(10.0, 10.0, 20.0, 20.0))))?;
//!
//! core.on_mouse_left_down(Point::new(15.0, 15.0));
//! assert!(core.window_manager().event_reached_widget());
//! assert!(core.widgets().contains(child));
//!
//! let mut ctx = RecordingContext::new(core.canvas_size());
//! assert!(core.draw_frame(&mut ctx));
//! # Ok::<(), arbor_ui::UiError>(())
//! ```

pub mod arena;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod node;
pub mod tree;
pub mod ui_core;
pub mod widget;


pub use arena::WidgetArena;
pub use config::UiConfig;
pub use error::{Result, UiError};
pub use manager::Manager;
pub use node::WindowNode;
pub use tree::WindowTree;
pub use ui_core::UiCore;
pub use widget::{AsAny, Request, Widget, WidgetContext, WidgetId, WidgetState};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::arena::WidgetArena;
    pub use crate::config::UiConfig;
    pub use crate::error::{Result, UiError};
    pub use crate::manager::Manager;
    pub use crate::tree::WindowTree;
    pub use crate::ui_core::UiCore;
    pub use crate::widget::{Widget, WidgetContext, WidgetId, WidgetState};

    pub use arbor_core::bus::{event_types, EventBus, EventKind, SenderId};
    pub use arbor_core::draw::{DrawContext, RecordingContext};
    pub use arbor_core::geometry::{Color, Point, Rect, Size, Vec2};
    pub use arbor_platform::{ControlFlow, Event, WindowConfig};
}
