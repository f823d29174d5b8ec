//! Arbor Core
//!
//! Foundational pieces shared by every Arbor crate:
//!
//! - **Geometry**: points, sizes, rects, affine and 4x4 transforms, device scissors
//! - **Draw Context**: the immediate-mode renderer contract and a recording implementation
//! - **Event Bus**: synchronous widget-to-widget messaging keyed by sender and event kind
//!
//! # Example
//!
//! ```rust
//! use arbor_core::geometry::{Point, Rect};
//!
//! let panel = Rect::new(0.0, 0.0, 100.0, 100.0);
//! assert!(panel.contains(Point::new(50.0, 50.0)));
//! ```

pub mod bus;
pub mod draw;
pub mod geometry;

pub use bus::{event_types, EventBus, EventKind, SenderId, SubscriptionId};
pub use draw::{DrawCommand, DrawContext, RecordingContext};
pub use geometry::{Affine2D, Color, Mat4, Point, Rect, ScissorRect, Size, Vec2};
