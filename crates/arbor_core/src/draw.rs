//! Draw Context - the renderer contract used by the window tree
//!
//! The window tree never talks to a graphics API. It threads a
//! `&mut dyn DrawContext` through its traversal and relies on four things:
//!
//! - a save/restore stack of 2D affine transforms
//! - loading identity and translating the current transform
//! - a stack of device-space scissor rectangles
//! - immediate drawing calls that widgets issue from their paint hooks
//!
//! [`RecordingContext`] implements the contract by recording commands, which
//! is what headless runs and tests use.
//!
//! # Example
//!
//! ```
//! use arbor_core::draw::{DrawContext, RecordingContext};
//! use arbor_core::geometry::{Color, Rect, Size, Vec2};
//!
//! let mut ctx = RecordingContext::new(Size::new(800.0, 600.0));
//! ctx.save();
//! ctx.translate(Vec2::new(10.0, 20.0));
//! ctx.fill_rect(Rect::new(0.0, 0.0, 100.0, 50.0), Color::GRAY);
//! ctx.restore();
//!
//! assert_eq!(ctx.commands().len(), 4);
//! ```

use crate::geometry::{Affine2D, Color, Point, Rect, ScissorRect, Size, Vec2};

// ─────────────────────────────────────────────────────────────────────────────
// Draw Context Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Immediate-mode rendering interface
pub trait DrawContext {
    // ─────────────────────────────────────────────────────────────────────────
    // Transform Stack
    // ─────────────────────────────────────────────────────────────────────────

    /// Push a copy of the current transform
    fn save(&mut self);

    /// Pop back to the last saved transform
    fn restore(&mut self);

    /// Replace the current transform with identity
    fn load_identity(&mut self);

    /// Post-multiply the current transform by a translation
    fn translate(&mut self, offset: Vec2);

    /// Get the current transform
    fn current_transform(&self) -> Affine2D;

    // ─────────────────────────────────────────────────────────────────────────
    // Scissor Stack
    // ─────────────────────────────────────────────────────────────────────────

    /// Enable clipping to `rect` (device coordinates, bottom-left origin)
    fn push_scissor(&mut self, rect: ScissorRect);

    /// Disable the innermost scissor, re-enabling the enclosing one if any
    fn pop_scissor(&mut self);

    /// The scissor currently in effect
    fn current_scissor(&self) -> Option<ScissorRect>;

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────────────────

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color);

    fn draw_line(&mut self, from: Point, to: Point, width: f32, color: Color);

    fn draw_text(&mut self, text: &str, origin: Point, color: Color);

    /// Logical canvas size
    fn viewport(&self) -> Size;
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording Draw Context
// ─────────────────────────────────────────────────────────────────────────────

/// A recorded draw command
///
/// Drawing commands carry the transform and scissor that were in effect when
/// they were issued, so callers can check placement without replaying the
/// state commands.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    // State
    Save,
    Restore,
    LoadIdentity,
    Translate(Vec2),
    PushScissor(ScissorRect),
    PopScissor,

    // Drawing
    FillRect {
        rect: Rect,
        color: Color,
        transform: Affine2D,
        scissor: Option<ScissorRect>,
    },
    StrokeRect {
        rect: Rect,
        width: f32,
        color: Color,
        transform: Affine2D,
        scissor: Option<ScissorRect>,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
        transform: Affine2D,
        scissor: Option<ScissorRect>,
    },
    Text {
        text: String,
        origin: Point,
        color: Color,
        transform: Affine2D,
        scissor: Option<ScissorRect>,
    },
}

/// A draw context that records commands for later execution
#[derive(Debug)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    transform_stack: Vec<Affine2D>,
    scissor_stack: Vec<ScissorRect>,
    viewport: Size,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new(Size::ZERO)
    }
}

impl RecordingContext {
    pub fn new(viewport: Size) -> Self {
        Self {
            commands: Vec::new(),
            transform_stack: vec![Affine2D::IDENTITY],
            scissor_stack: Vec::new(),
            viewport,
        }
    }

    /// Get the recorded commands
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Text of every `Text` command, in issue order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Depth of the saved-transform stack (0 when balanced)
    pub fn save_depth(&self) -> usize {
        self.transform_stack.len() - 1
    }

    /// Depth of the scissor stack (0 when balanced)
    pub fn scissor_depth(&self) -> usize {
        self.scissor_stack.len()
    }

    /// Clear all recorded commands and reset state
    pub fn clear(&mut self) {
        self.commands.clear();
        self.transform_stack = vec![Affine2D::IDENTITY];
        self.scissor_stack.clear();
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    fn top_mut(&mut self) -> &mut Affine2D {
        if self.transform_stack.is_empty() {
            self.transform_stack.push(Affine2D::IDENTITY);
        }
        let last = self.transform_stack.len() - 1;
        &mut self.transform_stack[last]
    }
}

impl DrawContext for RecordingContext {
    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
        let current = self.current_transform();
        self.transform_stack.push(current);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
        if self.transform_stack.len() > 1 {
            self.transform_stack.pop();
        }
    }

    fn load_identity(&mut self) {
        self.commands.push(DrawCommand::LoadIdentity);
        *self.top_mut() = Affine2D::IDENTITY;
    }

    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
        let top = self.top_mut();
        *top = top.then(&Affine2D::translation(offset.x, offset.y));
    }

    fn current_transform(&self) -> Affine2D {
        self.transform_stack.last().copied().unwrap_or_default()
    }

    fn push_scissor(&mut self, rect: ScissorRect) {
        self.commands.push(DrawCommand::PushScissor(rect));
        self.scissor_stack.push(rect);
    }

    fn pop_scissor(&mut self) {
        self.commands.push(DrawCommand::PopScissor);
        self.scissor_stack.pop();
    }

    fn current_scissor(&self) -> Option<ScissorRect> {
        self.scissor_stack.last().copied()
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            color,
            transform: self.current_transform(),
            scissor: self.current_scissor(),
        });
    }

    fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            width,
            color,
            transform: self.current_transform(),
            scissor: self.current_scissor(),
        });
    }

    fn draw_line(&mut self, from: Point, to: Point, width: f32, color: Color) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
            transform: self.current_transform(),
            scissor: self.current_scissor(),
        });
    }

    fn draw_text(&mut self, text: &str, origin: Point, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin,
            color,
            transform: self.current_transform(),
            scissor: self.current_scissor(),
        });
    }

    fn viewport(&self) -> Size {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_restore_transform() {
        let mut ctx = RecordingContext::new(Size::new(100.0, 100.0));

        ctx.translate(Vec2::new(5.0, 5.0));
        ctx.save();
        ctx.load_identity();
        ctx.translate(Vec2::new(40.0, 10.0));
        assert_eq!(ctx.current_transform().offset(), Vec2::new(40.0, 10.0));

        ctx.restore();
        assert_eq!(ctx.current_transform().offset(), Vec2::new(5.0, 5.0));
        assert_eq!(ctx.save_depth(), 0);
    }

    #[test]
    fn test_unbalanced_restore_keeps_base() {
        let mut ctx = RecordingContext::default();
        ctx.restore();
        ctx.restore();
        assert_eq!(ctx.current_transform(), Affine2D::IDENTITY);
        assert_eq!(ctx.save_depth(), 0);
    }

    #[test]
    fn test_scissor_stack_restores_outer() {
        let mut ctx = RecordingContext::default();
        let outer = ScissorRect::new(0, 0, 100, 100);
        let inner = ScissorRect::new(10, 10, 20, 20);

        ctx.push_scissor(outer);
        ctx.push_scissor(inner);
        ctx.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        ctx.pop_scissor();
        ctx.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        ctx.pop_scissor();

        let scissors: Vec<_> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { scissor, .. } => Some(*scissor),
                _ => None,
            })
            .collect();
        assert_eq!(scissors, vec![Some(inner), Some(outer)]);
        assert_eq!(ctx.current_scissor(), None);
    }

    #[test]
    fn test_text_records_transform() {
        let mut ctx = RecordingContext::default();
        ctx.translate(Vec2::new(3.0, 4.0));
        ctx.draw_text("hello", Point::new(1.0, 1.0), Color::WHITE);

        match &ctx.commands()[1] {
            DrawCommand::Text {
                text, transform, ..
            } => {
                assert_eq!(text, "hello");
                assert_eq!(transform.offset(), Vec2::new(3.0, 4.0));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(ctx.texts(), vec!["hello"]);
    }
}
