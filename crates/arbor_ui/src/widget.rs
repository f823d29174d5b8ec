//! Widget capability contract
//!
//! Everything the window tree and the managers need from a widget lives
//! here: its [`WidgetState`] (placement, visibility, clipping, scroll) and
//! the [`Widget`] hooks, all of which default to no-ops. Input hooks receive
//! a [`WidgetContext`] that lends the event bus and collects grab/redraw
//! requests for the dispatching manager.

use std::any::Any;

use arbor_core::bus::{EventBus, EventKind, SenderId};
use arbor_core::draw::DrawContext;
use arbor_core::geometry::{Point, Rect, Size, Vec2};
use slotmap::{new_key_type, Key};
use smallvec::SmallVec;

new_key_type! {
    /// Generational handle to a widget stored in a [`WidgetArena`](crate::arena::WidgetArena)
    pub struct WidgetId;
}

impl WidgetId {
    /// Convert to a raw u64 representation
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Create from a raw u64 representation
    ///
    /// The raw value should come from [`WidgetId::to_raw`]; anything else
    /// simply yields a handle that resolves to nothing.
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

impl From<WidgetId> for SenderId {
    fn from(id: WidgetId) -> Self {
        SenderId(id.to_raw())
    }
}

// ============================================================================
// Widget State
// ============================================================================

/// Placement and visibility data shared by every widget
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetState {
    pub(crate) parent: Option<WidgetId>,
    rect: Rect,
    shown_rect: Rect,
    shown: bool,
    selectable: bool,
    block_drawing: bool,
    scroll: Vec2,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self::new(Rect::ZERO)
    }
}

impl WidgetState {
    /// State for a top-level, shown, selectable widget whose visible region
    /// is its full size
    pub fn new(rect: Rect) -> Self {
        Self {
            parent: None,
            rect,
            shown_rect: Size::new(rect.width(), rect.height()).to_rect(),
            shown: true,
            selectable: true,
            block_drawing: false,
            scroll: Vec2::ZERO,
        }
    }

    pub fn with_shown_rect(mut self, shown_rect: Rect) -> Self {
        self.shown_rect = shown_rect;
        self
    }

    pub fn shown(mut self, shown: bool) -> Self {
        self.shown = shown;
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    /// Clip this widget and its subtree to the visible region
    pub fn block_drawing(mut self, block: bool) -> Self {
        self.block_drawing = block;
        self
    }

    pub fn with_scroll(mut self, scroll: Vec2) -> Self {
        self.scroll = scroll;
        self
    }

    /// Parent handle, assigned when the widget is inserted as a child
    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    /// Rectangle relative to the parent's origin
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Visible sub-rectangle relative to the widget's own origin
    pub fn shown_rect(&self) -> Rect {
        self.shown_rect
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    pub fn is_block_drawing(&self) -> bool {
        self.block_drawing
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn set_position(&mut self, position: Point) {
        self.rect = Rect::from_origin_size(position, self.size());
    }

    /// Resize the widget; the visible region follows the new size
    pub fn set_size(&mut self, size: Size) {
        self.rect = self.rect.with_size(size);
        self.shown_rect = size.to_rect();
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    pub fn set_shown_rect(&mut self, shown_rect: Rect) {
        self.shown_rect = shown_rect;
    }

    pub fn set_shown(&mut self, shown: bool) {
        self.shown = shown;
    }

    pub fn set_selectable(&mut self, selectable: bool) {
        self.selectable = selectable;
    }

    pub fn set_block_drawing(&mut self, block: bool) {
        self.block_drawing = block;
    }

    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = scroll;
    }

    pub fn size(&self) -> Size {
        Size::new(self.rect.width(), self.rect.height())
    }
}

// ============================================================================
// Widget Context
// ============================================================================

/// Something a widget asks its manager to do once the hook returns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    GrabMouse(WidgetId),
    UngrabMouse,
    GrabKey(WidgetId),
    UngrabKey,
    Redraw,
}

pub(crate) type Requests = SmallVec<[Request; 4]>;

/// Handle given to input hooks
pub struct WidgetContext<'a> {
    id: WidgetId,
    bus: &'a mut EventBus,
    requests: &'a mut Requests,
}

impl<'a> WidgetContext<'a> {
    pub(crate) fn new(id: WidgetId, bus: &'a mut EventBus, requests: &'a mut Requests) -> Self {
        Self { id, bus, requests }
    }

    /// The widget the hook is running for
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// Publish a message from this widget
    pub fn publish<T: Any>(&mut self, kind: EventKind, payload: T) -> usize {
        self.bus.publish(SenderId::from(self.id), kind, payload)
    }

    pub fn bus(&mut self) -> &mut EventBus {
        self.bus
    }

    /// Route every mouse event to this widget until released
    pub fn grab_mouse(&mut self) {
        self.requests.push(Request::GrabMouse(self.id));
    }

    pub fn ungrab_mouse(&mut self) {
        self.requests.push(Request::UngrabMouse);
    }

    /// Route keyboard events to this widget
    pub fn grab_key(&mut self) {
        self.requests.push(Request::GrabKey(self.id));
    }

    pub fn ungrab_key(&mut self) {
        self.requests.push(Request::UngrabKey);
    }

    pub fn request_redraw(&mut self) {
        self.requests.push(Request::Redraw);
    }
}

// ============================================================================
// Widget Trait
// ============================================================================

/// Downcasting support for boxed widgets
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A rectangular element that can paint itself and react to input
///
/// Paint hooks run with the transform already positioned at the widget's
/// absolute origin (minus scroll for [`paint`](Widget::paint)), so widgets
/// draw in local coordinates.
#[allow(unused_variables)]
pub trait Widget: AsAny {
    fn state(&self) -> &WidgetState;

    fn state_mut(&mut self) -> &mut WidgetState;

    /// Optional label used in logs
    fn debug_name(&self) -> &str {
        "widget"
    }

    fn paint(&self, ctx: &mut dyn DrawContext) {}

    /// Drawn after all descendants, unscrolled
    fn paint_overlay(&self, ctx: &mut dyn DrawContext) {}

    fn on_resize(&mut self, cx: &mut WidgetContext<'_>) {}

    fn on_update(&mut self, cx: &mut WidgetContext<'_>) {}

    fn on_focus_in(&mut self, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_enter(&mut self, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_leave(&mut self, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_motion(&mut self, pos: Point, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_left_down(&mut self, pos: Point, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_left_up(&mut self, pos: Point, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_left_double_click(&mut self, pos: Point, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_left_dragging(&mut self, pos: Point, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_right_down(&mut self, pos: Point, cx: &mut WidgetContext<'_>) {}

    fn on_mouse_right_up(&mut self, pos: Point, cx: &mut WidgetContext<'_>) {}

    fn on_key_down(&mut self, key: char, cx: &mut WidgetContext<'_>) {}

    fn on_key_up(&mut self, key: char, cx: &mut WidgetContext<'_>) {}

    fn on_key_delete_down(&mut self, cx: &mut WidgetContext<'_>) {}

    fn on_backspace_down(&mut self, cx: &mut WidgetContext<'_>) {}

    fn on_left_arrow_down(&mut self, cx: &mut WidgetContext<'_>) {}

    fn on_right_arrow_down(&mut self, cx: &mut WidgetContext<'_>) {}
}
