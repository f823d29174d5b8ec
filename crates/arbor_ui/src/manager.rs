//! Input routing from platform events to widgets
//!
//! A [`Manager`] owns one [`WindowTree`] plus the interaction state that
//! decides which widget receives each event:
//!
//! - mouse events go to the mouse-grab target, otherwise to the hit-tested
//!   widget under the pointer
//! - hover changes fire `on_mouse_leave` on the old widget and
//!   `on_mouse_enter` on the new one, exactly once per change
//! - keyboard events go to the key-grab target only
//!
//! # Example
//!
//! ```ignore
//! use arbor_ui::prelude::*;
//!
//! let mut manager = Manager::new("windows");
//! manager.add(&widgets, root)?;
//!
//! manager.on_mouse_motion(&mut widgets, &mut bus, Point::new(15.0, 15.0));
//! manager.on_mouse_left_down(&mut widgets, &mut bus, Point::new(15.0, 15.0));
//! ```

use arbor_core::bus::EventBus;
use arbor_core::draw::DrawContext;
use arbor_core::geometry::{Point, Size};
use indexmap::IndexSet;

use crate::arena::WidgetArena;
use crate::error::{Result, UiError};
use crate::tree::WindowTree;
use crate::widget::{Request, Requests, Widget, WidgetContext, WidgetId};

#[derive(Clone, Copy, Debug)]
enum MouseAction {
    LeftDown,
    LeftUp,
    LeftDoubleClick,
    LeftDragging,
    RightDown,
    RightUp,
}

/// Routes input to the widgets of one window tree
#[derive(Debug)]
pub struct Manager {
    name: String,
    /// Registered widgets, in registration order
    widgets: IndexSet<WidgetId>,
    tree: WindowTree,

    mouse_grab: Option<WidgetId>,
    hovered: Option<WidgetId>,
    key_grab: Option<WidgetId>,
    mouse_position: Point,

    /// Whether the last routed event found a target
    event_reached: bool,
    redraw_requested: bool,
}

impl Manager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            widgets: IndexSet::new(),
            tree: WindowTree::new(),
            mouse_grab: None,
            hovered: None,
            key_grab: None,
            mouse_position: Point::ZERO,
            event_reached: false,
            redraw_requested: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> &WindowTree {
        &self.tree
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register `widget` and insert it into the tree.
    ///
    /// A tree error is returned but the registration is kept, so broadcasts
    /// still reach the widget.
    pub fn add(&mut self, widgets: &WidgetArena, widget: WidgetId) -> Result<()> {
        self.register(widgets, widget)?;
        self.tree.insert(widgets, widget).map_err(|err| self.rejected(widget, err))
    }

    /// Register a floating window that draws above every normal root
    pub fn add_priority_window(&mut self, widgets: &WidgetArena, widget: WidgetId) -> Result<()> {
        self.register(widgets, widget)?;
        self.tree
            .insert_priority(widgets, widget)
            .map_err(|err| self.rejected(widget, err))
    }

    fn register(&mut self, widgets: &WidgetArena, widget: WidgetId) -> Result<()> {
        if !widgets.contains(widget) {
            return Err(self.rejected(widget, UiError::StaleWidget(widget)));
        }
        self.widgets.insert(widget);
        Ok(())
    }

    fn rejected(&self, widget: WidgetId, err: UiError) -> UiError {
        tracing::warn!(manager = %self.name, ?widget, %err, "widget not added to window tree");
        err
    }

    /// Remove `widget` and its subtree, clearing any hover or grab that
    /// pointed into it. Returns the unregistered ids.
    pub fn remove(&mut self, widget: WidgetId) -> Vec<WidgetId> {
        let mut removed = self.tree.remove(widget);
        if removed.is_empty() && self.widgets.contains(&widget) {
            removed.push(widget);
        }

        for id in &removed {
            self.widgets.shift_remove(id);
        }
        if self.hovered.is_some_and(|id| removed.contains(&id)) {
            self.hovered = None;
        }
        if self.mouse_grab.is_some_and(|id| removed.contains(&id)) {
            self.ungrab_mouse();
        }
        if self.key_grab.is_some_and(|id| removed.contains(&id)) {
            self.ungrab_key();
        }

        tracing::debug!(manager = %self.name, ?widget, count = removed.len(), "removed widgets");
        removed
    }

    pub fn is_registered(&self, widget: WidgetId) -> bool {
        self.widgets.contains(&widget)
    }

    /// Registered widgets in registration order
    pub fn registered(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.widgets.iter().copied()
    }

    // =========================================================================
    // Grabs
    // =========================================================================

    /// Send every mouse event to `widget`, replacing any previous grab
    pub fn grab_mouse(&mut self, widget: WidgetId) {
        if self.mouse_grab != Some(widget) {
            tracing::debug!(manager = %self.name, ?widget, "mouse grabbed");
        }
        self.mouse_grab = Some(widget);
    }

    pub fn ungrab_mouse(&mut self) {
        if let Some(widget) = self.mouse_grab.take() {
            tracing::debug!(manager = %self.name, ?widget, "mouse released");
        }
    }

    /// Whether any widget holds the mouse grab
    pub fn is_grab(&self) -> bool {
        self.mouse_grab.is_some()
    }

    pub fn mouse_grabbed(&self) -> Option<WidgetId> {
        self.mouse_grab
    }

    pub fn is_mouse_hover(&self, widget: WidgetId) -> bool {
        self.hovered == Some(widget)
    }

    pub fn hovered(&self) -> Option<WidgetId> {
        self.hovered
    }

    /// Send keyboard events to `widget`
    pub fn grab_key(&mut self, widget: WidgetId) {
        if self.key_grab != Some(widget) {
            tracing::debug!(manager = %self.name, ?widget, "keyboard grabbed");
        }
        self.key_grab = Some(widget);
    }

    pub fn ungrab_key(&mut self) {
        if let Some(widget) = self.key_grab.take() {
            tracing::debug!(manager = %self.name, ?widget, "keyboard released");
        }
    }

    pub fn is_key_grab(&self, widget: WidgetId) -> bool {
        self.key_grab == Some(widget)
    }

    pub fn key_grabbed(&self) -> Option<WidgetId> {
        self.key_grab
    }

    // =========================================================================
    // Mouse
    // =========================================================================

    pub fn mouse_position(&self) -> Point {
        self.mouse_position
    }

    pub fn set_mouse_position(&mut self, pos: Point) {
        self.mouse_position = pos;
    }

    /// Whether the last routed event found a target widget
    pub fn event_reached_widget(&self) -> bool {
        self.event_reached
    }

    pub fn on_mouse_motion(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus, pos: Point) {
        self.mouse_position = pos;
        self.release_stale_grabs(widgets);

        if let Some(grab) = self.mouse_grab {
            self.event_reached = true;
            self.dispatch(widgets, bus, grab, |w, cx| w.on_mouse_motion(pos, cx));
            return;
        }

        let target = self.tree.hit_test(widgets, pos);
        self.event_reached = target.is_some();
        self.update_hover(widgets, bus, target);

        if let Some(target) = target {
            self.dispatch(widgets, bus, target, |w, cx| w.on_mouse_motion(pos, cx));
        }
    }

    pub fn on_mouse_left_down(
        &mut self,
        widgets: &mut WidgetArena,
        bus: &mut EventBus,
        pos: Point,
    ) {
        self.route_mouse(widgets, bus, pos, MouseAction::LeftDown);
    }

    pub fn on_mouse_left_up(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus, pos: Point) {
        self.route_mouse(widgets, bus, pos, MouseAction::LeftUp);
    }

    pub fn on_mouse_left_double_click(
        &mut self,
        widgets: &mut WidgetArena,
        bus: &mut EventBus,
        pos: Point,
    ) {
        self.route_mouse(widgets, bus, pos, MouseAction::LeftDoubleClick);
    }

    pub fn on_mouse_left_dragging(
        &mut self,
        widgets: &mut WidgetArena,
        bus: &mut EventBus,
        pos: Point,
    ) {
        self.route_mouse(widgets, bus, pos, MouseAction::LeftDragging);
    }

    /// Right press at the last known mouse position
    pub fn on_mouse_right_down(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        let pos = self.mouse_position;
        self.route_mouse(widgets, bus, pos, MouseAction::RightDown);
    }

    pub fn on_mouse_right_up(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        let pos = self.mouse_position;
        self.route_mouse(widgets, bus, pos, MouseAction::RightUp);
    }

    /// The pointer left the window: the hovered widget gets `on_mouse_leave`
    pub fn on_mouse_leave_window(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        self.event_reached = false;
        self.update_hover(widgets, bus, None);
    }

    fn route_mouse(
        &mut self,
        widgets: &mut WidgetArena,
        bus: &mut EventBus,
        pos: Point,
        action: MouseAction,
    ) {
        self.mouse_position = pos;
        self.release_stale_grabs(widgets);

        let target = self.mouse_grab.or_else(|| self.tree.hit_test(widgets, pos));
        self.event_reached = target.is_some();
        let Some(target) = target else {
            tracing::trace!(manager = %self.name, ?action, x = pos.x, y = pos.y, "no target");
            return;
        };

        self.dispatch(widgets, bus, target, |w, cx| match action {
            MouseAction::LeftDown => w.on_mouse_left_down(pos, cx),
            MouseAction::LeftUp => w.on_mouse_left_up(pos, cx),
            MouseAction::LeftDoubleClick => w.on_mouse_left_double_click(pos, cx),
            MouseAction::LeftDragging => w.on_mouse_left_dragging(pos, cx),
            MouseAction::RightDown => w.on_mouse_right_down(pos, cx),
            MouseAction::RightUp => w.on_mouse_right_up(pos, cx),
        });
    }

    fn update_hover(
        &mut self,
        widgets: &mut WidgetArena,
        bus: &mut EventBus,
        target: Option<WidgetId>,
    ) {
        if self.hovered == target {
            return;
        }

        let previous = std::mem::replace(&mut self.hovered, target);
        tracing::debug!(manager = %self.name, ?previous, current = ?target, "hover changed");

        if let Some(old) = previous {
            self.dispatch(widgets, bus, old, |w, cx| w.on_mouse_leave(cx));
        }
        if let Some(new) = target {
            self.dispatch(widgets, bus, new, |w, cx| w.on_mouse_enter(cx));
        }
    }

    fn release_stale_grabs(&mut self, widgets: &WidgetArena) {
        if self.mouse_grab.is_some_and(|id| !widgets.contains(id)) {
            tracing::trace!(manager = %self.name, "dropping stale mouse grab");
            self.mouse_grab = None;
        }
        if self.key_grab.is_some_and(|id| !widgets.contains(id)) {
            tracing::trace!(manager = %self.name, "dropping stale key grab");
            self.key_grab = None;
        }
        if self.hovered.is_some_and(|id| !widgets.contains(id)) {
            self.hovered = None;
        }
    }

    // =========================================================================
    // Keyboard
    // =========================================================================

    pub fn on_key_down(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus, key: char) {
        self.route_key(widgets, bus, |w, cx| w.on_key_down(key, cx));
    }

    pub fn on_key_up(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus, key: char) {
        self.route_key(widgets, bus, |w, cx| w.on_key_up(key, cx));
    }

    pub fn on_key_delete_down(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        self.route_key(widgets, bus, |w, cx| w.on_key_delete_down(cx));
    }

    pub fn on_backspace_down(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        self.route_key(widgets, bus, |w, cx| w.on_backspace_down(cx));
    }

    pub fn on_left_arrow_down(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        self.route_key(widgets, bus, |w, cx| w.on_left_arrow_down(cx));
    }

    pub fn on_right_arrow_down(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        self.route_key(widgets, bus, |w, cx| w.on_right_arrow_down(cx));
    }

    fn route_key<F>(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus, hook: F)
    where
        F: FnOnce(&mut dyn Widget, &mut WidgetContext<'_>),
    {
        self.release_stale_grabs(widgets);
        let Some(target) = self.key_grab else {
            self.event_reached = false;
            tracing::trace!(manager = %self.name, "key event dropped: no key grab");
            return;
        };
        self.event_reached = true;
        self.dispatch(widgets, bus, target, hook);
    }

    // =========================================================================
    // Paint and broadcasts
    // =========================================================================

    pub fn on_paint(&self, widgets: &WidgetArena, ctx: &mut dyn DrawContext, canvas: Size) {
        self.tree.draw_all(widgets, ctx, canvas);
    }

    pub fn on_size(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        self.broadcast(widgets, bus, |w, cx| w.on_resize(cx));
    }

    pub fn on_update(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        self.broadcast(widgets, bus, |w, cx| w.on_update(cx));
    }

    pub fn on_focus_in(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus) {
        self.broadcast(widgets, bus, |w, cx| w.on_focus_in(cx));
    }

    fn broadcast<F>(&mut self, widgets: &mut WidgetArena, bus: &mut EventBus, mut hook: F)
    where
        F: FnMut(&mut dyn Widget, &mut WidgetContext<'_>),
    {
        let targets: Vec<WidgetId> = self.widgets.iter().copied().collect();
        for id in targets {
            self.dispatch(widgets, bus, id, &mut hook);
        }
    }

    /// Returns and clears the redraw flag set by widget requests
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn dispatch<F>(
        &mut self,
        widgets: &mut WidgetArena,
        bus: &mut EventBus,
        target: WidgetId,
        hook: F,
    ) -> bool
    where
        F: FnOnce(&mut dyn Widget, &mut WidgetContext<'_>),
    {
        let Some(widget) = widgets.get_mut(target) else {
            tracing::trace!(manager = %self.name, ?target, "skipping stale widget");
            return false;
        };

        tracing::trace!(manager = %self.name, widget = widget.debug_name(), "dispatch");
        let mut requests = Requests::new();
        {
            let mut cx = WidgetContext::new(target, bus, &mut requests);
            hook(widget, &mut cx);
        }
        self.apply(requests);
        true
    }

    fn apply(&mut self, requests: Requests) {
        for request in requests {
            match request {
                Request::GrabMouse(id) => self.grab_mouse(id),
                Request::UngrabMouse => self.ungrab_mouse(),
                Request::GrabKey(id) => self.grab_key(id),
                Request::UngrabKey => self.ungrab_key(),
                Request::Redraw => self.redraw_requested = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetState;
    use arbor_core::geometry::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        state: WidgetState,
        name: &'static str,
        log: Log,
        grab_on_down: bool,
    }

    impl Recorder {
        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{}", self.name, event));
        }
    }

    impl Widget for Recorder {
        fn state(&self) -> &WidgetState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut WidgetState {
            &mut self.state
        }

        fn on_resize(&mut self, _cx: &mut WidgetContext<'_>) {
            self.record("resize");
        }

        fn on_mouse_enter(&mut self, _cx: &mut WidgetContext<'_>) {
            self.record("enter");
        }

        fn on_mouse_leave(&mut self, _cx: &mut WidgetContext<'_>) {
            self.record("leave");
        }

        fn on_mouse_motion(&mut self, _pos: Point, _cx: &mut WidgetContext<'_>) {
            self.record("motion");
        }

        fn on_mouse_left_down(&mut self, _pos: Point, cx: &mut WidgetContext<'_>) {
            self.record("down");
            if self.grab_on_down {
                cx.grab_mouse();
                cx.request_redraw();
            }
        }

        fn on_mouse_left_up(&mut self, _pos: Point, cx: &mut WidgetContext<'_>) {
            self.record("up");
            cx.ungrab_mouse();
        }

        fn on_mouse_right_down(&mut self, _pos: Point, _cx: &mut WidgetContext<'_>) {
            self.record("right");
        }

        fn on_key_down(&mut self, key: char, _cx: &mut WidgetContext<'_>) {
            self.record(&format!("key {}", key));
        }
    }

    struct Fixture {
        widgets: WidgetArena,
        bus: EventBus,
        manager: Manager,
        log: Log,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                widgets: WidgetArena::new(),
                bus: EventBus::new(),
                manager: Manager::new("test"),
                log: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn recorder(&self, name: &'static str, rect: Rect) -> Recorder {
            Recorder {
                state: WidgetState::new(rect),
                name,
                log: Rc::clone(&self.log),
                grab_on_down: false,
            }
        }

        fn add_root(&mut self, name: &'static str, rect: Rect) -> WidgetId {
            let recorder = self.recorder(name, rect);
            let id = self.widgets.insert(recorder);
            self.manager.add(&self.widgets, id).unwrap();
            id
        }

        fn add_child(&mut self, parent: WidgetId, name: &'static str, rect: Rect) -> WidgetId {
            let recorder = self.recorder(name, rect);
            let id = self.widgets.insert_child(parent, recorder).unwrap();
            self.manager.add(&self.widgets, id).unwrap();
            id
        }

        fn motion(&mut self, x: f32, y: f32) {
            self.manager
                .on_mouse_motion(&mut self.widgets, &mut self.bus, Point::new(x, y));
        }

        fn take_log(&self) -> Vec<String> {
            std::mem::take(&mut *self.log.borrow_mut())
        }
    }

    #[test]
    fn test_hover_fires_once_per_change() {
        let mut f = Fixture::new();
        let root = f.add_root("root", Rect::new(0.0, 0.0, 100.0, 100.0));
        f.add_child(root, "child", Rect::new(10.0, 10.0, 20.0, 20.0));

        f.motion(50.0, 50.0);
        f.motion(60.0, 60.0);
        f.motion(15.0, 15.0);
        f.motion(200.0, 200.0);

        assert_eq!(
            f.take_log(),
            vec![
                "root:enter",
                "root:motion",
                "root:motion",
                "root:leave",
                "child:enter",
                "child:motion",
                "child:leave",
            ]
        );
        assert!(!f.manager.event_reached_widget());
        assert_eq!(f.manager.hovered(), None);
    }

    #[test]
    fn test_grab_wins_over_hit_test() {
        let mut f = Fixture::new();
        let g = f.add_root("g", Rect::new(0.0, 0.0, 50.0, 50.0));
        let h = f.add_root("h", Rect::new(100.0, 0.0, 50.0, 50.0));

        f.motion(10.0, 10.0);
        f.manager.grab_mouse(g);
        f.take_log();

        f.motion(120.0, 10.0);
        assert_eq!(f.take_log(), vec!["g:motion"]);
        assert!(f.manager.is_mouse_hover(g));

        f.manager.ungrab_mouse();
        f.motion(120.0, 10.0);
        assert_eq!(f.take_log(), vec!["g:leave", "h:enter", "h:motion"]);
        assert!(f.manager.is_mouse_hover(h));
    }

    #[test]
    fn test_widget_requests_grab_from_hook() {
        let mut f = Fixture::new();
        let mut recorder = f.recorder("button", Rect::new(0.0, 0.0, 40.0, 20.0));
        recorder.grab_on_down = true;
        let button = f.widgets.insert(recorder);
        f.manager.add(&f.widgets, button).unwrap();
        f.add_root("other", Rect::new(50.0, 0.0, 40.0, 20.0));

        let at = Point::new(10.0, 10.0);
        f.manager.on_mouse_left_down(&mut f.widgets, &mut f.bus, at);
        assert_eq!(f.manager.mouse_grabbed(), Some(button));
        assert!(f.manager.take_redraw_request());
        assert!(!f.manager.take_redraw_request());

        f.manager
            .on_mouse_left_up(&mut f.widgets, &mut f.bus, Point::new(60.0, 10.0));
        assert_eq!(f.take_log(), vec!["button:down", "button:up"]);
        assert!(!f.manager.is_grab());
    }

    #[test]
    fn test_right_click_uses_last_position() {
        let mut f = Fixture::new();
        f.add_root("a", Rect::new(0.0, 0.0, 10.0, 10.0));
        f.add_root("b", Rect::new(20.0, 0.0, 10.0, 10.0));

        f.motion(25.0, 5.0);
        f.take_log();
        f.manager.on_mouse_right_down(&mut f.widgets, &mut f.bus);
        assert_eq!(f.take_log(), vec!["b:right"]);
    }

    #[test]
    fn test_keys_need_grab() {
        let mut f = Fixture::new();
        let field = f.add_root("field", Rect::new(0.0, 0.0, 10.0, 10.0));

        f.manager.on_key_down(&mut f.widgets, &mut f.bus, 'a');
        assert!(f.take_log().is_empty());
        assert!(!f.manager.event_reached_widget());

        f.manager.grab_key(field);
        f.manager.grab_key(field);
        assert!(f.manager.is_key_grab(field));
        f.manager.on_key_down(&mut f.widgets, &mut f.bus, 'b');
        assert_eq!(f.take_log(), vec!["field:key b"]);

        f.manager.ungrab_key();
        f.manager.ungrab_key();
        assert_eq!(f.manager.key_grabbed(), None);
    }

    #[test]
    fn test_broadcast_in_registration_order() {
        let mut f = Fixture::new();
        let first = f.add_root("first", Rect::new(0.0, 0.0, 10.0, 10.0));
        f.add_child(first, "second", Rect::new(0.0, 0.0, 5.0, 5.0));
        f.add_root("third", Rect::new(0.0, 0.0, 10.0, 10.0));

        f.manager.on_size(&mut f.widgets, &mut f.bus);
        assert_eq!(f.take_log(), vec!["first:resize", "second:resize", "third:resize"]);
    }

    #[test]
    fn test_failed_insert_keeps_registration() {
        let mut f = Fixture::new();
        let recorder = f.recorder("parent", Rect::new(0.0, 0.0, 10.0, 10.0));
        let parent = f.widgets.insert(recorder);
        let recorder = f.recorder("child", Rect::new(0.0, 0.0, 10.0, 10.0));
        let child = f.widgets.insert_child(parent, recorder).unwrap();

        assert!(matches!(
            f.manager.add(&f.widgets, child),
            Err(UiError::ParentNotInTree(id)) if id == parent
        ));
        assert!(f.manager.is_registered(child));
        assert!(f.manager.tree().is_empty());

        f.manager.on_size(&mut f.widgets, &mut f.bus);
        assert_eq!(f.take_log(), vec!["child:resize"]);
    }

    #[test]
    fn test_remove_clears_interaction_state() {
        let mut f = Fixture::new();
        let root = f.add_root("root", Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = f.add_child(root, "child", Rect::new(0.0, 0.0, 50.0, 50.0));

        f.motion(10.0, 10.0);
        f.manager.grab_mouse(child);
        f.manager.grab_key(child);

        assert_eq!(f.manager.remove(root), vec![root, child]);
        assert_eq!(f.manager.hovered(), None);
        assert!(!f.manager.is_grab());
        assert_eq!(f.manager.key_grabbed(), None);
        assert_eq!(f.manager.registered().count(), 0);
    }
}
