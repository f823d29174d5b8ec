//! UI core - the top-level object a host application drives
//!
//! `UiCore` owns the widgets, the event bus, and two managers:
//!
//! - the **window manager** holds the application's windows
//! - the **popup manager** holds transient popups (menus, tooltips)
//!
//! Mouse input is offered to the popup manager first and only reaches the
//! window manager if no popup widget was hit. Keyboard input goes to
//! whichever manager holds a key grab, popups first.
//!
//! Painting is on demand: input that makes a widget request a redraw,
//! [`UiCore::resize`], and [`UiCore::update_all`] set a flag that the next
//! [`UiCore::draw_frame`] consumes.

use arbor_core::bus::EventBus;
use arbor_core::draw::DrawContext;
use arbor_core::geometry::{Color, Point, Size};
use arbor_platform::{
    ControlFlow, Event, InputEvent, Key, KeyState, KeyboardEvent, MouseButton, MouseEvent,
    WindowEvent,
};

use crate::arena::WidgetArena;
use crate::config::UiConfig;
use crate::error::Result;
use crate::manager::Manager;
use crate::widget::{Widget, WidgetId};

/// Owner of the widget arena, event bus, and managers
#[derive(Debug)]
pub struct UiCore {
    widgets: WidgetArena,
    bus: EventBus,
    window_manager: Manager,
    popup_manager: Manager,
    canvas: Size,
    needs_redraw: bool,
}

impl Default for UiCore {
    fn default() -> Self {
        let window = UiConfig::default().window;
        Self::with_canvas(Size::new(window.width as f32, window.height as f32))
    }
}

impl UiCore {
    /// Create a core sized to the configured window
    pub fn new(config: &UiConfig) -> Result<Self> {
        config.window.validate()?;
        let canvas = Size::new(config.window.width as f32, config.window.height as f32);
        tracing::debug!(width = canvas.width, height = canvas.height, "ui core created");
        Ok(Self::with_canvas(canvas))
    }

    fn with_canvas(canvas: Size) -> Self {
        Self {
            widgets: WidgetArena::new(),
            bus: EventBus::new(),
            window_manager: Manager::new("windows"),
            popup_manager: Manager::new("popups"),
            canvas,
            needs_redraw: true,
        }
    }

    pub fn widgets(&self) -> &WidgetArena {
        &self.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut WidgetArena {
        &mut self.widgets
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn window_manager(&self) -> &Manager {
        &self.window_manager
    }

    pub fn window_manager_mut(&mut self) -> &mut Manager {
        &mut self.window_manager
    }

    pub fn popup_manager(&self) -> &Manager {
        &self.popup_manager
    }

    pub fn popup_manager_mut(&mut self) -> &mut Manager {
        &mut self.popup_manager
    }

    // =========================================================================
    // Widgets
    // =========================================================================

    /// Add a top-level window
    pub fn add_window<W: Widget + 'static>(&mut self, widget: W) -> Result<WidgetId> {
        let id = self.widgets.insert(widget);
        let result = self.window_manager.add(&self.widgets, id);
        self.commit(id, result)
    }

    /// Add a floating window that stays above every normal window
    pub fn add_priority_window<W: Widget + 'static>(&mut self, widget: W) -> Result<WidgetId> {
        let id = self.widgets.insert(widget);
        let result = self.window_manager.add_priority_window(&self.widgets, id);
        self.commit(id, result)
    }

    /// Add a popup; it receives input before any window
    pub fn add_popup<W: Widget + 'static>(&mut self, widget: W) -> Result<WidgetId> {
        let id = self.widgets.insert(widget);
        let result = self.popup_manager.add(&self.widgets, id);
        self.commit(id, result)
    }

    /// Add `widget` under `parent`, in whichever manager owns the parent
    pub fn add_child<W: Widget + 'static>(
        &mut self,
        parent: WidgetId,
        widget: W,
    ) -> Result<WidgetId> {
        let id = self.widgets.insert_child(parent, widget)?;
        let manager = if self.popup_manager.is_registered(parent) {
            &mut self.popup_manager
        } else {
            &mut self.window_manager
        };
        let result = manager.add(&self.widgets, id);
        self.commit(id, result)
    }

    fn commit(&mut self, id: WidgetId, result: Result<()>) -> Result<WidgetId> {
        match result {
            Ok(()) => {
                self.needs_redraw = true;
                Ok(id)
            }
            Err(err) => {
                self.remove_widget(id);
                Err(err)
            }
        }
    }

    /// Remove a widget and its descendants from both managers and the arena.
    /// Returns the ids dropped from the arena.
    pub fn remove_widget(&mut self, id: WidgetId) -> Vec<WidgetId> {
        self.window_manager.remove(id);
        self.popup_manager.remove(id);
        let removed = self.widgets.remove(id);
        if !removed.is_empty() {
            self.needs_redraw = true;
        }
        removed
    }

    /// Remove every popup
    pub fn close_popups(&mut self) {
        let popups: Vec<WidgetId> = self
            .popup_manager
            .tree()
            .iter_roots()
            .map(|root| root.widget())
            .collect();
        let stray: Vec<WidgetId> = self.popup_manager.registered().collect();

        for id in popups.into_iter().chain(stray) {
            self.remove_widget(id);
        }
        tracing::debug!("popups closed");
    }

    /// Typed access to a widget
    pub fn widget<T: Widget + 'static>(&self, id: WidgetId) -> Option<&T> {
        self.widgets.get_as::<T>(id)
    }

    pub fn widget_mut<T: Widget + 'static>(&mut self, id: WidgetId) -> Option<&mut T> {
        self.widgets.get_as_mut::<T>(id)
    }

    // =========================================================================
    // Canvas and drawing
    // =========================================================================

    /// Track a new canvas size. A zero height is treated as one pixel.
    pub fn resize(&mut self, width: u32, height: u32) {
        let height = height.max(1);
        self.canvas = Size::new(width as f32, height as f32);
        self.needs_redraw = true;
        tracing::debug!(width, height, "canvas resized");

        self.window_manager.on_size(&mut self.widgets, &mut self.bus);
        self.collect_redraw_requests();
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Set the canvas size without notifying widgets
    pub fn set_canvas_size(&mut self, size: Size) {
        self.canvas = size;
    }

    /// Schedule a repaint
    pub fn update_all(&mut self) {
        self.needs_redraw = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Let every widget refresh its state, then schedule a repaint
    pub fn on_update(&mut self) {
        self.window_manager.on_update(&mut self.widgets, &mut self.bus);
        self.popup_manager.on_update(&mut self.widgets, &mut self.bus);
        self.collect_redraw_requests();
        self.needs_redraw = true;
    }

    pub fn on_focus_in(&mut self) {
        self.window_manager.on_focus_in(&mut self.widgets, &mut self.bus);
        self.collect_redraw_requests();
    }

    /// Paint a frame if one is pending. Returns whether anything was drawn.
    pub fn draw_frame(&mut self, ctx: &mut dyn DrawContext) -> bool {
        if !self.needs_redraw {
            return false;
        }
        self.needs_redraw = false;

        ctx.save();
        ctx.load_identity();
        ctx.fill_rect(self.canvas.to_rect(), Color::BLACK);
        ctx.restore();

        self.window_manager.on_paint(&self.widgets, ctx, self.canvas);
        self.popup_manager.on_paint(&self.widgets, ctx, self.canvas);
        tracing::trace!("frame drawn");
        true
    }

    // =========================================================================
    // Input
    // =========================================================================

    pub fn on_mouse_motion(&mut self, pos: Point) {
        self.route_mouse(true, |m, widgets, bus| m.on_mouse_motion(widgets, bus, pos));
    }

    pub fn on_mouse_left_down(&mut self, pos: Point) {
        self.route_mouse(false, |m, widgets, bus| m.on_mouse_left_down(widgets, bus, pos));
    }

    pub fn on_mouse_left_up(&mut self, pos: Point) {
        self.route_mouse(false, |m, widgets, bus| m.on_mouse_left_up(widgets, bus, pos));
    }

    pub fn on_mouse_left_double_click(&mut self, pos: Point) {
        self.route_mouse(false, |m, widgets, bus| m.on_mouse_left_double_click(widgets, bus, pos));
    }

    pub fn on_mouse_left_dragging(&mut self, pos: Point) {
        self.route_mouse(false, |m, widgets, bus| m.on_mouse_left_dragging(widgets, bus, pos));
    }

    pub fn on_mouse_right_down(&mut self, pos: Point) {
        self.route_mouse(false, |m, widgets, bus| {
            m.set_mouse_position(pos);
            m.on_mouse_right_down(widgets, bus);
        });
    }

    pub fn on_mouse_right_up(&mut self, pos: Point) {
        self.route_mouse(false, |m, widgets, bus| {
            m.set_mouse_position(pos);
            m.on_mouse_right_up(widgets, bus);
        });
    }

    pub fn on_mouse_leave_window(&mut self) {
        self.popup_manager.on_mouse_leave_window(&mut self.widgets, &mut self.bus);
        self.window_manager.on_mouse_leave_window(&mut self.widgets, &mut self.bus);
        self.collect_redraw_requests();
    }

    pub fn on_key_down(&mut self, key: char) {
        self.route_key(|m, widgets, bus| m.on_key_down(widgets, bus, key));
    }

    pub fn on_key_up(&mut self, key: char) {
        self.route_key(|m, widgets, bus| m.on_key_up(widgets, bus, key));
    }

    pub fn on_key_delete_down(&mut self) {
        self.route_key(|m, widgets, bus| m.on_key_delete_down(widgets, bus));
    }

    pub fn on_backspace_down(&mut self) {
        self.route_key(|m, widgets, bus| m.on_backspace_down(widgets, bus));
    }

    pub fn on_left_arrow_down(&mut self) {
        self.route_key(|m, widgets, bus| m.on_left_arrow_down(widgets, bus));
    }

    pub fn on_right_arrow_down(&mut self) {
        self.route_key(|m, widgets, bus| m.on_right_arrow_down(widgets, bus));
    }

    /// Mouse routing. A live grab in either manager takes the event outright;
    /// otherwise popups see it first. On motion, hover is cleared in the
    /// manager that did not get the event so only one widget is hovered.
    fn route_mouse<F>(&mut self, motion: bool, mut deliver: F)
    where
        F: FnMut(&mut Manager, &mut WidgetArena, &mut EventBus),
    {
        let window_grab = !holds_live_grab(&self.popup_manager, &self.widgets)
            && holds_live_grab(&self.window_manager, &self.widgets);

        if window_grab {
            deliver(&mut self.window_manager, &mut self.widgets, &mut self.bus);
            if motion {
                self.popup_manager.on_mouse_leave_window(&mut self.widgets, &mut self.bus);
            }
        } else {
            deliver(&mut self.popup_manager, &mut self.widgets, &mut self.bus);
            if !self.popup_manager.event_reached_widget() {
                deliver(&mut self.window_manager, &mut self.widgets, &mut self.bus);
            } else if motion {
                self.window_manager.on_mouse_leave_window(&mut self.widgets, &mut self.bus);
            }
        }
        self.collect_redraw_requests();
    }

    /// Offer a key event to the popup manager, then to the window manager if
    /// no popup widget took it
    fn route_key<F>(&mut self, mut deliver: F)
    where
        F: FnMut(&mut Manager, &mut WidgetArena, &mut EventBus),
    {
        deliver(&mut self.popup_manager, &mut self.widgets, &mut self.bus);
        if !self.popup_manager.event_reached_widget() {
            deliver(&mut self.window_manager, &mut self.widgets, &mut self.bus);
        }
        self.collect_redraw_requests();
    }

    fn collect_redraw_requests(&mut self) {
        let popup = self.popup_manager.take_redraw_request();
        let window = self.window_manager.take_redraw_request();
        if popup || window {
            self.needs_redraw = true;
        }
    }

    // =========================================================================
    // Platform events
    // =========================================================================

    /// Translate a platform event into the calls above
    pub fn handle_event(&mut self, event: Event) -> ControlFlow {
        match event {
            Event::Window(WindowEvent::Resized { width, height }) => self.resize(width, height),
            Event::Window(WindowEvent::Focused(true)) => self.on_focus_in(),
            Event::Window(WindowEvent::Focused(false)) => {}
            Event::Window(WindowEvent::CloseRequested) => {
                tracing::debug!("close requested");
                return ControlFlow::Exit;
            }
            Event::Input(InputEvent::Mouse(mouse)) => self.handle_mouse(mouse),
            Event::Input(InputEvent::Keyboard(keyboard)) => self.handle_keyboard(keyboard),
            Event::Frame => {}
        }
        ControlFlow::Continue
    }

    fn handle_mouse(&mut self, event: MouseEvent) {
        match event {
            MouseEvent::Moved { x, y } => self.on_mouse_motion(Point::new(x, y)),
            MouseEvent::Dragged {
                button: MouseButton::Left,
                x,
                y,
            } => self.on_mouse_left_dragging(Point::new(x, y)),
            MouseEvent::Dragged { x, y, .. } => self.on_mouse_motion(Point::new(x, y)),
            MouseEvent::ButtonPressed { button, x, y } => match button {
                MouseButton::Left => self.on_mouse_left_down(Point::new(x, y)),
                MouseButton::Right => self.on_mouse_right_down(Point::new(x, y)),
                _ => {}
            },
            MouseEvent::ButtonReleased { button, x, y } => match button {
                MouseButton::Left => self.on_mouse_left_up(Point::new(x, y)),
                MouseButton::Right => self.on_mouse_right_up(Point::new(x, y)),
                _ => {}
            },
            MouseEvent::DoubleClicked {
                button: MouseButton::Left,
                x,
                y,
            } => self.on_mouse_left_double_click(Point::new(x, y)),
            MouseEvent::DoubleClicked { .. } | MouseEvent::Entered => {}
            MouseEvent::Left => self.on_mouse_leave_window(),
        }
    }

    fn handle_keyboard(&mut self, event: KeyboardEvent) {
        match (event.state, event.key) {
            (KeyState::Pressed, Key::Delete) => self.on_key_delete_down(),
            (KeyState::Pressed, Key::Backspace) => self.on_backspace_down(),
            (KeyState::Pressed, Key::Left) => self.on_left_arrow_down(),
            (KeyState::Pressed, Key::Right) => self.on_right_arrow_down(),
            (state, key) => {
                let Some(c) = key.as_char() else {
                    tracing::trace!(?key, "unhandled key");
                    return;
                };
                match state {
                    KeyState::Pressed => self.on_key_down(c),
                    KeyState::Released => self.on_key_up(c),
                }
            }
        }
    }
}

fn holds_live_grab(manager: &Manager, widgets: &WidgetArena) -> bool {
    manager
        .mouse_grabbed()
        .is_some_and(|id| widgets.contains(id))
}
