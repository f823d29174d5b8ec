//! Widget storage
//!
//! The arena owns every widget. Trees and managers only hold [`WidgetId`]s,
//! so a removed widget turns into a stale handle that resolves to `None`.

use arbor_core::geometry::{Rect, Vec2};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::error::{Result, UiError};
use crate::widget::{Widget, WidgetId};

/// Ancestor chain, root first
pub type Ancestors = SmallVec<[WidgetId; 8]>;

/// Owner of all widgets
#[derive(Default)]
pub struct WidgetArena {
    widgets: SlotMap<WidgetId, Box<dyn Widget>>,
}

impl std::fmt::Debug for WidgetArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetArena")
            .field("widgets", &self.widgets.len())
            .finish()
    }
}

impl WidgetArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a top-level widget
    pub fn insert<W: Widget + 'static>(&mut self, mut widget: W) -> WidgetId {
        widget.state_mut().parent = None;
        self.widgets.insert(Box::new(widget))
    }

    /// Store a widget as a child of `parent`
    pub fn insert_child<W: Widget + 'static>(
        &mut self,
        parent: WidgetId,
        mut widget: W,
    ) -> Result<WidgetId> {
        if !self.widgets.contains_key(parent) {
            return Err(UiError::StaleWidget(parent));
        }
        widget.state_mut().parent = Some(parent);
        Ok(self.widgets.insert(Box::new(widget)))
    }

    /// Drop a widget and all of its descendants.
    ///
    /// Returns the removed ids, `id` first. Unknown ids remove nothing.
    pub fn remove(&mut self, id: WidgetId) -> Vec<WidgetId> {
        if !self.widgets.contains_key(id) {
            return Vec::new();
        }

        let mut removed = vec![id];
        let mut cursor = 0;
        while cursor < removed.len() {
            let current = removed[cursor];
            removed.extend(
                self.widgets
                    .iter()
                    .filter(|(_, w)| w.state().parent() == Some(current))
                    .map(|(child, _)| child),
            );
            cursor += 1;
        }

        for widget in &removed {
            self.widgets.remove(*widget);
        }
        tracing::debug!(count = removed.len(), "removed widgets from arena");
        removed
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains_key(id)
    }

    pub fn get(&self, id: WidgetId) -> Option<&dyn Widget> {
        self.widgets.get(id).map(|w| w.as_ref())
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut (dyn Widget + 'static)> {
        self.widgets.get_mut(id).map(|w| w.as_mut())
    }

    /// Typed access to a widget
    pub fn get_as<T: Widget + 'static>(&self, id: WidgetId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    pub fn get_as_mut<T: Widget + 'static>(&mut self, id: WidgetId) -> Option<&mut T> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.widgets.keys()
    }

    /// Ancestors of `id` from the top-level widget down to the immediate
    /// parent. Empty for top-level widgets.
    ///
    /// Fails if `id` or any ancestor has been removed.
    pub fn ancestors(&self, id: WidgetId) -> Result<Ancestors> {
        let mut chain = Ancestors::new();
        let mut current = self.get(id).ok_or(UiError::StaleWidget(id))?.state().parent();

        while let Some(parent) = current {
            let widget = self.get(parent).ok_or(UiError::StaleWidget(parent))?;
            chain.push(parent);
            current = widget.state().parent();
        }

        chain.reverse();
        Ok(chain)
    }

    /// Rect of `id` in canvas coordinates: its own rect offset by every
    /// ancestor's position. Scroll offsets are not applied.
    pub fn absolute_rect(&self, id: WidgetId) -> Option<Rect> {
        let state = self.get(id)?.state();
        let mut offset = Vec2::ZERO;
        let mut current = state.parent();

        while let Some(parent) = current {
            let Some(widget) = self.get(parent) else {
                tracing::trace!(?parent, "stale ancestor while resolving absolute rect");
                break;
            };
            offset = offset + widget.state().rect().origin.to_vec2();
            current = widget.state().parent();
        }

        Some(state.rect().translate(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetState;
    use arbor_core::geometry::Point;

    struct Panel {
        state: WidgetState,
        label: &'static str,
    }

    impl Panel {
        fn new(label: &'static str, x: f32, y: f32, w: f32, h: f32) -> Self {
            Self {
                state: WidgetState::new(Rect::new(x, y, w, h)),
                label,
            }
        }
    }

    impl Widget for Panel {
        fn state(&self) -> &WidgetState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut WidgetState {
            &mut self.state
        }
    }

    #[test]
    fn test_absolute_rect_sums_ancestor_positions() {
        let mut arena = WidgetArena::new();
        let root = arena.insert(Panel::new("root", 100.0, 50.0, 400.0, 300.0));
        let mid = arena.insert_child(root, Panel::new("mid", 10.0, 20.0, 200.0, 200.0)).unwrap();
        let leaf = arena.insert_child(mid, Panel::new("leaf", 5.0, 5.0, 10.0, 10.0)).unwrap();

        arena.get_mut(mid).unwrap().state_mut().set_scroll(Vec2::new(3.0, 3.0));

        assert_eq!(arena.absolute_rect(leaf), Some(Rect::new(115.0, 75.0, 10.0, 10.0)));
        assert_eq!(arena.ancestors(leaf).unwrap().as_slice(), &[root, mid]);
        assert!(arena.ancestors(root).unwrap().is_empty());
    }

    #[test]
    fn test_insert_child_of_stale_parent_fails() {
        let mut arena = WidgetArena::new();
        let root = arena.insert(Panel::new("root", 0.0, 0.0, 10.0, 10.0));
        arena.remove(root);

        let err = arena.insert_child(root, Panel::new("orphan", 0.0, 0.0, 1.0, 1.0));
        assert!(matches!(err, Err(UiError::StaleWidget(id)) if id == root));
    }

    #[test]
    fn test_remove_takes_descendants() {
        let mut arena = WidgetArena::new();
        let root = arena.insert(Panel::new("root", 0.0, 0.0, 10.0, 10.0));
        let a = arena.insert_child(root, Panel::new("a", 0.0, 0.0, 1.0, 1.0)).unwrap();
        let b = arena.insert_child(a, Panel::new("b", 0.0, 0.0, 1.0, 1.0)).unwrap();
        let other = arena.insert(Panel::new("other", 0.0, 0.0, 1.0, 1.0));

        let removed = arena.remove(a);
        assert_eq!(removed, vec![a, b]);
        assert!(arena.contains(root));
        assert!(arena.contains(other));
        assert!(arena.get(b).is_none());
        assert!(arena.absolute_rect(b).is_none());
        assert!(arena.remove(a).is_empty());
    }

    #[test]
    fn test_typed_access() {
        let mut arena = WidgetArena::new();
        let id = arena.insert(Panel::new("typed", 0.0, 0.0, 1.0, 1.0));

        assert_eq!(arena.get_as::<Panel>(id).map(|p| p.label), Some("typed"));
        arena.get_as_mut::<Panel>(id).unwrap().label = "renamed";
        assert_eq!(arena.get_as::<Panel>(id).unwrap().label, "renamed");

        arena.get_mut(id).unwrap().state_mut().set_position(Point::new(4.0, 4.0));
        assert_eq!(arena.absolute_rect(id), Some(Rect::new(4.0, 4.0, 1.0, 1.0)));
    }
}
