//! Window tree management
//!
//! The tree mirrors the widgets' parent links as a forest of
//! [`WindowNode`]s. Normal roots come first; priority roots (floating
//! windows) always follow them, so they draw last and win hit-tests.

use arbor_core::draw::DrawContext;
use arbor_core::geometry::{Point, Size};

use crate::arena::WidgetArena;
use crate::error::{Result, UiError};
use crate::node::WindowNode;
use crate::widget::WidgetId;

/// Forest of window nodes
#[derive(Clone, Debug, Default)]
pub struct WindowTree {
    roots: Vec<WindowNode>,
    priority_roots: Vec<WindowNode>,
}

impl WindowTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `widget` under its parent's node, or as a new root if it is
    /// top-level. The parent chain must already be in the tree.
    pub fn insert(&mut self, widgets: &WidgetArena, widget: WidgetId) -> Result<()> {
        self.insert_inner(widgets, widget, false)
    }

    /// Like [`insert`](Self::insert), but top-level widgets become priority
    /// roots
    pub fn insert_priority(&mut self, widgets: &WidgetArena, widget: WidgetId) -> Result<()> {
        self.insert_inner(widgets, widget, true)
    }

    fn insert_inner(
        &mut self,
        widgets: &WidgetArena,
        widget: WidgetId,
        priority: bool,
    ) -> Result<()> {
        let chain = widgets.ancestors(widget)?;
        if self.contains_id(widget) {
            return Err(UiError::AlreadyInTree(widget));
        }

        let Some((&root, rest)) = chain.split_first() else {
            if priority {
                self.priority_roots.push(WindowNode::new(widget));
            } else {
                self.roots.push(WindowNode::new(widget));
            }
            tracing::debug!(?widget, priority, "added root window");
            return Ok(());
        };

        let mut node = self.root_mut(root).ok_or(UiError::ParentNotInTree(root))?;
        for &ancestor in rest {
            node = node.find_mut(ancestor).ok_or(UiError::ParentNotInTree(ancestor))?;
        }
        node.add_child(widget);

        tracing::debug!(?widget, depth = chain.len(), "added child window");
        Ok(())
    }

    /// Detach `widget` and its subtree. Returns the removed ids in
    /// pre-order; empty if the widget was not in the tree.
    pub fn remove(&mut self, widget: WidgetId) -> Vec<WidgetId> {
        for roots in [&mut self.roots, &mut self.priority_roots] {
            if let Some(pos) = roots.iter().position(|root| root.widget() == widget) {
                let removed = roots.remove(pos).ids();
                tracing::debug!(?widget, count = removed.len(), "removed root window");
                return removed;
            }
        }

        let detached = self
            .roots
            .iter_mut()
            .chain(self.priority_roots.iter_mut())
            .find_map(|root| root.detach_deep(widget));

        match detached {
            Some(node) => {
                let removed = node.ids();
                tracing::debug!(?widget, count = removed.len(), "removed child window");
                removed
            }
            None => Vec::new(),
        }
    }

    /// Resolve a widget's node by walking its ancestor chain
    pub fn find_node(&self, widgets: &WidgetArena, widget: WidgetId) -> Option<&WindowNode> {
        let chain = widgets.ancestors(widget).ok()?;
        let mut node = match chain.split_first() {
            None => return self.root(widget),
            Some((&root, _)) => self.root(root)?,
        };
        for &ancestor in chain.iter().skip(1) {
            node = node.find(ancestor)?;
        }
        node.find(widget)
    }

    pub fn contains(&self, widgets: &WidgetArena, widget: WidgetId) -> bool {
        self.find_node(widgets, widget).is_some()
    }

    /// Topmost shown widget under `point`, if any.
    ///
    /// Among roots and among siblings the last match wins. Descent only
    /// enters children that are shown and selectable.
    pub fn hit_test(&self, widgets: &WidgetArena, point: Point) -> Option<WidgetId> {
        let mut node = self
            .roots
            .iter()
            .chain(self.priority_roots.iter())
            .rev()
            .find(|root| {
                widgets
                    .absolute_rect(root.widget())
                    .is_some_and(|rect| rect.contains(point))
            })?;

        while let Some(child) = node
            .children()
            .iter()
            .rev()
            .find(|child| is_target(widgets, child.widget(), point))
        {
            node = child;
        }

        let hit = node.widget();
        let state = widgets.get(hit)?.state();
        state.is_shown().then_some(hit)
    }

    /// Paint every root, normal roots first
    pub fn draw_all(&self, widgets: &WidgetArena, ctx: &mut dyn DrawContext, canvas: Size) {
        for root in self.iter_roots() {
            root.draw_subtree(widgets, ctx, canvas);
        }
    }

    /// Roots in draw order
    pub fn iter_roots(&self) -> impl Iterator<Item = &WindowNode> {
        self.roots.iter().chain(self.priority_roots.iter())
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.iter_roots().map(WindowNode::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.priority_roots.is_empty()
    }

    pub fn clear(&mut self) {
        self.roots.clear();
        self.priority_roots.clear();
    }

    fn root(&self, widget: WidgetId) -> Option<&WindowNode> {
        self.iter_roots().find(|root| root.widget() == widget)
    }

    fn root_mut(&mut self, widget: WidgetId) -> Option<&mut WindowNode> {
        self.roots
            .iter_mut()
            .chain(self.priority_roots.iter_mut())
            .find(|root| root.widget() == widget)
    }

    fn contains_id(&self, widget: WidgetId) -> bool {
        self.iter_roots().any(|root| root.find_deep(widget).is_some())
    }
}

fn is_target(widgets: &WidgetArena, id: WidgetId, point: Point) -> bool {
    let Some(widget) = widgets.get(id) else {
        tracing::trace!(?id, "skipping stale node while hit-testing");
        return false;
    };
    let state = widget.state();
    state.is_shown()
        && state.is_selectable()
        && widgets.absolute_rect(id).is_some_and(|rect| rect.contains(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Widget, WidgetState};
    use arbor_core::geometry::Rect;

    struct Block(WidgetState);

    impl Widget for Block {
        fn state(&self) -> &WidgetState {
            &self.0
        }

        fn state_mut(&mut self) -> &mut WidgetState {
            &mut self.0
        }
    }

    fn block(x: f32, y: f32, w: f32, h: f32) -> Block {
        Block(WidgetState::new(Rect::new(x, y, w, h)))
    }

    #[test]
    fn test_child_before_parent_fails() {
        let mut arena = WidgetArena::new();
        let mut tree = WindowTree::new();
        let root = arena.insert(block(0.0, 0.0, 100.0, 100.0));
        let child = arena.insert_child(root, block(10.0, 10.0, 20.0, 20.0)).unwrap();

        assert!(matches!(
            tree.insert(&arena, child),
            Err(UiError::ParentNotInTree(id)) if id == root
        ));
        assert!(tree.is_empty());

        tree.insert(&arena, root).unwrap();
        tree.insert(&arena, child).unwrap();
        let node = tree.find_node(&arena, root).unwrap();
        assert_eq!(node.children()[0].widget(), child);
        assert!(tree.contains(&arena, child));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_double_insert_rejected() {
        let mut arena = WidgetArena::new();
        let mut tree = WindowTree::new();
        let root = arena.insert(block(0.0, 0.0, 10.0, 10.0));

        tree.insert(&arena, root).unwrap();
        assert!(matches!(tree.insert_priority(&arena, root), Err(UiError::AlreadyInTree(_))));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_stale_widget_rejected() {
        let mut arena = WidgetArena::new();
        let mut tree = WindowTree::new();
        let gone = arena.insert(block(0.0, 0.0, 10.0, 10.0));
        arena.remove(gone);

        assert!(matches!(tree.insert(&arena, gone), Err(UiError::StaleWidget(_))));
    }

    #[test]
    fn test_hit_test_scenario() {
        let mut arena = WidgetArena::new();
        let mut tree = WindowTree::new();
        let r = arena.insert(block(0.0, 0.0, 100.0, 100.0));
        let c = arena.insert_child(r, block(10.0, 10.0, 20.0, 20.0)).unwrap();
        tree.insert(&arena, r).unwrap();
        tree.insert(&arena, c).unwrap();

        assert_eq!(tree.hit_test(&arena, Point::new(15.0, 15.0)), Some(c));
        assert_eq!(tree.hit_test(&arena, Point::new(50.0, 50.0)), Some(r));
        assert_eq!(tree.hit_test(&arena, Point::new(150.0, 150.0)), None);
    }

    #[test]
    fn test_priority_root_wins_hit_test() {
        let mut arena = WidgetArena::new();
        let mut tree = WindowTree::new();
        let floating = arena.insert(block(0.0, 0.0, 50.0, 50.0));
        let main = arena.insert(block(0.0, 0.0, 100.0, 100.0));

        tree.insert_priority(&arena, floating).unwrap();
        tree.insert(&arena, main).unwrap();

        assert_eq!(tree.hit_test(&arena, Point::new(10.0, 10.0)), Some(floating));
        assert_eq!(tree.hit_test(&arena, Point::new(80.0, 80.0)), Some(main));
        let order: Vec<_> = tree.iter_roots().map(WindowNode::widget).collect();
        assert_eq!(order, vec![main, floating]);
    }

    #[test]
    fn test_remove_subtree() {
        let mut arena = WidgetArena::new();
        let mut tree = WindowTree::new();
        let root = arena.insert(block(0.0, 0.0, 100.0, 100.0));
        let a = arena.insert_child(root, block(0.0, 0.0, 50.0, 50.0)).unwrap();
        let b = arena.insert_child(a, block(0.0, 0.0, 10.0, 10.0)).unwrap();
        for id in [root, a, b] {
            tree.insert(&arena, id).unwrap();
        }

        assert_eq!(tree.remove(a), vec![a, b]);
        assert_eq!(tree.len(), 1);
        assert!(tree.remove(a).is_empty());
        assert_eq!(tree.hit_test(&arena, Point::new(5.0, 5.0)), Some(root));

        assert_eq!(tree.remove(root), vec![root]);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_stale_child_is_skipped() {
        let mut arena = WidgetArena::new();
        let mut tree = WindowTree::new();
        let root = arena.insert(block(0.0, 0.0, 100.0, 100.0));
        let child = arena.insert_child(root, block(0.0, 0.0, 50.0, 50.0)).unwrap();
        tree.insert(&arena, root).unwrap();
        tree.insert(&arena, child).unwrap();

        arena.remove(child);
        assert_eq!(tree.hit_test(&arena, Point::new(5.0, 5.0)), Some(root));
    }
}
