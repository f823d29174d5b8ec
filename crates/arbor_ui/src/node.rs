//! Window node - one widget and its ordered children
//!
//! A node owns its child nodes, never the widgets. Child order is insertion
//! order: later children are drawn on top and win hit-tests.

use arbor_core::draw::DrawContext;
use arbor_core::geometry::{Rect, ScissorRect, Size};

use crate::arena::WidgetArena;
use crate::widget::{Widget, WidgetId};

/// A widget's position in the window tree
#[derive(Clone, Debug, PartialEq)]
pub struct WindowNode {
    widget: WidgetId,
    children: Vec<WindowNode>,
}

impl WindowNode {
    pub fn new(widget: WidgetId) -> Self {
        Self {
            widget,
            children: Vec::new(),
        }
    }

    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    pub fn children(&self) -> &[WindowNode] {
        &self.children
    }

    /// Append a child node and return it
    pub fn add_child(&mut self, widget: WidgetId) -> &mut WindowNode {
        self.children.push(WindowNode::new(widget));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Immediate child wrapping `widget`
    pub fn find(&self, widget: WidgetId) -> Option<&WindowNode> {
        self.children.iter().find(|child| child.widget == widget)
    }

    pub fn find_mut(&mut self, widget: WidgetId) -> Option<&mut WindowNode> {
        self.children.iter_mut().find(|child| child.widget == widget)
    }

    /// Detach the immediate child wrapping `widget`
    pub(crate) fn take_child(&mut self, widget: WidgetId) -> Option<WindowNode> {
        let pos = self.children.iter().position(|child| child.widget == widget)?;
        Some(self.children.remove(pos))
    }

    /// Search the whole subtree, this node included
    pub(crate) fn find_deep(&self, widget: WidgetId) -> Option<&WindowNode> {
        if self.widget == widget {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_deep(widget))
    }

    /// Detach `widget` from anywhere below this node
    pub(crate) fn detach_deep(&mut self, widget: WidgetId) -> Option<WindowNode> {
        if let Some(node) = self.take_child(widget) {
            return Some(node);
        }
        self.children.iter_mut().find_map(|child| child.detach_deep(widget))
    }

    /// Widget ids of this subtree in pre-order
    pub fn ids(&self) -> Vec<WidgetId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<WidgetId>) {
        out.push(self.widget);
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    /// Number of nodes in this subtree
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(WindowNode::len).sum::<usize>()
    }

    /// Paint this node's widget and everything below it.
    ///
    /// Does nothing if the widget is gone or hidden. Children get their
    /// overlay pass after their own subtree; the node the traversal starts
    /// from does not.
    pub fn draw_subtree(&self, widgets: &WidgetArena, ctx: &mut dyn DrawContext, canvas: Size) {
        let Some((widget, absolute)) = visible(widgets, self.widget) else {
            return;
        };

        ctx.save();
        let clipped = begin_clip(widget, absolute, ctx, canvas);
        paint(widget, absolute, ctx);
        self.draw_children(widgets, ctx, canvas);
        if clipped {
            ctx.pop_scissor();
        }
        ctx.restore();
    }

    fn draw_children(&self, widgets: &WidgetArena, ctx: &mut dyn DrawContext, canvas: Size) {
        for child in &self.children {
            let Some((widget, absolute)) = visible(widgets, child.widget) else {
                continue;
            };

            ctx.save();
            let clipped = begin_clip(widget, absolute, ctx, canvas);
            paint(widget, absolute, ctx);
            child.draw_children(widgets, ctx, canvas);

            ctx.load_identity();
            ctx.translate(absolute.origin.to_vec2());
            widget.paint_overlay(ctx);

            if clipped {
                ctx.pop_scissor();
            }
            ctx.restore();
        }
    }
}

fn visible(widgets: &WidgetArena, id: WidgetId) -> Option<(&dyn Widget, Rect)> {
    let Some(widget) = widgets.get(id) else {
        tracing::trace!(?id, "skipping stale node while drawing");
        return None;
    };
    if !widget.state().is_shown() {
        return None;
    }
    let absolute = widgets.absolute_rect(id)?;
    Some((widget, absolute))
}

fn begin_clip(
    widget: &dyn Widget,
    absolute: Rect,
    ctx: &mut dyn DrawContext,
    canvas: Size,
) -> bool {
    let state = widget.state();
    if !state.is_block_drawing() {
        return false;
    }
    ctx.push_scissor(ScissorRect::from_ui(absolute, state.shown_rect(), canvas.height));
    true
}

fn paint(widget: &dyn Widget, absolute: Rect, ctx: &mut dyn DrawContext) {
    ctx.load_identity();
    ctx.translate((absolute.origin - widget.state().scroll()).to_vec2());
    widget.paint(ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<WidgetId> {
        let mut map: SlotMap<WidgetId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let ids = ids(4);
        let mut root = WindowNode::new(ids[0]);
        root.add_child(ids[1]);
        root.add_child(ids[2]).add_child(ids[3]);

        let order: Vec<_> = root.children().iter().map(WindowNode::widget).collect();
        assert_eq!(order, vec![ids[1], ids[2]]);
        assert_eq!(root.ids(), ids);
        assert_eq!(root.len(), 4);
    }

    #[test]
    fn test_find_is_shallow() {
        let ids = ids(3);
        let mut root = WindowNode::new(ids[0]);
        root.add_child(ids[1]).add_child(ids[2]);

        assert!(root.find(ids[1]).is_some());
        assert!(root.find(ids[2]).is_none());
        assert_eq!(root.find_deep(ids[2]).map(WindowNode::widget), Some(ids[2]));
    }

    #[test]
    fn test_detach_deep_takes_subtree() {
        let ids = ids(4);
        let mut root = WindowNode::new(ids[0]);
        root.add_child(ids[1]).add_child(ids[2]);
        root.add_child(ids[3]);

        let detached = root.detach_deep(ids[1]).unwrap();
        assert_eq!(detached.ids(), vec![ids[1], ids[2]]);
        assert_eq!(root.ids(), vec![ids[0], ids[3]]);
        assert!(root.detach_deep(ids[2]).is_none());
    }
}
