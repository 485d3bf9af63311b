// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rubber-band selection.

use super::{DragOutcome, Gesture, Overlay, ToolContext};
use crate::geometry::{self, Pos2, Rect, Vec2};
use crate::graph::Graph;
use crate::item::ItemId;

/// A rubber-band gesture; it never touches the graph until it ends
#[derive(Debug, Clone)]
pub struct RubberBandSession {
    origin: Pos2,
    corner: Pos2,
}

impl RubberBandSession {
    /// Start a rectangle at `origin`
    pub fn begin(origin: Pos2) -> Self {
        tracing::debug!(?origin, "begin rubber band");
        Self {
            origin,
            corner: origin,
        }
    }

    /// Current normalized rectangle
    pub fn rect(&self) -> Rect {
        geometry::rect_from_corners(self.origin, self.corner)
    }

    /// Selectable items whose bounds lie entirely inside the rectangle
    pub fn enclosed_items(&self, graph: &Graph) -> Vec<ItemId> {
        let rect = self.rect();
        graph
            .items()
            .filter(|item| item.capabilities().selectable)
            .filter(|item| item.bounds().is_some_and(|b| geometry::contains_rect(rect, b)))
            .map(|item| item.item_id())
            .collect()
    }
}

impl Gesture for RubberBandSession {
    fn origin(&self) -> Pos2 {
        self.origin
    }

    fn drag_to(&mut self, _ctx: &mut ToolContext<'_>, vector: Vec2) {
        self.corner = self.origin + vector;
    }

    fn can_drop(&self) -> bool {
        true
    }

    fn end(self, ctx: &mut ToolContext<'_>, commit: bool) -> DragOutcome {
        if !commit {
            return DragOutcome::RolledBack;
        }
        let items = self.enclosed_items(ctx.graph);
        tracing::debug!(count = items.len(), "rubber band selected");
        ctx.selection.set_range(&mut *ctx.graph, items);
        DragOutcome::Committed
    }

    fn overlay(&self) -> Option<Overlay> {
        Some(Overlay::RubberBand(self.rect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeId};
    use crate::tools::testing::Harness;

    fn abc() -> (Harness, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new("band");
        let a = graph.add_node(Node::at("a", 0.0, 0.0, 10.0, 10.0));
        let b = graph.add_node(Node::at("b", 20.0, 20.0, 10.0, 10.0));
        let c = graph.add_node(Node::at("c", 5.0, 5.0, 8.0, 8.0));
        (Harness::new(graph), a, b, c)
    }

    #[test]
    fn test_selects_contained_items_only() {
        let (mut h, a, b, c) = abc();
        let mut session = RubberBandSession::begin(Pos2::ZERO);
        session.drag_to(&mut h.ctx(), Vec2::new(15.0, 15.0));

        assert_eq!(session.end(&mut h.ctx(), true), DragOutcome::Committed);

        let selected: Vec<ItemId> = h.selection.items().collect();
        assert_eq!(selected, vec![ItemId::Node(a), ItemId::Node(c)]);
        assert!(!h.selection.contains(ItemId::Node(b)));
        let primary = h.selection.primary().unwrap();
        assert!(primary == ItemId::Node(a) || primary == ItemId::Node(c));
    }

    #[test]
    fn test_dragging_up_left_normalizes() {
        let (mut h, a, _, c) = abc();
        let mut session = RubberBandSession::begin(Pos2::new(15.0, 15.0));
        session.drag_to(&mut h.ctx(), Vec2::new(-15.0, -15.0));
        assert_eq!(session.rect(), Rect::from_min_max(Pos2::ZERO, Pos2::new(15.0, 15.0)));
        session.end(&mut h.ctx(), true);
        assert_eq!(h.selection.len(), 2);
        assert!(h.selection.contains(ItemId::Node(a)) && h.selection.contains(ItemId::Node(c)));
    }

    #[test]
    fn test_rollback_keeps_selection() {
        let (mut h, _, b, _) = abc();
        h.selection.set(&mut h.graph, ItemId::Node(b));
        let mut session = RubberBandSession::begin(Pos2::ZERO);
        session.drag_to(&mut h.ctx(), Vec2::new(15.0, 15.0));

        assert_eq!(session.end(&mut h.ctx(), false), DragOutcome::RolledBack);
        assert_eq!(h.selection.items().collect::<Vec<_>>(), vec![ItemId::Node(b)]);
    }
}
