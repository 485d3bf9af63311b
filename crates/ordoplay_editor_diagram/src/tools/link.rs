// SPDX-License-Identifier: MIT OR Apache-2.0
//! Creating links and dragging link ends or control points.

use super::{DragOutcome, Gesture, Overlay, ToolContext};
use crate::geometry::{Pos2, Vec2};
use crate::graph::{Graph, GraphError};
use crate::link::{Link, LinkEnd, LinkEndpointSnapshot, LinkId, LinkSide};
use crate::port::PortId;

/// Part of a link grabbed by the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHandle {
    /// Source end
    Source,
    /// Target end
    Target,
    /// Control point at an index
    ControlPoint(usize),
}

impl LinkHandle {
    fn side(self) -> Option<LinkSide> {
        match self {
            Self::Source => Some(LinkSide::Source),
            Self::Target => Some(LinkSide::Target),
            Self::ControlPoint(_) => None,
        }
    }
}

impl From<LinkSide> for LinkHandle {
    fn from(side: LinkSide) -> Self {
        match side {
            LinkSide::Source => Self::Source,
            LinkSide::Target => Self::Target,
        }
    }
}

/// A link drag
#[derive(Debug, Clone)]
pub struct LinkSession {
    link: LinkId,
    handle: LinkHandle,
    origin: Pos2,
    /// Endpoint state before the gesture
    snapshot: LinkEndpointSnapshot,
    /// Whether the link was created by this gesture
    created: bool,
    /// Compatible port under the dragged end
    hovered: Option<PortId>,
}

impl LinkSession {
    /// Create a link starting at `port` and drag its free end.
    ///
    /// A port that only accepts incoming links is bound as the target,
    /// anything else as the source.
    pub fn begin_new_link(graph: &mut Graph, origin: Pos2, port: PortId) -> Result<Self, GraphError> {
        let anchor = graph.port(port).ok_or(GraphError::PortNotFound(port))?;
        let bound_side = if anchor.accepts(LinkSide::Source) || !anchor.accepts(LinkSide::Target) {
            LinkSide::Source
        } else {
            LinkSide::Target
        };
        let link = match bound_side {
            LinkSide::Source => Link::new(LinkEnd::Port(port), LinkEnd::Floating(origin)),
            LinkSide::Target => Link::new(LinkEnd::Floating(origin), LinkEnd::Port(port)),
        };
        let snapshot = link.snapshot();
        let link = graph.add_link(link)?;
        tracing::debug!(?link, ?bound_side, "begin new link");

        Ok(Self {
            link,
            handle: bound_side.opposite().into(),
            origin,
            snapshot,
            created: true,
            hovered: None,
        })
    }

    /// Start dragging one end or control point of an existing link
    pub fn begin(
        graph: &mut Graph,
        origin: Pos2,
        link_id: LinkId,
        handle: LinkHandle,
    ) -> Result<Self, GraphError> {
        let link = graph.link(link_id).ok_or(GraphError::LinkNotFound(link_id))?;
        let snapshot = link.snapshot();

        if let LinkHandle::ControlPoint(index) = handle {
            // Automatic routing has no stored control points yet; pin the
            // routed interior so it can be edited
            if link.control_points().is_empty() {
                let interior = link.path().map(|p| p.interior().to_vec()).unwrap_or_default();
                graph.set_link_control_points(link_id, interior)?;
            }
            let count = graph.link(link_id).map_or(0, |l| l.control_points().len());
            if index >= count {
                graph.restore_link(link_id, &snapshot)?;
                return Err(GraphError::ControlPointOutOfRange {
                    link: link_id,
                    index,
                });
            }
        }

        let hovered = handle.side().and_then(|side| {
            let port = snapshot_end(&snapshot, side).port()?;
            graph
                .port(port)
                .filter(|p| p.accepts(side))
                .map(|p| p.id)
        });
        tracing::debug!(link = ?link_id, ?handle, "begin link drag");

        Ok(Self {
            link: link_id,
            handle,
            origin,
            snapshot,
            created: false,
            hovered,
        })
    }

    /// Link being edited
    pub fn link(&self) -> LinkId {
        self.link
    }

    /// Grabbed handle
    pub fn handle(&self) -> LinkHandle {
        self.handle
    }

    /// Whether the link was created by this gesture
    pub fn is_new(&self) -> bool {
        self.created
    }

    /// Compatible port currently under the dragged end
    pub fn hovered_port(&self) -> Option<PortId> {
        self.hovered
    }

    fn drag_end(&mut self, graph: &mut Graph, side: LinkSide, pointer: Pos2) -> Result<(), GraphError> {
        let fixed = graph
            .link(self.link)
            .ok_or(GraphError::LinkNotFound(self.link))?
            .end(side.opposite())
            .port();
        self.hovered = graph.nearest_port(pointer, fixed, |port| port.accepts(side));
        let end = match self.hovered {
            Some(port) => LinkEnd::Port(port),
            None => LinkEnd::Floating(pointer),
        };
        graph.set_link_end(self.link, side, end)
    }
}

fn snapshot_end(snapshot: &LinkEndpointSnapshot, side: LinkSide) -> LinkEnd {
    match side {
        LinkSide::Source => snapshot.source,
        LinkSide::Target => snapshot.target,
    }
}

impl Gesture for LinkSession {
    fn origin(&self) -> Pos2 {
        self.origin
    }

    fn drag_to(&mut self, ctx: &mut ToolContext<'_>, vector: Vec2) {
        let pointer = self.origin + vector;
        let result = match self.handle {
            LinkHandle::Source => self.drag_end(ctx.graph, LinkSide::Source, pointer),
            LinkHandle::Target => self.drag_end(ctx.graph, LinkSide::Target, pointer),
            LinkHandle::ControlPoint(index) => {
                ctx.graph.set_link_control_point(self.link, index, pointer)
            }
        };
        if let Err(e) = result {
            tracing::warn!("Link drag failed: {e}");
        }
        tracing::trace!(link = ?self.link, hovered = ?self.hovered, "link drag");
    }

    fn can_drop(&self) -> bool {
        match self.handle {
            LinkHandle::ControlPoint(_) => true,
            LinkHandle::Source | LinkHandle::Target => self.hovered.is_some(),
        }
    }

    fn end(self, ctx: &mut ToolContext<'_>, commit: bool) -> DragOutcome {
        if commit && self.can_drop() {
            if self.handle.side().is_some() {
                if let Some(link) = ctx.graph.link(self.link) {
                    if self.created || link.snapshot().ends_differ(&self.snapshot) {
                        tracing::info!("Committing link {:?}", self.link);
                        ctx.controller.update_link(&self.snapshot, link);
                    }
                }
            }
            return DragOutcome::Committed;
        }

        if self.created {
            ctx.graph.remove_link(self.link);
            tracing::debug!(link = ?self.link, "new link discarded");
        } else if let Err(e) = ctx.graph.restore_link(self.link, &self.snapshot) {
            tracing::warn!("Cannot restore link: {e}");
        }
        DragOutcome::RolledBack
    }

    fn overlay(&self) -> Option<Overlay> {
        Some(Overlay::LinkPreview {
            link: self.link,
            allowed: self.can_drop(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::port::Port;
    use crate::routing::Routing;
    use crate::tools::testing::Harness;

    struct Fixture {
        h: Harness,
        out: PortId,
        input: PortId,
        other_out: PortId,
    }

    /// `a.out` at (40, 10), `b.in` at (100, 10), `c.out` at (140, 70)
    fn fixture() -> Fixture {
        let mut graph = Graph::new("links");
        let out = Port::output("out");
        let input = Port::input("in");
        let other_out = Port::output("out");
        let ids = (out.id, input.id, other_out.id);
        graph.add_node(Node::at("a", 0.0, 0.0, 40.0, 20.0).with_port(out));
        graph.add_node(Node::at("b", 100.0, 0.0, 40.0, 20.0).with_port(input));
        graph.add_node(Node::at("c", 100.0, 60.0, 40.0, 20.0).with_port(other_out));
        Fixture {
            h: Harness::new(graph),
            out: ids.0,
            input: ids.1,
            other_out: ids.2,
        }
    }

    fn assert_exclusive(graph: &Graph) {
        for link in graph.links() {
            for end in [link.source(), link.target()] {
                assert!(end.port().is_some() ^ end.point().is_some());
            }
        }
    }

    #[test]
    fn test_new_link_binds_output_as_source() {
        let mut f = fixture();
        let start = Pos2::new(40.0, 10.0);
        let mut session = LinkSession::begin_new_link(&mut f.h.graph, start, f.out).unwrap();
        assert_eq!(session.handle(), LinkHandle::Target);

        session.drag_to(&mut f.h.ctx(), Vec2::new(58.0, 2.0));
        assert_eq!(session.hovered_port(), Some(f.input));
        assert!(session.can_drop());

        let link = session.link();
        assert_eq!(session.end(&mut f.h.ctx(), true), DragOutcome::Committed);

        let link = f.h.graph.link(link).unwrap();
        assert_eq!(link.source(), LinkEnd::Port(f.out));
        assert_eq!(link.target(), LinkEnd::Port(f.input));
        assert_eq!(f.h.controller.link_calls.len(), 1);
        assert_exclusive(&f.h.graph);
    }

    #[test]
    fn test_new_link_from_input_binds_as_target() {
        let mut f = fixture();
        let session =
            LinkSession::begin_new_link(&mut f.h.graph, Pos2::new(100.0, 10.0), f.input).unwrap();
        let link = f.h.graph.link(session.link()).unwrap();
        assert_eq!(link.target(), LinkEnd::Port(f.input));
        assert_eq!(session.handle(), LinkHandle::Source);
    }

    #[test]
    fn test_new_link_released_in_empty_space_is_removed() {
        let mut f = fixture();
        let mut session =
            LinkSession::begin_new_link(&mut f.h.graph, Pos2::new(40.0, 10.0), f.out).unwrap();
        session.drag_to(&mut f.h.ctx(), Vec2::new(20.0, 200.0));
        assert!(!session.can_drop());

        assert_eq!(session.end(&mut f.h.ctx(), true), DragOutcome::RolledBack);
        assert_eq!(f.h.graph.link_count(), 0);
        assert_eq!(f.h.graph.port(f.out).unwrap().link_count(), 0);
        assert!(f.h.controller.link_calls.is_empty());
    }

    #[test]
    fn test_target_drag_never_binds_outgoing_only_port() {
        let mut f = fixture();
        let link = f.h.graph.connect(f.out, f.input).unwrap();
        let mut session =
            LinkSession::begin(&mut f.h.graph, Pos2::new(100.0, 10.0), link, LinkHandle::Target)
                .unwrap();

        // right on top of c.out
        session.drag_to(&mut f.h.ctx(), Vec2::new(40.0, 60.0));

        assert_eq!(session.hovered_port(), None);
        assert_eq!(
            f.h.graph.link(link).unwrap().target(),
            LinkEnd::Floating(Pos2::new(140.0, 70.0))
        );
        assert_exclusive(&f.h.graph);
        session.end(&mut f.h.ctx(), false);
    }

    #[test]
    fn test_rebinding_source_reports_snapshot() {
        let mut f = fixture();
        let link = f.h.graph.connect(f.out, f.input).unwrap();
        let before = f.h.graph.link(link).unwrap().snapshot();
        let mut session =
            LinkSession::begin(&mut f.h.graph, Pos2::new(40.0, 10.0), link, LinkHandle::Source)
                .unwrap();

        session.drag_to(&mut f.h.ctx(), Vec2::new(50.0, 30.0));
        session.drag_to(&mut f.h.ctx(), Vec2::new(99.0, 59.0));
        assert_eq!(session.hovered_port(), Some(f.other_out));
        assert_eq!(session.end(&mut f.h.ctx(), true), DragOutcome::Committed);

        let (initial, id, after) = &f.h.controller.link_calls[0];
        assert_eq!(initial, &before);
        assert_eq!(*id, link);
        assert_eq!(after.source, LinkEnd::Port(f.other_out));
        assert_eq!(f.h.graph.port(f.out).unwrap().link_count(), 0);
        assert_eq!(f.h.graph.port(f.other_out).unwrap().link_count(), 1);
    }

    #[test]
    fn test_rollback_restores_existing_link() {
        let mut f = fixture();
        let link = f.h.graph.connect(f.out, f.input).unwrap();
        let before = f.h.graph.link(link).unwrap().snapshot();
        let mut session =
            LinkSession::begin(&mut f.h.graph, Pos2::new(100.0, 10.0), link, LinkHandle::Target)
                .unwrap();

        session.drag_to(&mut f.h.ctx(), Vec2::new(10.0, 90.0));
        session.drag_to(&mut f.h.ctx(), Vec2::new(-20.0, 40.0));
        assert_eq!(session.end(&mut f.h.ctx(), false), DragOutcome::RolledBack);

        assert_eq!(f.h.graph.link(link).unwrap().snapshot(), before);
        assert_eq!(f.h.graph.port(f.input).unwrap().link_count(), 1);
        assert!(f.h.controller.link_calls.is_empty());
    }

    #[test]
    fn test_releasing_on_same_port_is_not_reported() {
        let mut f = fixture();
        let link = f.h.graph.connect(f.out, f.input).unwrap();
        let mut session =
            LinkSession::begin(&mut f.h.graph, Pos2::new(100.0, 10.0), link, LinkHandle::Target)
                .unwrap();
        session.drag_to(&mut f.h.ctx(), Vec2::new(2.0, 1.0));

        assert_eq!(session.end(&mut f.h.ctx(), true), DragOutcome::Committed);
        assert!(f.h.controller.link_calls.is_empty());
    }

    #[test]
    fn test_control_point_edits_are_local() {
        let mut f = fixture();
        let link = f
            .h
            .graph
            .add_link(Link::between(f.out, f.input).with_routing(Routing::Orthogonal))
            .unwrap();
        let mut session = LinkSession::begin(
            &mut f.h.graph,
            Pos2::new(70.0, 10.0),
            link,
            LinkHandle::ControlPoint(0),
        )
        .unwrap();
        assert!(session.can_drop());

        session.drag_to(&mut f.h.ctx(), Vec2::new(5.0, 30.0));
        assert_eq!(
            f.h.graph.link(link).unwrap().control_points()[0],
            Pos2::new(75.0, 40.0)
        );

        assert_eq!(session.end(&mut f.h.ctx(), true), DragOutcome::Committed);
        assert!(f.h.controller.link_calls.is_empty());

        let path = f.h.graph.link(link).unwrap().path().unwrap();
        assert!(path.points().contains(&Pos2::new(75.0, 40.0)));
        for w in path.points().windows(2) {
            assert!(w[0].x == w[1].x || w[0].y == w[1].y, "diagonal {:?}", w);
        }
    }

    #[test]
    fn test_control_point_out_of_range_leaves_link_untouched() {
        let mut f = fixture();
        let link = f.h.graph.connect(f.out, f.input).unwrap();
        let before = f.h.graph.link(link).unwrap().snapshot();

        let result = LinkSession::begin(&mut f.h.graph, Pos2::ZERO, link, LinkHandle::ControlPoint(9));

        assert!(matches!(result, Err(GraphError::ControlPointOutOfRange { .. })));
        assert_eq!(f.h.graph.link(link).unwrap().snapshot(), before);
    }
}
