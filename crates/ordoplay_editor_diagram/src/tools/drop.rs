// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inserting nodes dragged in from outside the surface.

use super::{Overlay, ToolContext};
use crate::geometry::{self, Pos2, Rect, Vec2};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortId};

/// What an external drag carries
#[derive(Debug, Clone)]
pub struct DropPayload {
    /// Host-defined node kind
    pub kind: String,
    /// Node size in grid cells
    pub size_cells: [u32; 2],
    /// Port templates; each dropped node gets fresh port IDs
    pub ports: Vec<Port>,
}

impl DropPayload {
    /// Payload for a node of one cell
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            size_cells: [1, 1],
            ports: Vec::new(),
        }
    }

    /// Set the size in grid cells
    pub fn with_size(mut self, columns: u32, rows: u32) -> Self {
        self.size_cells = [columns.max(1), rows.max(1)];
        self
    }

    /// Add a port template
    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    /// Bounds of the node when dropped at `position`
    pub fn bounds_at(&self, position: Pos2, cell: f32) -> Rect {
        let size = Vec2::new(self.size_cells[0] as f32, self.size_cells[1] as f32) * cell;
        Rect::from_min_size(geometry::cell_origin(position, cell), size)
    }

    fn instantiate(&self, bounds: Rect) -> Node {
        self.ports
            .iter()
            .fold(Node::new(self.kind.clone(), bounds), |node, template| {
                let mut port = template.clone();
                port.id = PortId::new();
                node.with_port(port)
            })
    }
}

/// An external drag hovering the surface
#[derive(Debug, Clone)]
pub struct DropSession {
    payload: DropPayload,
    bounds: Rect,
    allowed: bool,
}

impl DropSession {
    /// Start tracking an external drag at `position`
    pub fn enter(ctx: &ToolContext<'_>, payload: DropPayload, position: Pos2) -> Self {
        tracing::debug!(kind = %payload.kind, "drag enter");
        let mut session = Self {
            bounds: Rect::NOTHING,
            payload,
            allowed: false,
        };
        session.update(ctx, position);
        session
    }

    /// Follow the pointer, returning whether a drop here is allowed
    pub fn update(&mut self, ctx: &ToolContext<'_>, position: Pos2) -> bool {
        let cell = ctx.config.grid_cell;
        self.bounds = self.payload.bounds_at(position, cell);
        self.allowed = ctx.policy.can_place(ctx.graph, &[self.bounds], &[], cell);
        self.allowed
    }

    /// Whether a drop at the last position is allowed
    pub fn can_drop(&self) -> bool {
        self.allowed
    }

    /// Bounds the node would get
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Payload being dragged
    pub fn payload(&self) -> &DropPayload {
        &self.payload
    }

    /// Insert the node if the last position allows it
    pub fn finish(self, ctx: &mut ToolContext<'_>) -> Option<NodeId> {
        if !self.allowed {
            tracing::debug!("drop rejected");
            return None;
        }
        let node = self.payload.instantiate(self.bounds);
        let id = ctx.graph.add_node(node);
        tracing::info!("Dropped {} node {:?}", self.payload.kind, id);
        ctx.controller.node_dropped(id, &self.payload.kind, self.bounds);
        Some(id)
    }

    /// Overlay showing the ghost node
    pub fn overlay(&self) -> Overlay {
        Overlay::DropPreview {
            bounds: self.bounds,
            allowed: self.allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::tools::testing::Harness;

    #[test]
    fn test_bounds_snap_to_cell() {
        let payload = DropPayload::new("task").with_size(2, 1);
        assert_eq!(
            payload.bounds_at(Pos2::new(45.0, 19.0), 20.0),
            Rect::from_min_size(Pos2::new(40.0, 0.0), Vec2::new(40.0, 20.0))
        );
    }

    #[test]
    fn test_drop_on_free_cell_inserts_node() {
        let mut h = Harness::new(Graph::new("drop"));
        let payload = DropPayload::new("task").with_port(Port::input("in"));
        let template = payload.ports[0].id;

        let session = DropSession::enter(&h.ctx(), payload, Pos2::new(50.0, 50.0));
        assert!(session.can_drop());
        let id = session.finish(&mut h.ctx()).unwrap();

        let node = h.graph.node(id).unwrap();
        assert_eq!(node.kind, "task");
        assert_eq!(node.bounds().min, Pos2::new(40.0, 40.0));
        assert_ne!(node.port_at_index(0).unwrap().id, template);
        assert_eq!(h.controller.dropped.len(), 1);
    }

    #[test]
    fn test_drop_on_occupied_cell_is_rejected() {
        let mut graph = Graph::new("drop");
        graph.add_node(Node::at("n", 40.0, 40.0, 20.0, 20.0));
        let mut h = Harness::new(graph);

        let mut session = DropSession::enter(&h.ctx(), DropPayload::new("task"), Pos2::new(45.0, 45.0));
        assert!(!session.can_drop());
        assert!(session.update(&h.ctx(), Pos2::new(65.0, 45.0)));
        assert!(!session.update(&h.ctx(), Pos2::new(59.0, 59.0)));

        assert_eq!(session.finish(&mut h.ctx()), None);
        assert_eq!(h.graph.node_count(), 1);
        assert!(h.controller.dropped.is_empty());
    }
}
