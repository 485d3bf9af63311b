// SPDX-License-Identifier: MIT OR Apache-2.0
//! Positioned, sized items that own their ports.

use crate::geometry::{Pos2, Rect, Vec2};
use crate::item::{Capabilities, DiagramItem, ItemId};
use crate::port::{Port, PortId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node instance on the surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Host-defined kind tag; opaque to the engine
    pub kind: String,
    /// What tools may do with this node
    pub capabilities: Capabilities,
    /// Position and size in surface space
    bounds: Rect,
    /// Owned ports, in declaration order
    ports: Vec<Port>,
    /// Selection flag
    selected: bool,
}

impl Node {
    /// Create a node of the given kind occupying `bounds`
    pub fn new(kind: impl Into<String>, bounds: Rect) -> Self {
        Self {
            id: NodeId::new(),
            kind: kind.into(),
            capabilities: Capabilities::NODE,
            bounds,
            ports: Vec::new(),
            selected: false,
        }
    }

    /// Create a node from position and size
    pub fn at(kind: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(kind, Rect::from_min_size(Pos2::new(x, y), Vec2::new(width, height)))
    }

    /// Add a port
    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    /// Override the capability set
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Current bounds
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Top-left corner
    pub fn position(&self) -> Pos2 {
        self.bounds.min
    }

    /// Get a port by index
    pub fn port_at_index(&self, index: usize) -> Option<&Port> {
        self.ports.get(index)
    }

    /// Get a port by ID
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == port_id)
    }

    /// Get all ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    /// IDs of all ports
    pub fn port_ids(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports.iter().map(|p| p.id)
    }

    pub(crate) fn port_mut(&mut self, port_id: PortId) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.id == port_id)
    }

    pub(crate) fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    /// Recompute every port center from the current bounds.
    ///
    /// Returns the ports whose center moved.
    pub(crate) fn layout_ports(&mut self) -> Vec<PortId> {
        let bounds = self.bounds;
        self.ports
            .iter_mut()
            .filter_map(|port| {
                let center = port.center_in(bounds);
                port.set_center(center).then_some(port.id)
            })
            .collect()
    }
}

impl DiagramItem for Node {
    fn item_id(&self) -> ItemId {
        ItemId::Node(self.id)
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn bounds(&self) -> Option<Rect> {
        Some(self.bounds)
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_reports_only_moved_ports() {
        let input = Port::input("in");
        let output = Port::output("out");
        let (in_id, out_id) = (input.id, output.id);
        let mut node = Node::at("n", 0.0, 0.0, 40.0, 20.0).with_port(input).with_port(output);

        assert_eq!(node.layout_ports(), vec![in_id, out_id]);
        assert!(node.layout_ports().is_empty());

        node.set_bounds(Rect::from_min_size(Pos2::ZERO, Vec2::new(60.0, 20.0)));
        assert_eq!(node.layout_ports(), vec![out_id]);
        assert_eq!(node.port(in_id).unwrap().center(), Pos2::new(0.0, 10.0));
        assert_eq!(node.port(out_id).unwrap().center(), Pos2::new(60.0, 10.0));
    }

    #[test]
    fn test_port_lookup() {
        let port = Port::new("p");
        let id = port.id;
        let node = Node::at("n", 0.0, 0.0, 10.0, 10.0).with_port(port);

        assert_eq!(node.port_at_index(0).map(|p| p.id), Some(id));
        assert!(node.port(PortId::new()).is_none());
        assert_eq!(node.port_ids().collect::<Vec<_>>(), vec![id]);
        assert_eq!(node.item_id(), ItemId::Node(node.id));
    }
}
