// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph arena holding nodes, their ports and links.
//!
//! Links refer to ports by handle and every port keeps the set of links bound
//! to it. Both sides are updated together by the methods here, and moving a
//! node pushes fresh paths to every link attached to one of its ports before
//! the call returns.

use crate::geometry::{Pos2, Rect, Vec2};
use crate::item::{DiagramItem, ItemId};
use crate::link::{Link, LinkEnd, LinkEndpointSnapshot, LinkId, LinkSide};
use crate::node::{Node, NodeId};
use crate::observer::{Observers, SubscriptionId};
use crate::port::{Port, PortId};
use crate::routing::{self, EndpointGeometry, LinkPath};
use crate::selection::SelectionTarget;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Change notifications emitted by the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node was inserted
    NodeAdded(NodeId),
    /// A node (and its ports) was removed
    NodeRemoved(NodeId),
    /// A node's bounds changed
    NodeBoundsChanged(NodeId),
    /// A link was inserted
    LinkAdded(LinkId),
    /// A link was removed
    LinkRemoved(LinkId),
    /// A link's path was recomputed
    LinkPathChanged(LinkId),
}

/// A node removed from the graph together with the links that were attached
/// to its ports
#[derive(Debug, Clone)]
pub struct RemovedNode {
    /// The node, with its ports
    pub node: Node,
    /// Links that ended on one of the node's ports
    pub links: Vec<Link>,
}

/// A diagram graph
#[derive(Debug, Default)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in insertion (back-to-front) order
    nodes: IndexMap<NodeId, Node>,
    /// Links between ports
    links: IndexMap<LinkId, Link>,
    /// Owning node of every port
    port_owners: HashMap<PortId, NodeId>,
    /// Change subscribers
    observers: Observers<GraphEvent>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Subscribe to graph changes
    pub fn subscribe(&mut self, callback: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    /// Remove a subscription
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ---- nodes -------------------------------------------------------------

    /// Add a node to the graph and lay out its ports
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = node.id;
        node.layout_ports();
        for port_id in node.port_ids() {
            self.port_owners.insert(port_id, id);
        }
        self.nodes.insert(id, node);
        tracing::trace!(node = ?id, "node added");
        self.observers.notify(&GraphEvent::NodeAdded(id));
        id
    }

    /// Remove a node, its ports and every link attached to those ports
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<RemovedNode> {
        let attached: IndexSet<LinkId> = {
            let node = self.nodes.get(&node_id)?;
            node.ports().flat_map(Port::links).collect::<IndexSet<_>>()
        };

        let links = attached
            .into_iter()
            .filter_map(|link_id| self.remove_link(link_id))
            .collect();

        let node = self.nodes.shift_remove(&node_id)?;
        for port_id in node.port_ids() {
            self.port_owners.remove(&port_id);
        }
        tracing::trace!(node = ?node_id, "node removed");
        self.observers.notify(&GraphEvent::NodeRemoved(node_id));
        Some(RemovedNode { node, links })
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get all nodes, back to front
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Move/resize a node and push the new port centers to its links
    pub fn set_node_bounds(&mut self, node_id: NodeId, bounds: Rect) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        if node.bounds() == bounds {
            return Ok(());
        }
        node.set_bounds(bounds);
        self.observers.notify(&GraphEvent::NodeBoundsChanged(node_id));
        self.layout_node(node_id);
        Ok(())
    }

    /// Translate a node
    pub fn translate_node(&mut self, node_id: NodeId, delta: Vec2) -> Result<(), GraphError> {
        let bounds = self
            .node(node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?
            .bounds();
        self.set_node_bounds(node_id, bounds.translate(delta))
    }

    /// Layout pass for one node: recompute port centers and re-route every
    /// link attached to a port whose center moved
    pub fn layout_node(&mut self, node_id: NodeId) {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return;
        };
        let moved = node.layout_ports();
        let mut stale: IndexSet<LinkId> = IndexSet::new();
        for port_id in moved {
            if let Some(port) = node.port(port_id) {
                stale.extend(port.links());
            }
        }
        for link_id in stale {
            self.update_link_path(link_id);
        }
    }

    // ---- ports -------------------------------------------------------------

    /// Get a port by ID
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        let owner = self.port_owners.get(&port_id)?;
        self.nodes.get(owner)?.port(port_id)
    }

    /// Node owning a port
    pub fn port_owner(&self, port_id: PortId) -> Option<NodeId> {
        self.port_owners.get(&port_id).copied()
    }

    /// Every port with its owning node
    pub fn ports(&self) -> impl Iterator<Item = (&Node, &Port)> {
        self.nodes
            .values()
            .flat_map(|node| node.ports().map(move |port| (node, port)))
    }

    /// Nearest linkable port whose sensitivity radius contains `point`
    pub fn port_at(&self, point: Pos2) -> Option<PortId> {
        self.nearest_port(point, None, |_| true)
    }

    /// Nearest port within its sensitivity radius that passes `accept`.
    ///
    /// Ports on nodes without the linkable capability and `exclude` are
    /// skipped. Ties go to the smallest distance, then to the first found.
    pub fn nearest_port(
        &self,
        point: Pos2,
        exclude: Option<PortId>,
        accept: impl Fn(&Port) -> bool,
    ) -> Option<PortId> {
        self.ports()
            .filter(|(node, port)| {
                node.capabilities.linkable
                    && Some(port.id) != exclude
                    && port.is_near(point)
                    && accept(port)
            })
            .map(|(_, port)| (port.id, port.center().distance(point)))
            .fold(None, |best: Option<(PortId, f32)>, (id, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((id, d)),
            })
            .map(|(id, _)| id)
    }

    // ---- links -------------------------------------------------------------

    /// Insert a link, binding it to its ports and computing its path
    pub fn add_link(&mut self, link: Link) -> Result<LinkId, GraphError> {
        for port_id in link.ports() {
            if !self.port_owners.contains_key(&port_id) {
                return Err(GraphError::PortNotFound(port_id));
            }
        }
        let id = link.id;
        let ports: Vec<PortId> = link.ports().collect();
        self.links.insert(id, link);
        for port_id in ports {
            self.with_port_mut(port_id, |port| port.attach(id));
        }
        self.observers.notify(&GraphEvent::LinkAdded(id));
        self.update_link_path(id);
        Ok(id)
    }

    /// Connect two ports, checking their direction flags
    pub fn connect(&mut self, source: PortId, target: PortId) -> Result<LinkId, GraphError> {
        let source_port = self.port(source).ok_or(GraphError::PortNotFound(source))?;
        let target_port = self.port(target).ok_or(GraphError::PortNotFound(target))?;
        if !source_port.accepts(LinkSide::Source) || !target_port.accepts(LinkSide::Target) {
            return Err(GraphError::IncompatiblePorts);
        }
        self.add_link(Link::between(source, target))
    }

    /// Remove a link
    pub fn remove_link(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.shift_remove(&link_id)?;
        for port_id in link.ports() {
            self.with_port_mut(port_id, |port| port.detach(link_id));
        }
        self.observers.notify(&GraphEvent::LinkRemoved(link_id));
        Some(link)
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links bound to a port
    pub fn links_at(&self, port_id: PortId) -> impl Iterator<Item = &Link> {
        self.port(port_id)
            .into_iter()
            .flat_map(Port::links)
            .filter_map(|id| self.links.get(&id))
    }

    /// Links with at least one end on a node
    pub fn links_of_node(&self, node_id: NodeId) -> Vec<LinkId> {
        self.node(node_id)
            .into_iter()
            .flat_map(|n| n.ports().flat_map(Port::links))
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Topmost link whose path passes within `tolerance` of `point`
    pub fn link_at(&self, point: Pos2, tolerance: f32) -> Option<LinkId> {
        self.links
            .values()
            .rev()
            .find(|link| {
                link.path()
                    .is_some_and(|path| path.distance_to(point) <= tolerance)
            })
            .map(|link| link.id)
    }

    /// Rebind or float one end of a link
    pub fn set_link_end(
        &mut self,
        link_id: LinkId,
        side: LinkSide,
        end: LinkEnd,
    ) -> Result<(), GraphError> {
        if let LinkEnd::Port(port_id) = end {
            if !self.port_owners.contains_key(&port_id) {
                return Err(GraphError::PortNotFound(port_id));
            }
        }
        let link = self
            .links
            .get_mut(&link_id)
            .ok_or(GraphError::LinkNotFound(link_id))?;
        if link.end(side) == end {
            return Ok(());
        }
        let before: Vec<PortId> = link.ports().collect();
        link.set_end(side, end);
        let after: Vec<PortId> = link.ports().collect();
        self.sync_port_membership(link_id, &before, &after);
        self.update_link_path(link_id);
        Ok(())
    }

    /// Replace all control points of a link
    pub fn set_link_control_points(
        &mut self,
        link_id: LinkId,
        points: Vec<Pos2>,
    ) -> Result<(), GraphError> {
        self.links
            .get_mut(&link_id)
            .ok_or(GraphError::LinkNotFound(link_id))?
            .set_control_points(points);
        self.update_link_path(link_id);
        Ok(())
    }

    /// Move one control point of a link
    pub fn set_link_control_point(
        &mut self,
        link_id: LinkId,
        index: usize,
        point: Pos2,
    ) -> Result<(), GraphError> {
        let link = self
            .links
            .get_mut(&link_id)
            .ok_or(GraphError::LinkNotFound(link_id))?;
        let slot = link
            .control_point_mut(index)
            .ok_or(GraphError::ControlPointOutOfRange {
                link: link_id,
                index,
            })?;
        *slot = point;
        self.update_link_path(link_id);
        Ok(())
    }

    /// Restore a link's full endpoint state
    pub fn restore_link(
        &mut self,
        link_id: LinkId,
        snapshot: &LinkEndpointSnapshot,
    ) -> Result<(), GraphError> {
        for port_id in [snapshot.source.port(), snapshot.target.port()].into_iter().flatten() {
            if !self.port_owners.contains_key(&port_id) {
                return Err(GraphError::PortNotFound(port_id));
            }
        }
        let link = self
            .links
            .get_mut(&link_id)
            .ok_or(GraphError::LinkNotFound(link_id))?;
        let before: Vec<PortId> = link.ports().collect();
        link.set_end(LinkSide::Source, snapshot.source);
        link.set_end(LinkSide::Target, snapshot.target);
        link.set_control_points(snapshot.control_points.clone());
        let after: Vec<PortId> = link.ports().collect();
        self.sync_port_membership(link_id, &before, &after);
        self.update_link_path(link_id);
        Ok(())
    }

    /// Recompute and store the path of a link
    pub fn update_link_path(&mut self, link_id: LinkId) {
        let Some(link) = self.links.get(&link_id) else {
            return;
        };
        let path = self.compute_path(link);
        if path.is_none() {
            tracing::trace!(link = ?link_id, "link has no geometry");
        }
        if let Some(link) = self.links.get_mut(&link_id) {
            link.set_path(path);
        }
        self.observers.notify(&GraphEvent::LinkPathChanged(link_id));
    }

    fn compute_path(&self, link: &Link) -> Option<LinkPath> {
        let source = self.endpoint_geometry(link.source())?;
        let target = self.endpoint_geometry(link.target())?;
        routing::route(source, target, link.control_points(), link.routing)
    }

    fn endpoint_geometry(&self, end: LinkEnd) -> Option<EndpointGeometry<'_>> {
        match end {
            LinkEnd::Port(port_id) => self.port(port_id).map(EndpointGeometry::Port),
            LinkEnd::Floating(point) => Some(EndpointGeometry::Floating(point)),
        }
    }

    fn sync_port_membership(&mut self, link_id: LinkId, before: &[PortId], after: &[PortId]) {
        for port_id in before.iter().filter(|p| !after.contains(p)) {
            self.with_port_mut(*port_id, |port| port.detach(link_id));
        }
        for port_id in after {
            self.with_port_mut(*port_id, |port| port.attach(link_id));
        }
    }

    fn with_port_mut(&mut self, port_id: PortId, f: impl FnOnce(&mut Port)) {
        let Some(owner) = self.port_owners.get(&port_id) else {
            tracing::warn!(port = ?port_id, "dangling port handle");
            return;
        };
        if let Some(port) = self.nodes.get_mut(owner).and_then(|n| n.port_mut(port_id)) {
            f(port);
        }
    }

    // ---- items -------------------------------------------------------------

    /// Any item by handle
    pub fn item(&self, item: ItemId) -> Option<&dyn DiagramItem> {
        match item {
            ItemId::Node(id) => self.nodes.get(&id).map(|n| n as &dyn DiagramItem),
            ItemId::Link(id) => self.links.get(&id).map(|l| l as &dyn DiagramItem),
        }
    }

    fn item_mut(&mut self, item: ItemId) -> Option<&mut dyn DiagramItem> {
        match item {
            ItemId::Node(id) => self.nodes.get_mut(&id).map(|n| n as &mut dyn DiagramItem),
            ItemId::Link(id) => self.links.get_mut(&id).map(|l| l as &mut dyn DiagramItem),
        }
    }

    /// Whether the handle refers to a live item
    pub fn contains(&self, item: ItemId) -> bool {
        self.item(item).is_some()
    }

    /// Bounds of any item
    pub fn item_bounds(&self, item: ItemId) -> Option<Rect> {
        self.item(item)?.bounds()
    }

    /// All items, nodes first, in enumeration order
    pub fn items(&self) -> impl Iterator<Item = &dyn DiagramItem> {
        self.nodes
            .values()
            .map(|n| n as &dyn DiagramItem)
            .chain(self.links.values().map(|l| l as &dyn DiagramItem))
    }

    /// Topmost node containing `point`
    pub fn node_at(&self, point: Pos2) -> Option<NodeId> {
        // Iterate in reverse to find topmost node first
        self.nodes
            .values()
            .rev()
            .find(|node| node.bounds().contains(point))
            .map(|node| node.id)
    }
}

impl SelectionTarget for Graph {
    fn set_item_selected(&mut self, item: ItemId, selected: bool) {
        if let Some(item) = self.item_mut(item) {
            item.set_selected(selected);
        }
    }
}

/// Error when editing the graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// Link not found
    #[error("Link not found: {0:?}")]
    LinkNotFound(LinkId),

    /// Port direction flags do not allow this link
    #[error("Incompatible ports")]
    IncompatiblePorts,

    /// Control point index past the end of the list
    #[error("Control point {index} out of range for link {link:?}")]
    ControlPointOutOfRange {
        /// Link being edited
        link: LinkId,
        /// Requested index
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Routing;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn two_nodes() -> (Graph, NodeId, PortId, NodeId, PortId) {
        let mut graph = Graph::new("test");
        let out = Port::output("out");
        let out_id = out.id;
        let a = graph.add_node(Node::at("a", 0.0, 0.0, 40.0, 20.0).with_port(out));
        let input = Port::input("in");
        let in_id = input.id;
        let b = graph.add_node(Node::at("b", 100.0, 0.0, 40.0, 20.0).with_port(input));
        (graph, a, out_id, b, in_id)
    }

    #[test]
    fn test_connect_binds_both_sides() {
        let (mut graph, _, out, _, input) = two_nodes();
        let link = graph.connect(out, input).unwrap();

        assert_eq!(graph.port(out).unwrap().links().collect::<Vec<_>>(), vec![link]);
        assert_eq!(graph.port(input).unwrap().links().collect::<Vec<_>>(), vec![link]);
        assert!(graph.link(link).unwrap().path().is_some());
    }

    #[test]
    fn test_connect_rejects_wrong_direction() {
        let (mut graph, _, out, _, input) = two_nodes();
        assert!(matches!(
            graph.connect(input, out),
            Err(GraphError::IncompatiblePorts)
        ));
    }

    #[test]
    fn test_moving_node_pushes_link_paths() {
        let (mut graph, a, out, _, input) = two_nodes();
        let link = graph
            .add_link(Link::between(out, input).with_routing(Routing::Straight))
            .unwrap();
        let before = graph.link(link).unwrap().path().unwrap().start();

        graph.translate_node(a, Vec2::new(5.0, 0.0)).unwrap();

        let after = graph.link(link).unwrap().path().unwrap().start();
        assert_eq!(after - before, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_path_change_notifies_observers() {
        let (mut graph, a, out, _, input) = two_nodes();
        let link = graph.connect(out, input).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        graph.subscribe(move |e| sink.borrow_mut().push(*e));

        graph.translate_node(a, Vec2::new(0.0, 20.0)).unwrap();

        let events = events.borrow();
        assert_eq!(events[0], GraphEvent::NodeBoundsChanged(a));
        assert!(events.contains(&GraphEvent::LinkPathChanged(link)));
    }

    #[test]
    fn test_remove_node_removes_attached_links() {
        let (mut graph, a, out, _, input) = two_nodes();
        let link = graph.connect(out, input).unwrap();

        let removed = graph.remove_node(a).unwrap();

        assert_eq!(removed.links.len(), 1);
        assert!(graph.link(link).is_none());
        assert!(graph.port(out).is_none());
        assert_eq!(graph.port(input).unwrap().link_count(), 0);
    }

    #[test]
    fn test_set_link_end_moves_membership() {
        let (mut graph, _, out, _, input) = two_nodes();
        let link = graph.connect(out, input).unwrap();

        graph
            .set_link_end(link, LinkSide::Target, LinkEnd::Floating(Pos2::new(50.0, 50.0)))
            .unwrap();

        assert_eq!(graph.port(input).unwrap().link_count(), 0);
        assert_eq!(graph.port(out).unwrap().link_count(), 1);
        assert_eq!(graph.link(link).unwrap().path().unwrap().end(), Pos2::new(50.0, 50.0));
    }

    #[test]
    fn test_restore_link_reverts_ends_and_controls() {
        let (mut graph, _, out, _, input) = two_nodes();
        let link = graph.connect(out, input).unwrap();
        let snapshot = graph.link(link).unwrap().snapshot();

        graph
            .set_link_end(link, LinkSide::Source, LinkEnd::Floating(Pos2::ZERO))
            .unwrap();
        graph
            .set_link_control_points(link, vec![Pos2::new(1.0, 1.0)])
            .unwrap();
        graph.restore_link(link, &snapshot).unwrap();

        assert_eq!(graph.link(link).unwrap().snapshot(), snapshot);
        assert_eq!(graph.port(out).unwrap().link_count(), 1);
    }

    #[test]
    fn test_dangling_port_has_no_geometry() {
        let (mut graph, _, out, _, _) = two_nodes();
        let link = graph
            .add_link(Link::new(LinkEnd::Port(out), LinkEnd::Floating(Pos2::new(5.0, 5.0))))
            .unwrap();
        assert!(graph.link(link).unwrap().path().is_some());
        assert!(matches!(
            graph.add_link(Link::new(LinkEnd::Port(PortId::new()), LinkEnd::Floating(Pos2::ZERO))),
            Err(GraphError::PortNotFound(_))
        ));
    }

    #[test]
    fn test_nearest_port_prefers_closest() {
        let mut graph = Graph::new("ports");
        let near = Port::new("near").with_sensitivity(30.0);
        let near_id = near.id;
        graph.add_node(Node::at("a", 0.0, 0.0, 20.0, 20.0).with_port(near));
        let far = Port::new("far").with_sensitivity(30.0);
        graph.add_node(Node::at("b", 30.0, 0.0, 20.0, 20.0).with_port(far));

        assert_eq!(graph.nearest_port(Pos2::new(20.0, 10.0), None, |_| true), Some(near_id));
    }
}
