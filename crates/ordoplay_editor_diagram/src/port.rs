// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection points owned by nodes.

use crate::geometry::{self, Pos2, Rect, Vec2};
use crate::link::{LinkId, LinkSide};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default visual radius of a port
pub const DEFAULT_PORT_RADIUS: f32 = 6.0;

/// Default snapping/hit radius of a port
pub const DEFAULT_PORT_SENSITIVITY: f32 = 12.0;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendered outline of a port, used to trim links to its boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PortShape {
    /// Circle of the port radius
    #[default]
    Circle,
    /// Axis-aligned square with half extent equal to the port radius
    Square,
}

/// A port on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Position inside the owning node, as a fraction of its size
    pub anchor: Vec2,
    /// Extra offset applied after the anchor, in surface units
    pub offset: Vec2,
    /// Visual outline
    pub shape: PortShape,
    /// Visual radius
    pub radius: f32,
    /// Distance within which the pointer counts as "on" the port
    pub sensitivity: f32,
    /// Links may end here
    pub accepts_incoming: bool,
    /// Links may start here
    pub accepts_outgoing: bool,
    /// Center in surface space, refreshed by the graph on every layout pass
    center: Pos2,
    /// Links currently bound to this port
    links: IndexSet<LinkId>,
}

impl Port {
    /// Create a port accepting both directions, anchored at the node center
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            anchor: Vec2::splat(0.5),
            offset: Vec2::ZERO,
            shape: PortShape::Circle,
            radius: DEFAULT_PORT_RADIUS,
            sensitivity: DEFAULT_PORT_SENSITIVITY,
            accepts_incoming: true,
            accepts_outgoing: true,
            center: Pos2::ZERO,
            links: IndexSet::new(),
        }
    }

    /// Create a port that only receives links, on the left edge
    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name).at(0.0, 0.5).incoming_only()
    }

    /// Create a port that only starts links, on the right edge
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name).at(1.0, 0.5).outgoing_only()
    }

    /// Set the relative anchor inside the node
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.anchor = Vec2::new(x, y);
        self
    }

    /// Set the absolute offset added to the anchor
    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vec2::new(x, y);
        self
    }

    /// Set the visual shape
    pub fn with_shape(mut self, shape: PortShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the visual radius
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Set the hit/snap radius
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Only accept links ending here
    pub fn incoming_only(mut self) -> Self {
        self.accepts_incoming = true;
        self.accepts_outgoing = false;
        self
    }

    /// Only accept links starting here
    pub fn outgoing_only(mut self) -> Self {
        self.accepts_incoming = false;
        self.accepts_outgoing = true;
        self
    }

    /// Current center in surface space
    pub fn center(&self) -> Pos2 {
        self.center
    }

    /// Links bound to this port
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.iter().copied()
    }

    /// Number of bound links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether the given link end may bind here
    pub fn accepts(&self, side: LinkSide) -> bool {
        match side {
            LinkSide::Source => self.accepts_outgoing,
            LinkSide::Target => self.accepts_incoming,
        }
    }

    /// Point on the port outline on the way from its center toward `target`
    pub fn edge_point(&self, target: Pos2) -> Pos2 {
        match self.shape {
            PortShape::Circle => geometry::project_to_circle(self.center, self.radius, target),
            PortShape::Square => geometry::project_to_square(self.center, self.radius, target),
        }
    }

    /// Whether `point` is within the sensitivity radius of the center
    pub fn is_near(&self, point: Pos2) -> bool {
        self.center.distance(point) <= self.sensitivity
    }

    /// Center this port would have inside `node_bounds`
    pub fn center_in(&self, node_bounds: Rect) -> Pos2 {
        node_bounds.min + node_bounds.size() * self.anchor + self.offset
    }

    /// Store a freshly laid out center, returning whether it moved
    pub(crate) fn set_center(&mut self, center: Pos2) -> bool {
        if self.center == center {
            return false;
        }
        self.center = center;
        true
    }

    pub(crate) fn attach(&mut self, link: LinkId) {
        self.links.insert(link);
    }

    pub(crate) fn detach(&mut self, link: LinkId) {
        self.links.shift_remove(&link);
    }
}
