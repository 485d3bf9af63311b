// SPDX-License-Identifier: MIT OR Apache-2.0
//! Directed links between ports or free points.

use crate::geometry::{Pos2, Rect};
use crate::item::{Capabilities, DiagramItem, ItemId};
use crate::port::PortId;
use crate::routing::{LinkPath, Routing};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which end of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkSide {
    /// The end the link starts from
    Source,
    /// The end the link points at
    Target,
}

impl LinkSide {
    /// The other end
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Target,
            Self::Target => Self::Source,
        }
    }
}

/// State of one link end: bound to a port or floating at a point, never both
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LinkEnd {
    /// Bound to a port
    Port(PortId),
    /// Floating at an explicit surface point
    Floating(Pos2),
}

impl LinkEnd {
    /// Bound port, if any
    pub fn port(&self) -> Option<PortId> {
        match self {
            Self::Port(id) => Some(*id),
            Self::Floating(_) => None,
        }
    }

    /// Floating point, if any
    pub fn point(&self) -> Option<Pos2> {
        match self {
            Self::Floating(p) => Some(*p),
            Self::Port(_) => None,
        }
    }
}

/// Full endpoint state of a link, captured before an edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEndpointSnapshot {
    /// Source end
    pub source: LinkEnd,
    /// Target end
    pub target: LinkEnd,
    /// User-placed control points
    pub control_points: Vec<Pos2>,
}

impl LinkEndpointSnapshot {
    /// Whether source or target differ from another snapshot
    pub fn ends_differ(&self, other: &LinkEndpointSnapshot) -> bool {
        self.source != other.source || self.target != other.target
    }
}

/// A link between two ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// How the path is routed
    pub routing: Routing,
    /// What tools may do with this link
    pub capabilities: Capabilities,
    /// Source end
    source: LinkEnd,
    /// Target end
    target: LinkEnd,
    /// User-placed interior points; empty means automatic routing
    control_points: Vec<Pos2>,
    /// Last computed path, `None` when the ends cannot be resolved
    #[serde(skip)]
    path: Option<LinkPath>,
    /// Selection flag
    selected: bool,
}

impl Link {
    /// Create a new link
    pub fn new(source: LinkEnd, target: LinkEnd) -> Self {
        Self {
            id: LinkId::new(),
            routing: Routing::default(),
            capabilities: Capabilities::LINK,
            source,
            target,
            control_points: Vec::new(),
            path: None,
            selected: false,
        }
    }

    /// Create a link between two ports
    pub fn between(source: PortId, target: PortId) -> Self {
        Self::new(LinkEnd::Port(source), LinkEnd::Port(target))
    }

    /// Set the routing style
    pub fn with_routing(mut self, routing: Routing) -> Self {
        self.routing = routing;
        self
    }

    /// Set explicit control points
    pub fn with_control_points(mut self, points: Vec<Pos2>) -> Self {
        self.control_points = points;
        self
    }

    /// Source end
    pub fn source(&self) -> LinkEnd {
        self.source
    }

    /// Target end
    pub fn target(&self) -> LinkEnd {
        self.target
    }

    /// One end
    pub fn end(&self, side: LinkSide) -> LinkEnd {
        match side {
            LinkSide::Source => self.source,
            LinkSide::Target => self.target,
        }
    }

    /// User-placed control points
    pub fn control_points(&self) -> &[Pos2] {
        &self.control_points
    }

    /// Current path, if the link has geometry
    pub fn path(&self) -> Option<&LinkPath> {
        self.path.as_ref()
    }

    /// Check if this link is bound to a specific port
    pub fn involves_port(&self, port_id: PortId) -> bool {
        self.source.port() == Some(port_id) || self.target.port() == Some(port_id)
    }

    /// Ports this link is bound to
    pub fn ports(&self) -> impl Iterator<Item = PortId> {
        self.source.port().into_iter().chain(self.target.port())
    }

    /// Capture the endpoint state
    pub fn snapshot(&self) -> LinkEndpointSnapshot {
        LinkEndpointSnapshot {
            source: self.source,
            target: self.target,
            control_points: self.control_points.clone(),
        }
    }

    pub(crate) fn set_end(&mut self, side: LinkSide, end: LinkEnd) {
        match side {
            LinkSide::Source => self.source = end,
            LinkSide::Target => self.target = end,
        }
    }

    pub(crate) fn set_control_points(&mut self, points: Vec<Pos2>) {
        self.control_points = points;
    }

    pub(crate) fn control_point_mut(&mut self, index: usize) -> Option<&mut Pos2> {
        self.control_points.get_mut(index)
    }

    pub(crate) fn set_path(&mut self, path: Option<LinkPath>) {
        self.path = path;
    }
}

impl DiagramItem for Link {
    fn item_id(&self) -> ItemId {
        ItemId::Link(self.id)
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn bounds(&self) -> Option<Rect> {
        self.path.as_ref().and_then(LinkPath::bounds)
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}
