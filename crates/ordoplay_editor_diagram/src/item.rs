// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tagged item handles and the capabilities tools dispatch on.

use crate::geometry::Rect;
use crate::link::LinkId;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Handle to any item hosted on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemId {
    /// A node
    Node(NodeId),
    /// A link
    Link(LinkId),
}

impl ItemId {
    /// The node handle, if this is a node
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            Self::Link(_) => None,
        }
    }

    /// The link handle, if this is a link
    pub fn as_link(&self) -> Option<LinkId> {
        match self {
            Self::Link(id) => Some(*id),
            Self::Node(_) => None,
        }
    }
}

impl From<NodeId> for ItemId {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<LinkId> for ItemId {
    fn from(id: LinkId) -> Self {
        Self::Link(id)
    }
}

/// What the tools are allowed to do with an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Can be translated by the move tool
    pub movable: bool,
    /// Can be stretched by the resize handles
    pub resizable: bool,
    /// Can join the selection
    pub selectable: bool,
    /// Its ports can start or receive links
    pub linkable: bool,
}

impl Capabilities {
    /// Default set for nodes
    pub const NODE: Self = Self {
        movable: true,
        resizable: true,
        selectable: true,
        linkable: true,
    };

    /// Default set for links
    pub const LINK: Self = Self {
        movable: false,
        resizable: false,
        selectable: true,
        linkable: false,
    };

    /// Inert item
    pub const NONE: Self = Self {
        movable: false,
        resizable: false,
        selectable: false,
        linkable: false,
    };
}

/// Behaviour shared by every hosted item
pub trait DiagramItem {
    /// Handle of this item
    fn item_id(&self) -> ItemId;

    /// Capability set
    fn capabilities(&self) -> Capabilities;

    /// Current bounds in surface space, `None` when the item has no geometry
    fn bounds(&self) -> Option<Rect>;

    /// Selection flag
    fn is_selected(&self) -> bool;

    /// Update the selection flag
    fn set_selected(&mut self, selected: bool);
}
