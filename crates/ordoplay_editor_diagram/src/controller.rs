// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boundary to the owner of the backing domain model.
//!
//! Tools call the controller only for committed gestures. The controller is
//! the single writer of whatever the diagram represents.

use crate::geometry::Rect;
use crate::item::ItemId;
use crate::link::{Link, LinkEndpointSnapshot, LinkId};
use crate::node::NodeId;

/// Receiver of committed changes
pub trait Controller {
    /// A move or resize was committed; `bounds[i]` is the final bounds of `items[i]`
    fn update_items_bounds(&mut self, items: &[ItemId], bounds: &[Rect]);

    /// A link end was rebound; `initial` is the state before the gesture
    fn update_link(&mut self, initial: &LinkEndpointSnapshot, link: &Link);

    /// A node was inserted from an external drag-drop
    fn node_dropped(&mut self, _node: NodeId, _kind: &str, _bounds: Rect) {}

    /// Items were deleted through the surface
    fn items_deleted(&mut self, _nodes: &[NodeId], _links: &[LinkId]) {}
}

/// Controller that ignores every change
#[derive(Debug, Clone, Copy, Default)]
pub struct NullController;

impl Controller for NullController {
    fn update_items_bounds(&mut self, _items: &[ItemId], _bounds: &[Rect]) {}

    fn update_link(&mut self, _initial: &LinkEndpointSnapshot, _link: &Link) {}
}
