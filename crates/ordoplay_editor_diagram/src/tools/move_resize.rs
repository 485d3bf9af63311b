// SPDX-License-Identifier: MIT OR Apache-2.0
//! Moving and resizing nodes.

use super::{DragOutcome, Gesture, Overlay, ToolContext};
use crate::geometry::{self, CellRange, Pos2, Rect, Vec2};
use crate::graph::Graph;
use crate::item::ItemId;
use crate::node::NodeId;

/// Edge stretched by a resize handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    /// Left edge
    Left,
    /// Top edge
    Top,
    /// Right edge
    Right,
    /// Bottom edge
    Bottom,
}

impl ResizeEdge {
    /// All edges
    pub const ALL: [ResizeEdge; 4] = [Self::Left, Self::Top, Self::Right, Self::Bottom];

    /// Midpoint of this edge on `bounds`, where its handle is drawn
    pub fn handle_position(self, bounds: Rect) -> Pos2 {
        match self {
            Self::Left => bounds.left_center(),
            Self::Top => bounds.center_top(),
            Self::Right => bounds.right_center(),
            Self::Bottom => bounds.center_bottom(),
        }
    }
}

/// What part of the items the pointer grabbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragHandle {
    /// Translate the whole items
    Move,
    /// Stretch one edge
    Resize(ResizeEdge),
}

/// Decides whether nodes may occupy candidate bounds
pub trait PlacementPolicy {
    /// `placements` are candidate bounds; nodes listed in `moving` are
    /// ignored as obstacles
    fn can_place(
        &self,
        graph: &Graph,
        placements: &[Rect],
        moving: &[NodeId],
        grid_cell: f32,
    ) -> bool;
}

/// Forbid sharing a grid cell with any other node
#[derive(Debug, Clone, Copy, Default)]
pub struct GridOccupancy;

impl PlacementPolicy for GridOccupancy {
    fn can_place(
        &self,
        graph: &Graph,
        placements: &[Rect],
        moving: &[NodeId],
        grid_cell: f32,
    ) -> bool {
        let obstacles: Vec<CellRange> = graph
            .nodes()
            .filter(|node| !moving.contains(&node.id))
            .map(|node| CellRange::of(node.bounds(), grid_cell))
            .collect();
        placements.iter().all(|rect| {
            let cells = CellRange::of(*rect, grid_cell);
            !obstacles.iter().any(|o| o.overlaps(&cells))
        })
    }
}

/// A move or resize gesture
#[derive(Debug, Clone)]
pub struct MoveSession {
    origin: Pos2,
    handle: DragHandle,
    /// Bounds of every dragged node at gesture start
    snapshot: Vec<(NodeId, Rect)>,
    /// Bounds proposed by the last pointer move
    candidate: Vec<Rect>,
    /// Result of the last placement check
    allowed: bool,
}

impl MoveSession {
    /// Start dragging the movable (or, for resizes, resizable) nodes among
    /// `items`. Returns `None` if none qualify.
    pub fn begin(graph: &Graph, origin: Pos2, items: &[ItemId], handle: DragHandle) -> Option<Self> {
        let snapshot: Vec<(NodeId, Rect)> = items
            .iter()
            .filter_map(|item| item.as_node())
            .filter_map(|id| graph.node(id))
            .filter(|node| match handle {
                DragHandle::Move => node.capabilities.movable,
                DragHandle::Resize(_) => node.capabilities.resizable,
            })
            .map(|node| (node.id, node.bounds()))
            .collect();
        if snapshot.is_empty() {
            return None;
        }
        tracing::debug!(count = snapshot.len(), ?handle, "begin move");
        let candidate = snapshot.iter().map(|(_, r)| *r).collect();
        Some(Self {
            origin,
            handle,
            snapshot,
            candidate,
            allowed: true,
        })
    }

    /// Dragged nodes
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.snapshot.iter().map(|(id, _)| *id)
    }

    /// Grabbed handle
    pub fn handle(&self) -> DragHandle {
        self.handle
    }

    /// Candidate bounds from the last pointer move
    pub fn candidate(&self) -> &[Rect] {
        &self.candidate
    }

    fn propose(&self, original: Rect, vector: Vec2, cell: f32) -> Rect {
        let min_size = cell.max(1.0);
        match self.handle {
            DragHandle::Move => original.translate(vector),
            DragHandle::Resize(edge) => {
                let mut r = original;
                match edge {
                    ResizeEdge::Left => r.min.x = (r.min.x + vector.x).min(r.max.x - min_size),
                    ResizeEdge::Top => r.min.y = (r.min.y + vector.y).min(r.max.y - min_size),
                    ResizeEdge::Right => r.max.x = (r.max.x + vector.x).max(r.min.x + min_size),
                    ResizeEdge::Bottom => {
                        r.max.y = (r.max.y + vector.y).max(r.min.y + min_size);
                    }
                }
                r
            }
        }
    }

    fn restore(&self, graph: &mut Graph) {
        for (id, bounds) in &self.snapshot {
            if let Err(e) = graph.set_node_bounds(*id, *bounds) {
                tracing::warn!("Cannot restore node bounds: {e}");
            }
        }
    }
}

impl Gesture for MoveSession {
    fn origin(&self) -> Pos2 {
        self.origin
    }

    fn drag_to(&mut self, ctx: &mut ToolContext<'_>, vector: Vec2) {
        let cell = ctx.config.grid_cell;
        let vector = if ctx.config.snap_to_grid {
            geometry::snap_vec(vector, cell)
        } else {
            vector
        };

        let candidate: Vec<Rect> = self
            .snapshot
            .iter()
            .map(|(_, original)| self.propose(*original, vector, cell))
            .collect();
        let moving: Vec<NodeId> = self.nodes().collect();
        self.allowed = ctx.policy.can_place(ctx.graph, &candidate, &moving, cell);
        self.candidate = candidate;

        tracing::trace!(?vector, allowed = self.allowed, "move drag");
        if self.allowed {
            for ((id, _), bounds) in self.snapshot.iter().zip(&self.candidate) {
                if let Err(e) = ctx.graph.set_node_bounds(*id, *bounds) {
                    tracing::warn!("Cannot place dragged node: {e}");
                }
            }
        }
    }

    fn can_drop(&self) -> bool {
        self.allowed
    }

    fn end(self, ctx: &mut ToolContext<'_>, commit: bool) -> DragOutcome {
        if !(commit && self.allowed) {
            self.restore(ctx.graph);
            tracing::debug!("move rolled back");
            return DragOutcome::RolledBack;
        }

        let changed = self
            .snapshot
            .iter()
            .zip(&self.candidate)
            .any(|((_, before), after)| before != after);
        if changed {
            let items: Vec<ItemId> = self.nodes().map(ItemId::Node).collect();
            tracing::info!("Committing bounds of {} nodes", items.len());
            ctx.controller.update_items_bounds(&items, &self.candidate);
        }
        DragOutcome::Committed
    }

    fn overlay(&self) -> Option<Overlay> {
        Some(Overlay::Placement {
            bounds: self.candidate.clone(),
            allowed: self.allowed,
        })
    }
}
