// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gesture tools.
//!
//! Every gesture is a session value: `begin` creates it from the pointer-down
//! state, `drag_to` is fed the pointer offset from the gesture start, and
//! `end` consumes it, either committing the result to the controller or
//! restoring what was snapshotted at the start.

pub mod drop;
pub mod link;
pub mod move_resize;
pub mod rubber_band;

use crate::config::SurfaceConfig;
use crate::controller::Controller;
use crate::geometry::{Pos2, Rect, Vec2};
use crate::graph::Graph;
use crate::link::LinkId;
use crate::selection::Selection;

pub use drop::{DropPayload, DropSession};
pub use link::{LinkHandle, LinkSession};
pub use move_resize::{DragHandle, GridOccupancy, MoveSession, PlacementPolicy, ResizeEdge};
pub use rubber_band::RubberBandSession;

/// Everything a tool may touch while a gesture runs
pub struct ToolContext<'a> {
    /// Diagram graph
    pub graph: &'a mut Graph,
    /// Current selection
    pub selection: &'a mut Selection,
    /// Receiver of committed changes
    pub controller: &'a mut dyn Controller,
    /// Surface settings
    pub config: &'a SurfaceConfig,
    /// Placement rule for nodes
    pub policy: &'a dyn PlacementPolicy,
}

/// Transient visual hosted by the surface while a gesture runs
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    /// Rubber-band rectangle
    RubberBand(Rect),
    /// Link being dragged, with whether releasing now would keep it
    LinkPreview {
        /// Link being edited
        link: LinkId,
        /// Whether releasing now would commit
        allowed: bool,
    },
    /// Placement feedback for moved or resized nodes
    Placement {
        /// Candidate bounds
        bounds: Vec<Rect>,
        /// Whether the candidate is allowed
        allowed: bool,
    },
    /// Ghost of a node being dropped from outside
    DropPreview {
        /// Bounds the node would get
        bounds: Rect,
        /// Whether the drop is allowed
        allowed: bool,
    },
}

/// Terminal state of a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Changes were kept
    Committed,
    /// Pre-gesture state was restored
    RolledBack,
}

/// A pointer-driven gesture session
pub trait Gesture {
    /// Surface point where the gesture started
    fn origin(&self) -> Pos2;

    /// Follow the pointer, `vector` being the offset from [`Gesture::origin`]
    fn drag_to(&mut self, ctx: &mut ToolContext<'_>, vector: Vec2);

    /// Whether releasing now would commit
    fn can_drop(&self) -> bool;

    /// Finish the gesture
    fn end(self, ctx: &mut ToolContext<'_>, commit: bool) -> DragOutcome
    where
        Self: Sized;

    /// Overlay to show while the gesture runs
    fn overlay(&self) -> Option<Overlay>;
}

/// The single gesture a surface may run at a time
#[derive(Debug)]
pub enum Session {
    /// Moving or resizing nodes
    Move(MoveSession),
    /// Creating or editing a link
    Link(LinkSession),
    /// Rubber-band selection
    RubberBand(RubberBandSession),
    /// External drag-drop hovering the surface
    Drop(DropSession),
}

impl Session {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Link(_) => "link",
            Self::RubberBand(_) => "rubber-band",
            Self::Drop(_) => "drop",
        }
    }

    /// Gesture origin; external drops have none
    pub fn origin(&self) -> Option<Pos2> {
        match self {
            Self::Move(s) => Some(s.origin()),
            Self::Link(s) => Some(s.origin()),
            Self::RubberBand(s) => Some(s.origin()),
            Self::Drop(_) => None,
        }
    }

    /// Forward a pointer move
    pub fn drag_to(&mut self, ctx: &mut ToolContext<'_>, vector: Vec2) {
        match self {
            Self::Move(s) => s.drag_to(ctx, vector),
            Self::Link(s) => s.drag_to(ctx, vector),
            Self::RubberBand(s) => s.drag_to(ctx, vector),
            Self::Drop(_) => {}
        }
    }

    /// Whether releasing now would commit
    pub fn can_drop(&self) -> bool {
        match self {
            Self::Move(s) => s.can_drop(),
            Self::Link(s) => s.can_drop(),
            Self::RubberBand(s) => s.can_drop(),
            Self::Drop(s) => s.can_drop(),
        }
    }

    /// Finish the session
    pub fn end(self, ctx: &mut ToolContext<'_>, commit: bool) -> DragOutcome {
        match self {
            Self::Move(s) => s.end(ctx, commit),
            Self::Link(s) => s.end(ctx, commit),
            Self::RubberBand(s) => s.end(ctx, commit),
            Self::Drop(s) => {
                if commit {
                    match s.finish(ctx) {
                        Some(_) => DragOutcome::Committed,
                        None => DragOutcome::RolledBack,
                    }
                } else {
                    DragOutcome::RolledBack
                }
            }
        }
    }

    /// Overlay to show
    pub fn overlay(&self) -> Option<Overlay> {
        match self {
            Self::Move(s) => s.overlay(),
            Self::Link(s) => s.overlay(),
            Self::RubberBand(s) => s.overlay(),
            Self::Drop(s) => Some(s.overlay()),
        }
    }
}
