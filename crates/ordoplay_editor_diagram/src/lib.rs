// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive diagram editing for `OrdoPlay` Editor.
//!
//! This crate provides the editing engine behind diagram views:
//! - Nodes with ports, and directed links routed between them
//! - Selection with a primary item
//! - Move/resize, link, rubber-band and drag-drop tools
//! - An egui view that renders a surface and forwards input to it
//!
//! ## Architecture
//!
//! The engine is built on:
//! - A graph arena that owns nodes, ports and links by handle
//! - Push-based path updates when nodes move
//! - Gesture sessions that always end committed or rolled back
//! - A [`Controller`] trait that receives committed changes

pub mod config;
pub mod controller;
pub mod geometry;
pub mod graph;
pub mod item;
pub mod link;
pub mod node;
pub mod observer;
pub mod port;
pub mod routing;
pub mod selection;
pub mod surface;
pub mod tools;
pub mod view;

pub use config::{ConfigError, SurfaceConfig};
pub use controller::{Controller, NullController};
pub use graph::{Graph, GraphError, GraphEvent, RemovedNode};
pub use item::{Capabilities, DiagramItem, ItemId};
pub use link::{Link, LinkEnd, LinkEndpointSnapshot, LinkId, LinkSide};
pub use node::{Node, NodeId};
pub use observer::{Observers, SubscriptionId};
pub use port::{Port, PortId, PortShape};
pub use routing::{LinkPath, Routing};
pub use selection::{Selection, SelectionEvent, SelectionTarget};
pub use surface::{InputEvent, Surface, SurfaceError};
pub use tools::{
    DragHandle, DragOutcome, DropPayload, GridOccupancy, LinkHandle, Overlay, PlacementPolicy,
    ResizeEdge,
};
pub use view::SurfaceView;
