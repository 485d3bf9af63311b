// SPDX-License-Identifier: MIT OR Apache-2.0
//! The diagram surface: owns the graph, the selection and at most one gesture
//! session, and turns pointer and keyboard input into tool calls.

use crate::config::SurfaceConfig;
use crate::controller::Controller;
use crate::geometry::{Pos2, Rect, Vec2};
use crate::graph::{Graph, GraphError, RemovedNode};
use crate::item::ItemId;
use crate::link::LinkId;
use crate::node::NodeId;
use crate::observer::SubscriptionId;
use crate::port::PortId;
use crate::selection::{Selection, SelectionEvent};
use crate::tools::{
    DragHandle, DragOutcome, DropPayload, DropSession, Gesture, GridOccupancy, LinkHandle,
    LinkSession, MoveSession, Overlay, PlacementPolicy, ResizeEdge, RubberBandSession, Session,
    ToolContext,
};
use egui::{Modifiers, PointerButton};
use thiserror::Error;

/// Zoom change per scrolled point
const SCROLL_ZOOM_SPEED: f32 = 0.001;

/// Surface errors
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// A gesture was started while another one is running
    #[error("A {0} session is already active")]
    SessionActive(&'static str),

    /// A gesture call arrived with no session running
    #[error("No drag session is active")]
    NoActiveSession,

    /// None of the items can be dragged with the requested handle
    #[error("Nothing to drag")]
    NothingToDrag,

    /// Graph edit failed
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Host input, with positions in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A pointer button was pressed
    PointerDown {
        /// Pointer position
        pos: Pos2,
        /// Pressed button
        button: PointerButton,
        /// Held modifier keys
        modifiers: Modifiers,
    },
    /// The pointer moved
    PointerMove {
        /// Pointer position
        pos: Pos2,
    },
    /// A pointer button was released
    PointerUp {
        /// Pointer position
        pos: Pos2,
    },
    /// The host lost pointer capture
    CaptureLost,
    /// Cancel key
    Cancel,
    /// Delete key
    Delete,
    /// Scroll wheel, zooming around `pos`
    Scroll {
        /// Pointer position
        pos: Pos2,
        /// Scrolled distance
        delta: f32,
    },
    /// Pan the view by a screen-space offset
    Pan {
        /// Screen-space offset
        delta: Vec2,
    },
}

/// Interactive diagram surface
pub struct Surface<C: Controller> {
    graph: Graph,
    selection: Selection,
    config: SurfaceConfig,
    policy: Box<dyn PlacementPolicy>,
    controller: C,
    /// Current zoom level
    zoom: f32,
    /// Current pan offset (surface space)
    pan: Vec2,
    /// Screen rectangle the surface is shown in
    viewport: Rect,
    /// The single running gesture
    active: Option<Session>,
}

impl<C: Controller> Surface<C> {
    /// Create an empty surface
    pub fn new(config: SurfaceConfig, controller: C) -> Self {
        Self {
            graph: Graph::new("diagram"),
            selection: Selection::new(),
            config,
            policy: Box::new(GridOccupancy),
            controller,
            zoom: 1.0,
            pan: Vec2::ZERO,
            viewport: Rect::from_min_size(Pos2::ZERO, Vec2::ZERO),
            active: None,
        }
    }

    /// Replace the placement policy
    pub fn with_policy(mut self, policy: impl PlacementPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Replace the graph
    pub fn with_graph(mut self, graph: Graph) -> Self {
        self.graph = graph;
        self
    }

    /// The graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The graph, for programmatic edits
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// The selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The configuration
    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// The controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// The controller, mutably
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    fn parts(&mut self) -> (&mut Option<Session>, ToolContext<'_>) {
        (
            &mut self.active,
            ToolContext {
                graph: &mut self.graph,
                selection: &mut self.selection,
                controller: &mut self.controller,
                config: &self.config,
                policy: self.policy.as_ref(),
            },
        )
    }

    // ---- selection ---------------------------------------------------------

    /// Subscribe to selection changes
    pub fn subscribe_selection(
        &mut self,
        callback: impl FnMut(&SelectionEvent) + 'static,
    ) -> SubscriptionId {
        self.selection.subscribe(callback)
    }

    fn is_selectable(&self, item: ItemId) -> bool {
        self.graph
            .item(item)
            .is_some_and(|i| i.capabilities().selectable)
    }

    /// Select exactly one item
    pub fn select(&mut self, item: ItemId) {
        if self.is_selectable(item) {
            self.selection.set(&mut self.graph, item);
        }
    }

    /// Add an item to the selection
    pub fn add_to_selection(&mut self, item: ItemId) {
        if self.is_selectable(item) {
            self.selection.add(&mut self.graph, item);
        }
    }

    /// Toggle an item in the selection
    pub fn toggle_selection(&mut self, item: ItemId) {
        if self.is_selectable(item) {
            self.selection.toggle(&mut self.graph, item);
        }
    }

    /// Deselect an item
    pub fn deselect(&mut self, item: ItemId) {
        self.selection.remove(&mut self.graph, item);
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        self.selection.clear(&mut self.graph);
    }

    // ---- view transform ----------------------------------------------------

    /// Current zoom level
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Current pan offset
    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Screen rectangle the surface is shown in
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Set the screen rectangle the surface is shown in
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Convert screen position to surface position
    pub fn screen_to_surface(&self, screen_pos: Pos2) -> Pos2 {
        let center = self.viewport.center();
        Pos2::new(
            (screen_pos.x - center.x) / self.zoom - self.pan.x,
            (screen_pos.y - center.y) / self.zoom - self.pan.y,
        )
    }

    /// Convert surface position to screen position
    pub fn surface_to_screen(&self, surface_pos: Pos2) -> Pos2 {
        let center = self.viewport.center();
        Pos2::new(
            (surface_pos.x + self.pan.x) * self.zoom + center.x,
            (surface_pos.y + self.pan.y) * self.zoom + center.y,
        )
    }

    /// Scale the zoom by `factor`, keeping the surface point under
    /// `screen_pos` fixed
    pub fn zoom_at(&mut self, screen_pos: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = self.screen_to_surface(screen_pos);
        // Inverted or NaN limits from an unvalidated config must not panic here
        let zoom = (self.zoom * factor)
            .max(self.config.min_zoom)
            .min(self.config.max_zoom);
        if !zoom.is_finite() || zoom <= 0.0 || zoom == self.zoom {
            return;
        }
        self.zoom = zoom;
        self.pan = (screen_pos - self.viewport.center()) / zoom - anchor.to_vec2();
    }

    /// Pan by a screen-space offset
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan += screen_delta / self.zoom;
    }

    // ---- gestures ----------------------------------------------------------

    /// Whether a gesture is running
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// The running gesture
    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    fn ensure_idle(&self) -> Result<(), SurfaceError> {
        match &self.active {
            Some(session) => {
                tracing::warn!("Rejected new gesture: {} session is active", session.name());
                Err(SurfaceError::SessionActive(session.name()))
            }
            None => Ok(()),
        }
    }

    fn start(&mut self, session: Session) {
        tracing::debug!(session = session.name(), "drag started");
        self.active = Some(session);
    }

    /// Move or resize the selected items
    pub fn begin_move(&mut self, start: Pos2, handle: DragHandle) -> Result<(), SurfaceError> {
        let items: Vec<ItemId> = self.selection.items().collect();
        self.begin_move_items(start, &items, handle)
    }

    /// Move or resize specific items
    pub fn begin_move_items(
        &mut self,
        start: Pos2,
        items: &[ItemId],
        handle: DragHandle,
    ) -> Result<(), SurfaceError> {
        self.ensure_idle()?;
        let session = MoveSession::begin(&self.graph, start, items, handle)
            .ok_or(SurfaceError::NothingToDrag)?;
        self.start(Session::Move(session));
        Ok(())
    }

    /// Create a link from a port and drag its free end
    pub fn begin_new_link(&mut self, start: Pos2, port: PortId) -> Result<LinkId, SurfaceError> {
        self.ensure_idle()?;
        let session = LinkSession::begin_new_link(&mut self.graph, start, port)?;
        let link = session.link();
        self.start(Session::Link(session));
        Ok(link)
    }

    /// Drag an end or control point of an existing link
    pub fn begin_link_drag(
        &mut self,
        start: Pos2,
        link: LinkId,
        handle: LinkHandle,
    ) -> Result<(), SurfaceError> {
        self.ensure_idle()?;
        let session = LinkSession::begin(&mut self.graph, start, link, handle)?;
        self.start(Session::Link(session));
        Ok(())
    }

    /// Start a rubber-band selection
    pub fn begin_rubber_band(&mut self, start: Pos2) -> Result<(), SurfaceError> {
        self.ensure_idle()?;
        self.start(Session::RubberBand(RubberBandSession::begin(start)));
        Ok(())
    }

    /// Feed the pointer offset from the gesture start; returns whether
    /// releasing now would commit
    pub fn drag_to(&mut self, vector: Vec2) -> Result<bool, SurfaceError> {
        let (active, mut ctx) = self.parts();
        let session = active.as_mut().ok_or(SurfaceError::NoActiveSession)?;
        session.drag_to(&mut ctx, vector);
        Ok(session.can_drop())
    }

    /// Whether releasing now would commit
    pub fn can_drop(&self) -> bool {
        self.active.as_ref().is_some_and(Session::can_drop)
    }

    /// Finish the gesture, committing or rolling back
    pub fn end_drag(&mut self, commit: bool) -> Result<DragOutcome, SurfaceError> {
        let (active, mut ctx) = self.parts();
        let session = active.take().ok_or(SurfaceError::NoActiveSession)?;
        let name = session.name();
        let outcome = session.end(&mut ctx, commit);
        tracing::debug!(session = name, ?outcome, "drag ended");
        Ok(outcome)
    }

    /// Roll back the running gesture, if any
    pub fn cancel(&mut self) -> Option<DragOutcome> {
        self.end_drag(false).ok()
    }

    /// Overlay of the running gesture
    pub fn overlay(&self) -> Option<Overlay> {
        self.active.as_ref().and_then(Session::overlay)
    }

    // ---- external drag-drop ------------------------------------------------

    /// An external drag entered the surface; returns whether dropping here
    /// is allowed
    pub fn drag_enter(&mut self, pos: Pos2, payload: DropPayload) -> Result<bool, SurfaceError> {
        self.ensure_idle()?;
        let (_, ctx) = self.parts();
        let session = DropSession::enter(&ctx, payload, pos);
        let allowed = session.can_drop();
        self.start(Session::Drop(session));
        Ok(allowed)
    }

    /// The external drag moved; returns whether dropping here is allowed
    pub fn drag_over(&mut self, pos: Pos2) -> bool {
        let (active, ctx) = self.parts();
        match active {
            Some(Session::Drop(session)) => session.update(&ctx, pos),
            _ => false,
        }
    }

    /// The external drag left the surface
    pub fn drag_leave(&mut self) {
        if matches!(self.active, Some(Session::Drop(_))) {
            self.active = None;
            tracing::debug!("drag left");
        }
    }

    /// Drop the external payload at `pos`
    pub fn drop(&mut self, pos: Pos2) -> Option<NodeId> {
        let (active, mut ctx) = self.parts();
        if !matches!(active, Some(Session::Drop(_))) {
            return None;
        }
        let Some(Session::Drop(mut session)) = active.take() else {
            return None;
        };
        session.update(&ctx, pos);
        session.finish(&mut ctx)
    }

    // ---- editing -----------------------------------------------------------

    /// Remove a node with its links, dropping them from the selection.
    /// A running gesture is rolled back first.
    pub fn remove_node(&mut self, node: NodeId) -> Option<RemovedNode> {
        if self.is_dragging() {
            self.cancel();
        }
        self.deselect(ItemId::Node(node));
        for link in self.graph.links_of_node(node) {
            self.deselect(ItemId::Link(link));
        }
        self.graph.remove_node(node)
    }

    /// Delete every selected item. Links attached to deleted nodes go too.
    pub fn delete_selection(&mut self) -> (Vec<NodeId>, Vec<LinkId>) {
        if self.is_dragging() {
            self.cancel();
        }
        let items: Vec<ItemId> = self.selection.items().collect();
        if items.is_empty() {
            return (Vec::new(), Vec::new());
        }
        self.clear_selection();

        let mut links: Vec<LinkId> = items
            .iter()
            .filter_map(ItemId::as_link)
            .filter(|id| self.graph.remove_link(*id).is_some())
            .collect();
        let mut nodes = Vec::new();
        for id in items.iter().filter_map(ItemId::as_node) {
            if let Some(removed) = self.graph.remove_node(id) {
                nodes.push(id);
                links.extend(removed.links.iter().map(|l| l.id));
            }
        }

        tracing::info!("Deleted {} nodes and {} links", nodes.len(), links.len());
        self.controller.items_deleted(&nodes, &links);
        (nodes, links)
    }

    /// Move the selection by whole grid cells
    pub fn nudge_selection(&mut self, columns: i32, rows: i32) -> Result<DragOutcome, SurfaceError> {
        self.ensure_idle()?;
        let items: Vec<ItemId> = self.selection.items().collect();
        let mut session = MoveSession::begin(&self.graph, Pos2::ZERO, &items, DragHandle::Move)
            .ok_or(SurfaceError::NothingToDrag)?;
        let vector = Vec2::new(columns as f32, rows as f32) * self.config.grid_cell;
        let (_, mut ctx) = self.parts();
        session.drag_to(&mut ctx, vector);
        Ok(session.end(&mut ctx, true))
    }

    // ---- input -------------------------------------------------------------

    /// Dispatch one input event
    pub fn handle_input(&mut self, event: InputEvent) -> Result<(), SurfaceError> {
        match event {
            InputEvent::PointerDown {
                pos,
                button: PointerButton::Primary,
                modifiers,
            } => self.pointer_down(self.screen_to_surface(pos), modifiers),
            InputEvent::PointerDown { .. } => Ok(()),
            InputEvent::PointerMove { pos } => {
                let point = self.screen_to_surface(pos);
                if let Some(origin) = self.active.as_ref().and_then(Session::origin) {
                    self.drag_to(point - origin)?;
                }
                Ok(())
            }
            InputEvent::PointerUp { pos } => {
                let point = self.screen_to_surface(pos);
                if let Some(origin) = self.active.as_ref().and_then(Session::origin) {
                    self.drag_to(point - origin)?;
                    self.end_drag(true)?;
                }
                Ok(())
            }
            InputEvent::CaptureLost | InputEvent::Cancel => {
                if matches!(self.active, Some(Session::Drop(_))) {
                    return Ok(());
                }
                self.cancel();
                Ok(())
            }
            InputEvent::Delete => {
                self.delete_selection();
                Ok(())
            }
            InputEvent::Scroll { pos, delta } => {
                self.zoom_at(pos, 1.0 + delta * SCROLL_ZOOM_SPEED);
                Ok(())
            }
            InputEvent::Pan { delta } => {
                self.pan_by(delta);
                Ok(())
            }
        }
    }

    fn pointer_down(&mut self, point: Pos2, modifiers: Modifiers) -> Result<(), SurfaceError> {
        self.ensure_idle()?;
        let handle_radius = self.config.handle_size / self.zoom;

        if let Some((node, edge)) = self.resize_handle_at(point, handle_radius) {
            return self.begin_move_items(point, &[ItemId::Node(node)], DragHandle::Resize(edge));
        }

        if let Some((link, handle)) = self.link_handle_at(point, handle_radius) {
            return self.begin_link_drag(point, link, handle);
        }

        if let Some(port) = self.graph.port_at(point) {
            return self.begin_new_link(point, port).map(|_| ());
        }

        if let Some(node) = self.graph.node_at(point) {
            let item = ItemId::Node(node);
            if modifiers.shift {
                self.toggle_selection(item);
                return Ok(());
            }
            if !self.selection.contains(item) {
                self.select(item);
            }
            return match self.begin_move(point, DragHandle::Move) {
                Err(SurfaceError::NothingToDrag) => Ok(()),
                other => other,
            };
        }

        let tolerance = self.config.link_hit_tolerance / self.zoom;
        if let Some(link) = self.graph.link_at(point, tolerance) {
            let item = ItemId::Link(link);
            if modifiers.shift {
                self.toggle_selection(item);
            } else {
                self.select(item);
            }
            return Ok(());
        }

        if modifiers.shift {
            return Ok(());
        }
        // Committing the band replaces the selection; a bare click commits an empty one
        self.begin_rubber_band(point)
    }

    /// Resize handle of a selected, resizable node under `point`
    pub fn resize_handle_at(&self, point: Pos2, radius: f32) -> Option<(NodeId, ResizeEdge)> {
        self.selection
            .items()
            .filter_map(|item| item.as_node())
            .filter_map(|id| self.graph.node(id))
            .filter(|node| node.capabilities.resizable)
            .find_map(|node| {
                ResizeEdge::ALL
                    .into_iter()
                    .find(|edge| edge.handle_position(node.bounds()).distance(point) <= radius)
                    .map(|edge| (node.id, edge))
            })
    }

    /// End or control point handle of a selected link under `point`
    pub fn link_handle_at(&self, point: Pos2, radius: f32) -> Option<(LinkId, LinkHandle)> {
        self.selection
            .items()
            .filter_map(|item| item.as_link())
            .filter_map(|id| self.graph.link(id))
            .find_map(|link| {
                let path = link.path()?;
                if path.start().distance(point) <= radius {
                    return Some((link.id, LinkHandle::Source));
                }
                if path.end().distance(point) <= radius {
                    return Some((link.id, LinkHandle::Target));
                }
                let controls = if link.control_points().is_empty() {
                    path.interior()
                } else {
                    link.control_points()
                };
                controls
                    .iter()
                    .position(|p| p.distance(point) <= radius)
                    .map(|index| (link.id, LinkHandle::ControlPoint(index)))
            })
    }
}
