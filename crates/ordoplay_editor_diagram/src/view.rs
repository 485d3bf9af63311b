// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui front end for a [`Surface`].
//!
//! Features:
//! - Grid, node, port and link rendering
//! - Pointer, keyboard and scroll input forwarded to the surface tools
//! - Gesture overlays (rubber band, placement, link preview, drop ghost)
//! - Status bar

use crate::controller::Controller;
use crate::geometry::{Pos2, Rect, Vec2};
use crate::item::DiagramItem;
use crate::node::Node;
use crate::port::{Port, PortShape};
use crate::surface::{InputEvent, Surface};
use crate::tools::{Overlay, ResizeEdge};
use egui::{Color32, PointerButton, Stroke};

/// Node visual parameters
const NODE_ROUNDING: f32 = 6.0;
const NODE_SHADOW_OFFSET: f32 = 3.0;

/// Link visual parameters
const LINK_THICKNESS: f32 = 2.0;
const ARROW_LENGTH: f32 = 10.0;
const ARROW_SPREAD: f32 = 0.45;

/// Grid lines closer than this (screen points) are not drawn
const MIN_GRID_SPACING: f32 = 6.0;

/// Renders a surface and feeds it egui input
#[derive(Debug, Clone)]
pub struct SurfaceView {
    /// Show the status bar
    pub show_status_bar: bool,
    /// Last known pointer position
    last_pointer: Pos2,
}

impl Default for SurfaceView {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceView {
    /// Create a view
    pub fn new() -> Self {
        Self {
            show_status_bar: true,
            last_pointer: Pos2::ZERO,
        }
    }

    /// Show the surface in the remaining space of `ui`
    pub fn ui<C: Controller>(&mut self, ui: &mut egui::Ui, surface: &mut Surface<C>) -> egui::Response {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        surface.set_viewport(rect);

        for event in self.collect_input(ui, &response, rect) {
            if let Err(e) = surface.handle_input(event) {
                tracing::warn!("Input ignored: {e}");
            }
        }
        self.handle_nudge(ui, surface);

        let painter = ui.painter_at(rect);
        if surface.config().show_grid {
            draw_grid(&painter, rect, surface);
        }
        draw_links(&painter, surface);
        draw_nodes(&painter, surface);
        if let Some(overlay) = surface.overlay() {
            draw_overlay(&painter, surface, &overlay);
        }
        if self.show_status_bar {
            draw_status_bar(&painter, rect, surface);
        }

        response
    }

    fn collect_input(&mut self, ui: &egui::Ui, response: &egui::Response, rect: Rect) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let (pointer, press_origin, modifiers, scroll) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.press_origin(),
                i.modifiers,
                i.raw_scroll_delta.y,
            )
        });
        let pos = pointer.unwrap_or(self.last_pointer);
        self.last_pointer = pos;

        if response.drag_started_by(PointerButton::Primary) {
            events.push(InputEvent::PointerDown {
                pos: press_origin.unwrap_or(pos),
                button: PointerButton::Primary,
                modifiers,
            });
        } else if response.clicked() {
            events.push(InputEvent::PointerDown {
                pos,
                button: PointerButton::Primary,
                modifiers,
            });
            events.push(InputEvent::PointerUp { pos });
        }

        if response.dragged_by(PointerButton::Primary) {
            events.push(InputEvent::PointerMove { pos });
        }
        if response.drag_stopped_by(PointerButton::Primary) {
            events.push(InputEvent::PointerUp { pos });
        }

        if response.dragged_by(PointerButton::Middle) {
            events.push(InputEvent::Pan {
                delta: response.drag_delta(),
            });
        }

        if scroll != 0.0 && rect.contains(pos) {
            events.push(InputEvent::Scroll { pos, delta: scroll });
        }

        ui.input(|i| {
            if i.key_pressed(egui::Key::Escape) {
                events.push(InputEvent::Cancel);
            }
            if i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace) {
                events.push(InputEvent::Delete);
            }
        });
        events
    }

    fn handle_nudge<C: Controller>(&self, ui: &egui::Ui, surface: &mut Surface<C>) {
        if surface.is_dragging() || surface.selection().is_empty() {
            return;
        }
        let (columns, rows) = ui.input(|i| {
            let mut step = (0, 0);
            if i.key_pressed(egui::Key::ArrowLeft) {
                step.0 -= 1;
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                step.0 += 1;
            }
            if i.key_pressed(egui::Key::ArrowUp) {
                step.1 -= 1;
            }
            if i.key_pressed(egui::Key::ArrowDown) {
                step.1 += 1;
            }
            step
        });
        if (columns, rows) != (0, 0) {
            if let Err(e) = surface.nudge_selection(columns, rows) {
                tracing::debug!("Nudge skipped: {e}");
            }
        }
    }
}

fn screen_rect<C: Controller>(surface: &Surface<C>, rect: Rect) -> Rect {
    Rect::from_min_max(surface.surface_to_screen(rect.min), surface.surface_to_screen(rect.max))
}

fn draw_grid<C: Controller>(painter: &egui::Painter, rect: Rect, surface: &Surface<C>) {
    let spacing = surface.config().grid_cell * surface.zoom();
    if spacing < MIN_GRID_SPACING {
        return;
    }
    let major_spacing = spacing * 5.0;

    let grid_color_minor = Color32::from_rgba_unmultiplied(60, 60, 60, 100);
    let grid_color_major = Color32::from_rgba_unmultiplied(80, 80, 80, 150);

    let origin = surface.surface_to_screen(Pos2::ZERO);

    for (step, color) in [(spacing, grid_color_minor), (major_spacing, grid_color_major)] {
        let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
        while x < rect.right() {
            painter.line_segment(
                [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                Stroke::new(1.0, color),
            );
            x += step;
        }

        let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
        while y < rect.bottom() {
            painter.line_segment(
                [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                Stroke::new(1.0, color),
            );
            y += step;
        }
    }
}

fn draw_links<C: Controller>(painter: &egui::Painter, surface: &Surface<C>) {
    let highlighted = match surface.overlay() {
        Some(Overlay::LinkPreview { link, allowed }) => Some((link, allowed)),
        _ => None,
    };

    for link in surface.graph().links() {
        // Links without geometry are not rendered
        let Some(path) = link.path() else {
            continue;
        };

        let color = match highlighted {
            Some((id, true)) if id == link.id => Color32::from_rgb(120, 220, 120),
            Some((id, false)) if id == link.id => Color32::from_rgb(220, 160, 80),
            _ if link.is_selected() => Color32::WHITE,
            _ => Color32::from_gray(170),
        };
        let stroke = Stroke::new(LINK_THICKNESS * surface.zoom(), color);

        let points: Vec<Pos2> = path
            .flatten()
            .into_iter()
            .map(|p| surface.surface_to_screen(p))
            .collect();
        for w in points.windows(2) {
            painter.line_segment([w[0], w[1]], stroke);
        }

        // Arrowhead
        let tip = surface.surface_to_screen(path.end());
        let angle = path.end_angle();
        let length = ARROW_LENGTH * surface.zoom();
        for side in [-ARROW_SPREAD, ARROW_SPREAD] {
            let back = Vec2::angled(angle + std::f32::consts::PI + side) * length;
            painter.line_segment([tip, tip + back], stroke);
        }

        if link.is_selected() {
            let handle = surface.config().handle_size;
            for p in [path.start(), path.end()] {
                painter.circle_stroke(surface.surface_to_screen(p), handle, Stroke::new(1.5, color));
            }
        }
    }
}

fn draw_nodes<C: Controller>(painter: &egui::Painter, surface: &Surface<C>) {
    let zoom = surface.zoom();
    for node in surface.graph().nodes() {
        let node_rect = screen_rect(surface, node.bounds());
        if !node_rect.intersects(painter.clip_rect()) {
            continue;
        }

        // Draw shadow
        painter.rect_filled(
            node_rect.translate(Vec2::splat(NODE_SHADOW_OFFSET)),
            NODE_ROUNDING * zoom,
            Color32::from_rgba_unmultiplied(0, 0, 0, 60),
        );

        let bg_color = if node.is_selected() {
            Color32::from_rgb(60, 70, 90)
        } else {
            Color32::from_rgb(45, 45, 48)
        };
        painter.rect_filled(node_rect, NODE_ROUNDING * zoom, bg_color);

        painter.text(
            node_rect.center(),
            egui::Align2::CENTER_CENTER,
            &node.kind,
            egui::FontId::proportional(12.0 * zoom),
            Color32::WHITE,
        );

        if node.is_selected() {
            painter.rect_stroke(
                node_rect,
                NODE_ROUNDING * zoom,
                Stroke::new(2.0, Color32::from_rgb(100, 150, 255)),
            );
            if node.capabilities.resizable {
                draw_resize_handles(painter, surface, node);
            }
        }

        for port in node.ports() {
            draw_port(painter, surface, port);
        }
    }
}

fn draw_resize_handles<C: Controller>(painter: &egui::Painter, surface: &Surface<C>, node: &Node) {
    let size = surface.config().handle_size;
    for edge in ResizeEdge::ALL {
        let center = surface.surface_to_screen(edge.handle_position(node.bounds()));
        painter.rect_filled(
            Rect::from_center_size(center, Vec2::splat(size)),
            1.0,
            Color32::from_rgb(100, 150, 255),
        );
    }
}

fn draw_port<C: Controller>(painter: &egui::Painter, surface: &Surface<C>, port: &Port) {
    let center = surface.surface_to_screen(port.center());
    let radius = port.radius * surface.zoom();
    let color = match (port.accepts_incoming, port.accepts_outgoing) {
        (true, false) => Color32::from_rgb(100, 180, 255),
        (false, true) => Color32::from_rgb(255, 180, 100),
        _ => Color32::from_rgb(180, 180, 180),
    };
    let outline = Stroke::new(1.0, Color32::from_gray(30));

    match port.shape {
        PortShape::Circle => {
            painter.circle_filled(center, radius, color);
            painter.circle_stroke(center, radius, outline);
        }
        PortShape::Square => {
            let rect = Rect::from_center_size(center, Vec2::splat(radius * 2.0));
            painter.rect_filled(rect, 0.0, color);
            painter.rect_stroke(rect, 0.0, outline);
        }
    }
}

fn draw_overlay<C: Controller>(painter: &egui::Painter, surface: &Surface<C>, overlay: &Overlay) {
    let accent = Color32::from_rgb(100, 150, 255);
    let blocked = Color32::from_rgb(230, 80, 80);
    match overlay {
        Overlay::RubberBand(rect) => {
            let rect = screen_rect(surface, *rect);
            painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(100, 150, 255, 30));
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, accent));
        }
        Overlay::Placement { bounds, allowed } => {
            // Allowed candidates are already applied to the nodes
            if !allowed {
                for rect in bounds {
                    painter.rect_stroke(
                        screen_rect(surface, *rect),
                        NODE_ROUNDING * surface.zoom(),
                        Stroke::new(2.0, blocked),
                    );
                }
            }
        }
        Overlay::LinkPreview { .. } => {}
        Overlay::DropPreview { bounds, allowed } => {
            let color = if *allowed { accent } else { blocked };
            let rect = screen_rect(surface, *bounds);
            painter.rect_filled(rect, NODE_ROUNDING * surface.zoom(), color.gamma_multiply(0.25));
            painter.rect_stroke(rect, NODE_ROUNDING * surface.zoom(), Stroke::new(1.5, color));
        }
    }
}

fn draw_status_bar<C: Controller>(painter: &egui::Painter, rect: Rect, surface: &Surface<C>) {
    let status_pos = Pos2::new(rect.left() + 5.0, rect.bottom() - 11.0);
    let graph = surface.graph();
    painter.text(
        status_pos,
        egui::Align2::LEFT_CENTER,
        format!(
            "Nodes: {} | Links: {} | Zoom: {:.0}% | Selected: {}",
            graph.node_count(),
            graph.link_count(),
            surface.zoom() * 100.0,
            surface.selection().len(),
        ),
        egui::FontId::proportional(11.0),
        Color32::from_gray(150),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceConfig;
    use crate::controller::NullController;
    use crate::item::ItemId;

    fn frame(
        ctx: &egui::Context,
        events: Vec<egui::Event>,
        view: &mut SurfaceView,
        surface: &mut Surface<NullController>,
    ) {
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))),
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                view.ui(ui, surface);
            });
        });
    }

    fn key(key: egui::Key) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }
    }

    fn populated() -> Surface<NullController> {
        let mut surface = Surface::new(SurfaceConfig::default(), NullController);
        let out = Port::output("out");
        let input = Port::input("in").with_shape(PortShape::Square);
        let (out_id, in_id) = (out.id, input.id);
        let a = surface
            .graph_mut()
            .add_node(Node::at("a", 0.0, 0.0, 40.0, 20.0).with_port(out));
        surface
            .graph_mut()
            .add_node(Node::at("b", 100.0, 0.0, 40.0, 20.0).with_port(input));
        let link = surface.graph_mut().connect(out_id, in_id).unwrap();
        surface.select(ItemId::Node(a));
        surface.add_to_selection(ItemId::Link(link));
        surface
    }

    #[test]
    fn test_renders_headless_and_sets_viewport() {
        let ctx = egui::Context::default();
        let mut view = SurfaceView::new();
        let mut surface = populated();
        surface.begin_rubber_band(Pos2::new(-50.0, -50.0)).unwrap();
        surface.drag_to(Vec2::new(30.0, 30.0)).unwrap();

        frame(&ctx, Vec::new(), &mut view, &mut surface);

        assert!(surface.viewport().width() > 0.0);
        assert!(surface.is_dragging());
    }

    #[test]
    fn test_escape_cancels_gesture() {
        let ctx = egui::Context::default();
        let mut view = SurfaceView::new();
        let mut surface = populated();
        surface.begin_rubber_band(Pos2::new(-50.0, -50.0)).unwrap();

        frame(&ctx, vec![key(egui::Key::Escape)], &mut view, &mut surface);

        assert!(!surface.is_dragging());
        assert_eq!(surface.selection().len(), 2);
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let ctx = egui::Context::default();
        let mut view = SurfaceView::new();
        let mut surface = populated();

        frame(&ctx, vec![key(egui::Key::Delete)], &mut view, &mut surface);

        assert_eq!(surface.graph().node_count(), 1);
        assert_eq!(surface.graph().link_count(), 0);
        assert!(surface.selection().is_empty());
    }

    #[test]
    fn test_arrow_keys_nudge_selection() {
        let ctx = egui::Context::default();
        let mut view = SurfaceView::new();
        let mut surface = populated();

        frame(&ctx, vec![key(egui::Key::ArrowDown)], &mut view, &mut surface);

        let a = surface.graph().nodes().next().unwrap();
        assert_eq!(a.position(), Pos2::new(0.0, 20.0));
    }
}
