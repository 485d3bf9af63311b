// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link path routing.
//!
//! A path is computed from the two resolved link ends plus any user-placed
//! control points. When both ends sit on ports the end points are pulled in
//! to the port outlines, so lines touch the rendered shape instead of its
//! center. Paths with non-finite coordinates are discarded.

use crate::geometry::{self, Pos2, Rect};
use crate::port::Port;
use serde::{Deserialize, Serialize};

/// Samples per bezier when flattening for hit tests and bounds
pub const BEZIER_SEGMENTS: usize = 24;

/// Routing style of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Routing {
    /// Straight segments through any control points
    Straight,
    /// Axis-aligned segments with two default bends, or elbows through
    /// the control points
    Orthogonal,
    /// Cubic bezier curve
    #[default]
    Bezier,
}

/// Geometry of a resolved link end
#[derive(Debug, Clone, Copy)]
pub enum EndpointGeometry<'a> {
    /// End bound to a port
    Port(&'a Port),
    /// End floating at a point
    Floating(Pos2),
}

impl EndpointGeometry<'_> {
    /// Raw point before any edge projection
    pub fn raw_point(&self) -> Pos2 {
        match self {
            Self::Port(port) => port.center(),
            Self::Floating(p) => *p,
        }
    }
}

/// How the points of a [`LinkPath`] are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathShape {
    /// Points are polyline vertices
    Polyline,
    /// Points are `[start, control1, control2, end]` of a cubic bezier
    Bezier,
}

/// Renderable path of a link.
///
/// Only [`route`] builds paths: a polyline has at least two points and a
/// bezier exactly four.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPath {
    shape: PathShape,
    points: Vec<Pos2>,
}

impl LinkPath {
    /// Interpretation of [`LinkPath::points`]
    pub fn shape(&self) -> PathShape {
        self.shape
    }

    /// Start, interior points, end
    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    /// First point
    pub fn start(&self) -> Pos2 {
        self.points[0]
    }

    /// Last point
    pub fn end(&self) -> Pos2 {
        self.points[self.points.len() - 1]
    }

    /// Interior points: bezier controls or polyline bends
    pub fn interior(&self) -> &[Pos2] {
        &self.points[1..self.points.len() - 1]
    }

    /// Direction (radians) in which the path leaves its start
    pub fn start_angle(&self) -> f32 {
        let start = self.start();
        let next = self.points[1..]
            .iter()
            .copied()
            .find(|p| *p != start)
            .unwrap_or(start);
        geometry::angle(start, next)
    }

    /// Direction (radians) in which the path arrives at its end, for arrowheads
    pub fn end_angle(&self) -> f32 {
        let end = self.end();
        let prev = self.points[..self.points.len() - 1]
            .iter()
            .rev()
            .copied()
            .find(|p| *p != end)
            .unwrap_or(end);
        geometry::angle(prev, end)
    }

    /// Point halfway along the path parameter, used for labels
    pub fn midpoint(&self) -> Pos2 {
        match self.shape {
            PathShape::Bezier => geometry::cubic_bezier(
                self.points[0],
                self.points[1],
                self.points[2],
                self.points[3],
                0.5,
            ),
            PathShape::Polyline => {
                let flat = self.flatten();
                let total: f32 = flat.windows(2).map(|w| w[0].distance(w[1])).sum();
                let mut remaining = total * 0.5;
                for w in flat.windows(2) {
                    let len = w[0].distance(w[1]);
                    if len >= remaining && len > 0.0 {
                        return w[0].lerp(w[1], remaining / len);
                    }
                    remaining -= len;
                }
                self.start()
            }
        }
    }

    /// Polyline approximation of the path
    pub fn flatten(&self) -> Vec<Pos2> {
        match self.shape {
            PathShape::Bezier => geometry::bezier_points(
                self.points[0],
                self.points[1],
                self.points[2],
                self.points[3],
                BEZIER_SEGMENTS,
            ),
            PathShape::Polyline => self.points.clone(),
        }
    }

    /// Shortest distance from `point` to the path
    pub fn distance_to(&self, point: Pos2) -> f32 {
        self.flatten()
            .windows(2)
            .map(|w| geometry::distance_to_segment(point, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }

    /// Bounds of the flattened path
    pub fn bounds(&self) -> Option<Rect> {
        geometry::bounding_rect(&self.flatten())
    }
}

/// Compute the path for a link.
///
/// Returns `None` when any resulting coordinate is not finite.
pub fn route(
    source: EndpointGeometry<'_>,
    target: EndpointGeometry<'_>,
    control_points: &[Pos2],
    routing: Routing,
) -> Option<LinkPath> {
    let raw_source = source.raw_point();
    let raw_target = target.raw_point();

    let (start, end) = match (source, target) {
        (EndpointGeometry::Port(s), EndpointGeometry::Port(t)) => {
            (s.edge_point(raw_target), t.edge_point(raw_source))
        }
        _ => (raw_source, raw_target),
    };

    let path = match routing {
        Routing::Straight => LinkPath {
            shape: PathShape::Polyline,
            points: through(start, control_points, end),
        },
        Routing::Orthogonal => {
            let points = if control_points.is_empty() {
                let mid_x = geometry::midpoint(start, end).x;
                vec![start, Pos2::new(mid_x, start.y), Pos2::new(mid_x, end.y), end]
            } else {
                elbows_through(start, control_points, end)
            };
            LinkPath {
                shape: PathShape::Polyline,
                points,
            }
        }
        Routing::Bezier => {
            let (c1, c2) = match control_points {
                [] => default_controls(start, end),
                [only] => (*only, *only),
                [first, second, ..] => (*first, *second),
            };
            LinkPath {
                shape: PathShape::Bezier,
                points: vec![start, c1, c2, end],
            }
        }
    };

    if path.points.iter().all(|p| geometry::is_finite(*p)) {
        Some(path)
    } else {
        tracing::trace!("discarding link path with non-finite coordinates");
        None
    }
}

fn through(start: Pos2, interior: &[Pos2], end: Pos2) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(interior.len() + 2);
    points.push(start);
    points.extend_from_slice(interior);
    points.push(end);
    points
}

/// Visit every point in order, inserting a horizontal-first elbow wherever two
/// consecutive points share neither axis
fn elbows_through(start: Pos2, interior: &[Pos2], end: Pos2) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(2 * interior.len() + 3);
    points.push(start);
    let mut prev = start;
    for &next in interior.iter().chain(std::iter::once(&end)) {
        if prev.x != next.x && prev.y != next.y {
            points.push(Pos2::new(next.x, prev.y));
        }
        points.push(next);
        prev = next;
    }
    points
}

/// Controls halfway between each end and the overall midpoint, pushed onto
/// the end's row (or column for mostly vertical links)
fn default_controls(start: Pos2, end: Pos2) -> (Pos2, Pos2) {
    let mid = geometry::midpoint(start, end);
    let near_start = geometry::midpoint(start, mid);
    let near_end = geometry::midpoint(mid, end);
    let delta = end - start;
    if delta.x.abs() >= delta.y.abs() {
        (Pos2::new(near_start.x, start.y), Pos2::new(near_end.x, end.y))
    } else {
        (Pos2::new(start.x, near_start.y), Pos2::new(end.x, near_end.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    fn placed_port(center: Pos2, radius: f32) -> Port {
        let mut port = Port::new("p").with_radius(radius);
        let bounds = Rect::from_center_size(center, Vec2::splat(10.0));
        let c = port.center_in(bounds);
        port.set_center(c);
        port
    }

    #[test]
    fn test_straight_between_floating_points() {
        let path = route(
            EndpointGeometry::Floating(Pos2::ZERO),
            EndpointGeometry::Floating(Pos2::new(10.0, 0.0)),
            &[],
            Routing::Straight,
        )
        .unwrap();
        assert_eq!(path.points, vec![Pos2::ZERO, Pos2::new(10.0, 0.0)]);
        assert_eq!(path.start_angle(), 0.0);
        assert_eq!(path.midpoint(), Pos2::new(5.0, 0.0));
    }

    #[test]
    fn test_ports_are_trimmed_to_outline() {
        let a = placed_port(Pos2::ZERO, 5.0);
        let b = placed_port(Pos2::new(100.0, 0.0), 5.0);
        let path = route(
            EndpointGeometry::Port(&a),
            EndpointGeometry::Port(&b),
            &[],
            Routing::Straight,
        )
        .unwrap();
        assert_eq!(path.start(), Pos2::new(5.0, 0.0));
        assert_eq!(path.end(), Pos2::new(95.0, 0.0));
    }

    #[test]
    fn test_single_port_end_is_not_trimmed() {
        let a = placed_port(Pos2::ZERO, 5.0);
        let path = route(
            EndpointGeometry::Port(&a),
            EndpointGeometry::Floating(Pos2::new(50.0, 0.0)),
            &[],
            Routing::Straight,
        )
        .unwrap();
        assert_eq!(path.start(), Pos2::ZERO);
    }

    #[test]
    fn test_bezier_default_controls() {
        let path = route(
            EndpointGeometry::Floating(Pos2::ZERO),
            EndpointGeometry::Floating(Pos2::new(100.0, 40.0)),
            &[],
            Routing::Bezier,
        )
        .unwrap();
        assert_eq!(path.shape, PathShape::Bezier);
        assert_eq!(path.interior(), &[Pos2::new(25.0, 0.0), Pos2::new(75.0, 40.0)]);
        assert_eq!(path.start_angle(), 0.0);
        assert_eq!(path.end_angle(), 0.0);
    }

    #[test]
    fn test_explicit_controls_take_precedence() {
        let controls = [Pos2::new(0.0, 50.0), Pos2::new(100.0, 50.0)];
        let path = route(
            EndpointGeometry::Floating(Pos2::ZERO),
            EndpointGeometry::Floating(Pos2::new(100.0, 0.0)),
            &controls,
            Routing::Bezier,
        )
        .unwrap();
        assert_eq!(path.interior(), &controls);
    }

    #[test]
    fn test_orthogonal_bends() {
        let path = route(
            EndpointGeometry::Floating(Pos2::ZERO),
            EndpointGeometry::Floating(Pos2::new(40.0, 20.0)),
            &[],
            Routing::Orthogonal,
        )
        .unwrap();
        assert_eq!(
            path.points,
            vec![
                Pos2::ZERO,
                Pos2::new(20.0, 0.0),
                Pos2::new(20.0, 20.0),
                Pos2::new(40.0, 20.0)
            ]
        );
        assert!((path.distance_to(Pos2::new(22.0, 10.0)) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_orthogonal_stays_axis_aligned_through_moved_bends() {
        let bends = [Pos2::new(25.0, 30.0), Pos2::new(20.0, 20.0)];
        let path = route(
            EndpointGeometry::Floating(Pos2::ZERO),
            EndpointGeometry::Floating(Pos2::new(40.0, 20.0)),
            &bends,
            Routing::Orthogonal,
        )
        .unwrap();

        assert_eq!(path.start(), Pos2::ZERO);
        assert_eq!(path.end(), Pos2::new(40.0, 20.0));
        assert!(bends.iter().all(|b| path.points().contains(b)));
        for w in path.points().windows(2) {
            assert!(
                w[0].x == w[1].x || w[0].y == w[1].y,
                "diagonal segment {:?} -> {:?}",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn test_nan_yields_no_geometry() {
        let path = route(
            EndpointGeometry::Floating(Pos2::new(f32::NAN, 0.0)),
            EndpointGeometry::Floating(Pos2::new(10.0, 0.0)),
            &[],
            Routing::Bezier,
        );
        assert!(path.is_none());
    }
}
