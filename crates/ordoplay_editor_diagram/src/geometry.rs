// SPDX-License-Identifier: MIT OR Apache-2.0
//! Point, vector and grid helpers shared by routing, hit testing and tools.
//!
//! The diagram works in surface coordinates using `egui`'s math types. All
//! helpers here are pure.

pub use egui::{Pos2, Rect, Vec2};

/// Midpoint between two points
pub fn midpoint(a: Pos2, b: Pos2) -> Pos2 {
    Pos2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

/// Direction angle (radians) of the vector pointing from `from` to `to`
pub fn angle(from: Pos2, to: Pos2) -> f32 {
    (to - from).angle()
}

/// Euclidean distance between two points
pub fn distance(a: Pos2, b: Pos2) -> f32 {
    a.distance(b)
}

/// Whether both coordinates of a point are finite
pub fn is_finite(p: Pos2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Axis-aligned rectangle spanned by two corners given in any order
pub fn rect_from_corners(a: Pos2, b: Pos2) -> Rect {
    Rect::from_min_max(
        Pos2::new(a.x.min(b.x), a.y.min(b.y)),
        Pos2::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

/// Whether `inner` lies entirely within `outer`. Shared edges count as inside.
pub fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.min.x <= inner.min.x
        && outer.min.y <= inner.min.y
        && inner.max.x <= outer.max.x
        && inner.max.y <= outer.max.y
}

/// Shortest distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Point where the ray from `center` toward `toward` leaves a circle
pub fn project_to_circle(center: Pos2, radius: f32, toward: Pos2) -> Pos2 {
    let dir = toward - center;
    let len = dir.length();
    if len <= f32::EPSILON {
        return center;
    }
    center + dir * (radius.min(len) / len)
}

/// Point where the ray from `center` toward `toward` leaves an axis-aligned
/// square of the given half extent
pub fn project_to_square(center: Pos2, half: f32, toward: Pos2) -> Pos2 {
    let dir = toward - center;
    let major = dir.x.abs().max(dir.y.abs());
    if major <= f32::EPSILON {
        return center;
    }
    let scale = half.min(major) / major;
    center + dir * scale
}

/// Round a scalar to the nearest multiple of `cell`
pub fn snap(value: f32, cell: f32) -> f32 {
    if cell > 0.0 {
        (value / cell).round() * cell
    } else {
        value
    }
}

/// Round both components of a vector to whole grid cells
pub fn snap_vec(v: Vec2, cell: f32) -> Vec2 {
    Vec2::new(snap(v.x, cell), snap(v.y, cell))
}

/// Top-left corner of the grid cell containing `p`
pub fn cell_origin(p: Pos2, cell: f32) -> Pos2 {
    if cell > 0.0 {
        Pos2::new((p.x / cell).floor() * cell, (p.y / cell).floor() * cell)
    } else {
        p
    }
}

/// Half-open range of grid cells covered by a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// First covered column
    pub min_col: i32,
    /// First covered row
    pub min_row: i32,
    /// One past the last covered column
    pub max_col: i32,
    /// One past the last covered row
    pub max_row: i32,
}

impl CellRange {
    /// Cells occupied by `rect` on a grid of `cell` sized squares.
    ///
    /// Degenerate rectangles still occupy the cell under their corner.
    pub fn of(rect: Rect, cell: f32) -> Self {
        let cell = if cell > 0.0 { cell } else { 1.0 };
        let min_col = (rect.min.x / cell).floor() as i32;
        let min_row = (rect.min.y / cell).floor() as i32;
        let max_col = ((rect.max.x / cell).ceil() as i32).max(min_col + 1);
        let max_row = ((rect.max.y / cell).ceil() as i32).max(min_row + 1);
        Self {
            min_col,
            min_row,
            max_col,
            max_row,
        }
    }

    /// Whether the two ranges share at least one cell
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.min_col < other.max_col
            && other.min_col < self.max_col
            && self.min_row < other.max_row
            && other.min_row < self.max_row
    }
}

/// Point on a cubic bezier curve at parameter `t`
pub fn cubic_bezier(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, t: f32) -> Pos2 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let mt3 = mt2 * mt;

    let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
    let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;
    Pos2::new(x, y)
}

/// Generate points along a cubic bezier curve
pub fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| cubic_bezier(p0, p1, p2, p3, i as f32 / segments as f32))
        .collect()
}

/// Smallest rectangle containing every point, or `None` for an empty slice
pub fn bounding_rect(points: &[Pos2]) -> Option<Rect> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold(Rect::from_min_max(first, first), |r, p| r.union(Rect::from_min_max(*p, *p))),
    )
}
