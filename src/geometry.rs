//! Shape-aware point math shared by layout, routing, label placement and
//! hit-testing. Everything here works in world coordinates and never panics
//! on degenerate input: zero-length vectors fall back to a unit length.

use crate::ir::StateShape;

pub type Point = (f32, f32);

/// Border points on rectangles stay this far inside the corner so edges do
/// not start exactly on the rounded outline.
const RECT_BORDER_INSET: f32 = 4.0;
const ELLIPSE_BORDER_INSET: f32 = 1.0;
const ARC_SAMPLES_PER_UNIT_T: f32 = 36.0;
const ARC_MIN_SAMPLES: usize = 6;
const ARC_BISECT_ITERATIONS: usize = 22;
const ARC_T_MIN: f32 = 0.1;
const ARC_T_MAX: f32 = 0.9;

/// Length of `v`, or 1 when the vector is degenerate so callers can divide by it.
pub fn length_or_one(v: Point) -> f32 {
    let len = v.0.hypot(v.1);
    if len.is_finite() && len > f32::EPSILON {
        len
    } else {
        1.0
    }
}

pub fn normalize(v: Point) -> Point {
    let len = length_or_one(v);
    (v.0 / len, v.1 / len)
}

/// Left-hand normal of the direction `a -> b`, normalized.
pub fn chord_normal(a: Point, b: Point) -> Point {
    let (dx, dy) = normalize((b.0 - a.0, b.1 - a.1));
    (-dy, dx)
}

pub fn distance(a: Point, b: Point) -> f32 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Point on the outline of a node centred at `center` in the direction of `other`.
pub fn border_point(center: Point, other: Point, rx: f32, ry: f32, shape: StateShape) -> Point {
    let dx = other.0 - center.0;
    let dy = other.1 - center.1;
    if dx == 0.0 && dy == 0.0 {
        return center;
    }
    match shape {
        StateShape::Rectangle => {
            let hx = (rx - RECT_BORDER_INSET).max(1.0);
            let hy = (ry - RECT_BORDER_INSET).max(1.0);
            let k = 1.0 / (dx.abs() / hx).max(dy.abs() / hy);
            (center.0 + dx * k, center.1 + dy * k)
        }
        StateShape::Oval => {
            let angle = dy.atan2(dx);
            (
                center.0 + (rx - ELLIPSE_BORDER_INSET) * angle.cos(),
                center.1 + (ry - ELLIPSE_BORDER_INSET) * angle.sin(),
            )
        }
    }
}

/// Whether `p` lies inside the node outline (inclusive).
pub fn shape_contains(center: Point, rx: f32, ry: f32, shape: StateShape, p: Point) -> bool {
    let dx = p.0 - center.0;
    let dy = p.1 - center.1;
    match shape {
        StateShape::Rectangle => dx.abs() <= rx && dy.abs() <= ry,
        StateShape::Oval => {
            if rx <= 0.0 || ry <= 0.0 {
                return false;
            }
            (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry) <= 1.0
        }
    }
}

pub fn quad_point(t: f32, p0: Point, p1: Point, p2: Point) -> Point {
    let mt = 1.0 - t;
    (
        mt * mt * p0.0 + 2.0 * mt * t * p1.0 + t * t * p2.0,
        mt * mt * p0.1 + 2.0 * mt * t * p1.1 + t * t * p2.1,
    )
}

pub fn quad_tangent(t: f32, p0: Point, p1: Point, p2: Point) -> Point {
    (
        2.0 * (1.0 - t) * (p1.0 - p0.0) + 2.0 * t * (p2.0 - p1.0),
        2.0 * (1.0 - t) * (p1.1 - p0.1) + 2.0 * t * (p2.1 - p1.1),
    )
}

/// Polyline approximation of the arc length from `t = 0` to `t`.
pub fn arc_length_to(t: f32, p0: Point, p1: Point, p2: Point) -> f32 {
    let steps = ((t * ARC_SAMPLES_PER_UNIT_T).ceil() as usize).max(ARC_MIN_SAMPLES);
    let mut len = 0.0;
    let mut prev = quad_point(0.0, p0, p1, p2);
    for i in 1..=steps {
        let ti = t * i as f32 / steps as f32;
        let cur = quad_point(ti, p0, p1, p2);
        len += distance(prev, cur);
        prev = cur;
    }
    len
}

/// Smallest parameter whose arc length from the start reaches `min_len`,
/// clamped to `[0.1, 0.9]`.
pub fn t_for_arc_from_start(min_len: f32, p0: Point, p1: Point, p2: Point) -> f32 {
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    for _ in 0..ARC_BISECT_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        if arc_length_to(mid, p0, p1, p2) < min_len {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi.clamp(ARC_T_MIN, ARC_T_MAX)
}

/// Largest parameter whose arc length to the end still reaches `min_len`.
pub fn t_for_arc_from_end(min_len: f32, p0: Point, p1: Point, p2: Point) -> f32 {
    1.0 - t_for_arc_from_start(min_len, p2, p1, p0)
}

/// Triangle for an arrowhead whose tip sits at `tip`, pointing along `dir`.
pub fn arrow_triangle(tip: Point, dir: Point, length: f32, half_width: f32) -> [Point; 3] {
    let (ux, uy) = normalize(dir);
    let tx = tip.0 + ux * 0.5;
    let ty = tip.1 + uy * 0.5;
    [
        (tx, ty),
        (tx - length * ux + half_width * uy, ty - length * uy - half_width * ux),
        (tx - length * ux - half_width * uy, ty - length * uy + half_width * ux),
    ]
}

/// Axis-aligned rectangle stored by its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl CenterRect {
    pub fn new(center: Point, w: f32, h: f32) -> Self {
        Self {
            x: center.0,
            y: center.1,
            w,
            h,
        }
    }

    /// Strict overlap; rectangles that only touch do not intersect.
    pub fn intersects(&self, other: &CenterRect) -> bool {
        (self.x - other.x).abs() * 2.0 < self.w + other.w
            && (self.y - other.y).abs() * 2.0 < self.h + other.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    pub fn include_box(&mut self, center: Point, rx: f32, ry: f32) {
        self.min_x = self.min_x.min(center.0 - rx);
        self.max_x = self.max_x.max(center.0 + rx);
        self.min_y = self.min_y.min(center.1 - ry);
        self.max_y = self.max_y.max(center.1 + ry);
    }

    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.max_x >= self.min_x
            && self.max_y >= self.min_y
    }

    pub fn inflate(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn zero_vectors_do_not_produce_nan() {
        let n = normalize((0.0, 0.0));
        assert!(n.0.is_finite() && n.1.is_finite());
        let normal = chord_normal((3.0, 3.0), (3.0, 3.0));
        assert!(normal.0.is_finite() && normal.1.is_finite());
        let tri = arrow_triangle((1.0, 1.0), (0.0, 0.0), 12.0, 7.0);
        assert!(tri.iter().all(|p| p.0.is_finite() && p.1.is_finite()));
    }

    #[test]
    fn border_point_on_ellipse_and_rectangle() {
        let p = border_point((0.0, 0.0), (100.0, 0.0), 32.0, 22.0, StateShape::Oval);
        assert!(close(p.0, 31.0) && close(p.1, 0.0));
        let p = border_point((0.0, 0.0), (0.0, -100.0), 55.0, 35.0, StateShape::Rectangle);
        assert!(close(p.0, 0.0) && close(p.1, -31.0));
        let p = border_point((5.0, 5.0), (5.0, 5.0), 10.0, 10.0, StateShape::Oval);
        assert_eq!(p, (5.0, 5.0));
    }

    #[test]
    fn quad_curve_endpoints_and_tangent() {
        let (p0, p1, p2) = ((0.0, 0.0), (50.0, -40.0), (100.0, 0.0));
        assert_eq!(quad_point(0.0, p0, p1, p2), p0);
        assert_eq!(quad_point(1.0, p0, p1, p2), p2);
        let t = quad_tangent(0.5, p0, p1, p2);
        assert!(close(t.1, 0.0));
        assert!(t.0 > 0.0);
    }

    #[test]
    fn arc_length_of_straight_segment_is_exact() {
        let (p0, p1, p2) = ((0.0, 0.0), (50.0, 0.0), (100.0, 0.0));
        assert!((arc_length_to(1.0, p0, p1, p2) - 100.0).abs() < 0.01);
        let t = t_for_arc_from_start(30.0, p0, p1, p2);
        assert!((t - 0.3).abs() < 0.01, "t = {t}");
        let t = t_for_arc_from_end(30.0, p0, p1, p2);
        assert!((t - 0.7).abs() < 0.01, "t = {t}");
    }

    #[test]
    fn arc_parameter_is_clamped() {
        let (p0, p1, p2) = ((0.0, 0.0), (5.0, 0.0), (10.0, 0.0));
        assert_eq!(t_for_arc_from_start(500.0, p0, p1, p2), 0.9);
        assert_eq!(t_for_arc_from_start(0.0, p0, p1, p2), 0.1);
    }

    #[test]
    fn shape_contains_matches_outline() {
        assert!(shape_contains((0.0, 0.0), 10.0, 5.0, StateShape::Oval, (9.9, 0.0)));
        assert!(!shape_contains((0.0, 0.0), 10.0, 5.0, StateShape::Oval, (9.0, 4.0)));
        assert!(shape_contains((0.0, 0.0), 10.0, 5.0, StateShape::Rectangle, (9.0, 4.0)));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = CenterRect::new((0.0, 0.0), 10.0, 10.0);
        let b = CenterRect::new((10.0, 0.0), 10.0, 10.0);
        let c = CenterRect::new((9.0, 9.0), 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
    }

    #[test]
    fn bounds_track_boxes() {
        let mut bounds = Bounds::empty();
        assert!(!bounds.is_valid());
        bounds.include_box((0.0, 0.0), 10.0, 5.0);
        bounds.include_box((100.0, 50.0), 10.0, 5.0);
        assert!(bounds.is_valid());
        assert_eq!(bounds.width(), 120.0);
        assert_eq!(bounds.height(), 60.0);
        let grown = bounds.inflate(1.0);
        assert_eq!((grown.min_x, grown.max_y), (-11.0, 56.0));
    }
}
