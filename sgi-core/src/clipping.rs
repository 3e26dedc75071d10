//! Point, line and polygon clipping against an axis-aligned rectangle.
//!
//! Callers working with a rotated window rotate into window-local space
//! first (see [`crate::viewport::Window::to_local`]) and back afterwards.

use std::fmt;
use std::str::FromStr;

use crate::error::SgiError;
use crate::geometry::Point2D;

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

/// Upper bound on Cohen–Sutherland edge clips. Exact arithmetic needs at
/// most four; the slack absorbs intersections that land a rounding error
/// outside a bound.
const MAX_EDGE_CLIPS: usize = 8;

/// Clip rectangle in window-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ClipRect {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    fn outcode(&self, p: Point2D) -> u8 {
        let mut code = INSIDE;
        if p.x < self.x_min {
            code |= LEFT;
        } else if p.x > self.x_max {
            code |= RIGHT;
        }
        if p.y < self.y_min {
            code |= BOTTOM;
        } else if p.y > self.y_max {
            code |= TOP;
        }
        code
    }

    fn clamp(&self, p: Point2D) -> Point2D {
        Point2D::new(
            p.x.clamp(self.x_min, self.x_max),
            p.y.clamp(self.y_min, self.y_max),
        )
    }
}

/// Line clipping algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum LineClipper {
    #[default]
    #[serde(rename = "CS")]
    CohenSutherland,
    #[serde(rename = "LB")]
    LiangBarsky,
}

impl LineClipper {
    pub fn clip(&self, p1: Point2D, p2: Point2D, rect: &ClipRect) -> Option<(Point2D, Point2D)> {
        match self {
            LineClipper::CohenSutherland => cohen_sutherland(p1, p2, rect),
            LineClipper::LiangBarsky => liang_barsky(p1, p2, rect),
        }
    }
}

impl fmt::Display for LineClipper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineClipper::CohenSutherland => write!(f, "CS"),
            LineClipper::LiangBarsky => write!(f, "LB"),
        }
    }
}

impl FromStr for LineClipper {
    type Err = SgiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CS" => Ok(LineClipper::CohenSutherland),
            "LB" => Ok(LineClipper::LiangBarsky),
            other => Err(SgiError::geometry(format!("unknown clipping algorithm '{other}'"))),
        }
    }
}

/// Inside test, bounds inclusive
pub fn clip_point(p: Point2D, rect: &ClipRect) -> bool {
    rect.x_min <= p.x && p.x <= rect.x_max && rect.y_min <= p.y && p.y <= rect.y_max
}

/// Cohen–Sutherland line clipping
pub fn cohen_sutherland(p1: Point2D, p2: Point2D, rect: &ClipRect) -> Option<(Point2D, Point2D)> {
    let (mut a, mut b) = (p1, p2);
    let mut code_a = rect.outcode(a);
    let mut code_b = rect.outcode(b);

    for _ in 0..=MAX_EDGE_CLIPS {
        if code_a | code_b == INSIDE {
            return Some((a, b));
        }
        if code_a & code_b != INSIDE {
            return None;
        }

        let out = if code_a != INSIDE { code_a } else { code_b };
        let clipped = if out & TOP != 0 {
            Point2D::new(a.x + (b.x - a.x) * (rect.y_max - a.y) / (b.y - a.y), rect.y_max)
        } else if out & BOTTOM != 0 {
            Point2D::new(a.x + (b.x - a.x) * (rect.y_min - a.y) / (b.y - a.y), rect.y_min)
        } else if out & RIGHT != 0 {
            Point2D::new(rect.x_max, a.y + (b.y - a.y) * (rect.x_max - a.x) / (b.x - a.x))
        } else {
            Point2D::new(rect.x_min, a.y + (b.y - a.y) * (rect.x_min - a.x) / (b.x - a.x))
        };

        if out == code_a {
            a = clipped;
            code_a = rect.outcode(a);
        } else {
            b = clipped;
            code_b = rect.outcode(b);
        }
    }

    tracing::trace!(?a, ?b, "edge clip budget exhausted, clamping");
    Some((rect.clamp(a), rect.clamp(b)))
}

/// Liang–Barsky parametric line clipping
pub fn liang_barsky(p1: Point2D, p2: Point2D, rect: &ClipRect) -> Option<(Point2D, Point2D)> {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let p = [-dx, dx, -dy, dy];
    let q = [
        p1.x - rect.x_min,
        rect.x_max - p1.x,
        p1.y - rect.y_min,
        rect.y_max - p1.y,
    ];

    let (mut u1, mut u2) = (0.0_f64, 1.0_f64);
    for (&pi, &qi) in p.iter().zip(q.iter()) {
        if pi == 0.0 {
            if qi < 0.0 {
                return None;
            }
        } else {
            let u = qi / pi;
            if pi < 0.0 {
                u1 = u1.max(u);
            } else {
                u2 = u2.min(u);
            }
        }
    }
    if u1 > u2 {
        return None;
    }

    Some((
        Point2D::new(p1.x + u1 * dx, p1.y + u1 * dy),
        Point2D::new(p1.x + u2 * dx, p1.y + u2 * dy),
    ))
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Left,
    Right,
    Bottom,
    Top,
}

impl Edge {
    const ORDER: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Bottom, Edge::Top];

    fn inside(self, p: Point2D, rect: &ClipRect) -> bool {
        match self {
            Edge::Left => p.x >= rect.x_min,
            Edge::Right => p.x <= rect.x_max,
            Edge::Bottom => p.y >= rect.y_min,
            Edge::Top => p.y <= rect.y_max,
        }
    }

    fn intersect(self, s: Point2D, e: Point2D, rect: &ClipRect) -> Point2D {
        if s == e {
            return s;
        }
        match self {
            Edge::Left | Edge::Right => {
                if e.x == s.x {
                    return s;
                }
                let x = if matches!(self, Edge::Left) { rect.x_min } else { rect.x_max };
                Point2D::new(x, s.y + (e.y - s.y) * (x - s.x) / (e.x - s.x))
            }
            Edge::Bottom | Edge::Top => {
                if e.y == s.y {
                    return s;
                }
                let y = if matches!(self, Edge::Bottom) { rect.y_min } else { rect.y_max };
                Point2D::new(s.x + (e.x - s.x) * (y - s.y) / (e.y - s.y), y)
            }
        }
    }
}

/// Sutherland–Hodgman polygon clipping against LEFT, RIGHT, BOTTOM, TOP
pub fn sutherland_hodgman(polygon: &[Point2D], rect: &ClipRect) -> Vec<Point2D> {
    let mut output = polygon.to_vec();
    for edge in Edge::ORDER {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut s = input[input.len() - 1];
        for &e in &input {
            match (edge.inside(s, rect), edge.inside(e, rect)) {
                (false, true) => {
                    output.push(edge.intersect(s, e, rect));
                    output.push(e);
                }
                (true, true) => output.push(e),
                (true, false) => output.push(edge.intersect(s, e, rect)),
                (false, false) => {}
            }
            s = e;
        }
    }
    output
}
