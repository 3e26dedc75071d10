/// Geometry primitives shared by the 2D and 3D pipelines
use nalgebra::{Point2, Point3, Vector3};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SgiError};

/// A point in 2D world coordinates
pub type Point2D = Point2<f64>;

/// A point in 3D world coordinates
pub type Point3D = Point3<f64>;

/// In-place affine operations on a 3D point.
///
/// Angles are in degrees, positive counter-clockwise when looking down the
/// axis towards the origin.
pub trait PointOps3D {
    fn translate(&mut self, delta: &Vector3<f64>);
    fn scale_about(&mut self, factors: &Vector3<f64>, center: &Point3D);
    fn rotate_x(&mut self, angle_deg: f64);
    fn rotate_y(&mut self, angle_deg: f64);
    fn rotate_z(&mut self, angle_deg: f64);
}

impl PointOps3D for Point3D {
    fn translate(&mut self, delta: &Vector3<f64>) {
        *self += *delta;
    }

    fn scale_about(&mut self, factors: &Vector3<f64>, center: &Point3D) {
        let rel = *self - *center;
        *self = *center + rel.component_mul(factors);
    }

    fn rotate_x(&mut self, angle_deg: f64) {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let (y, z) = (self.y, self.z);
        self.y = y * cos - z * sin;
        self.z = y * sin + z * cos;
    }

    fn rotate_y(&mut self, angle_deg: f64) {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let (x, z) = (self.x, self.z);
        self.x = x * cos + z * sin;
        self.z = -x * sin + z * cos;
    }

    fn rotate_z(&mut self, angle_deg: f64) {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let (x, y) = (self.x, self.y);
        self.x = x * cos - y * sin;
        self.y = x * sin + y * cos;
    }
}

/// Rotate a 2D point about `center` by `angle_deg` (counter-clockwise)
pub fn rotate_about(point: Point2D, angle_deg: f64, center: Point2D) -> Point2D {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let rel = point - center;
    Point2D::new(
        rel.x * cos - rel.y * sin + center.x,
        rel.x * sin + rel.y * cos + center.y,
    )
}

/// Arithmetic mean of a set of 2D points
pub fn centroid_2d(points: &[Point2D]) -> Option<Point2D> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
    Some(Point2D::from(sum / points.len() as f64))
}

/// Arithmetic mean of a set of 3D points
pub fn centroid_3d(points: &[Point3D]) -> Option<Point3D> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3D::from(sum / points.len() as f64))
}

/// An RGB stroke or fill colour, written as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = SgiError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(SgiError::geometry(format!("invalid colour '{s}'")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| SgiError::geometry(format!("invalid colour '{s}'")))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
