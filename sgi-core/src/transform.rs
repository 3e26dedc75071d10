/// Homogeneous 2D transforms and 3D rigid-transform requests
use nalgebra::{Matrix3, Vector3};

use crate::error::{Result, SgiError};
use crate::geometry::{Point2D, Point3D};

/// A 3×3 homogeneous 2D transform.
///
/// Combined transforms compose as `outer * inner`, so the inner transform
/// is applied to a point first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    matrix: Matrix3<f64>,
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    /// Create a translation `T(tx, ty)`
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::from_matrix(Matrix3::new(
            1.0, 0.0, tx, //
            0.0, 1.0, ty, //
            0.0, 0.0, 1.0,
        ))
    }

    /// Create `T(c) · diag(sx, sy, 1) · T(-c)`
    pub fn scale_about(sx: f64, sy: f64, center: Point2D) -> Self {
        let scale = Self::from_matrix(Matrix3::new(
            sx, 0.0, 0.0, //
            0.0, sy, 0.0, //
            0.0, 0.0, 1.0,
        ));
        Self::sandwich(scale, center)
    }

    /// Create a counter-clockwise rotation by `angle_deg` about `center`
    pub fn rotation_about(angle_deg: f64, center: Point2D) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let rotation = Self::from_matrix(Matrix3::new(
            cos, -sin, 0.0, //
            sin, cos, 0.0, //
            0.0, 0.0, 1.0,
        ));
        Self::sandwich(rotation, center)
    }

    fn sandwich(inner: Self, center: Point2D) -> Self {
        let to_origin = Self::translation(-center.x, -center.y);
        let back = Self::translation(center.x, center.y);
        back.compose(&inner).compose(&to_origin)
    }

    /// Compose `self ∘ inner`: the result applies `inner` first, then `self`
    pub fn compose(&self, inner: &Transform2D) -> Transform2D {
        Self::from_matrix(self.matrix * inner.matrix)
    }

    /// Compose so that `self` is applied first, then `outer`
    pub fn then(&self, outer: &Transform2D) -> Transform2D {
        outer.compose(self)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Map one point, dividing by the homogeneous `w`.
    ///
    /// A zero `w` leaves the numerator coordinates undivided.
    pub fn apply_point(&self, point: Point2D) -> Point2D {
        let h = self.matrix * point.to_homogeneous();
        if h.z != 0.0 {
            Point2D::new(h.x / h.z, h.y / h.z)
        } else {
            Point2D::new(h.x, h.y)
        }
    }

    /// Map every point of a set in place
    pub fn apply(&self, points: &mut [Point2D]) {
        for point in points.iter_mut() {
            *point = self.apply_point(*point);
        }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

/// Pivot selection for a 3D rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationReference {
    /// Rotate about the world origin
    World,
    /// Rotate about the centroid of the object's unique vertices
    ObjectCentroid,
    /// Rotate about an arbitrary point
    Point(Point3D),
}

/// Axis selection for a 3D rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationAxis {
    X,
    Y,
    Z,
    /// Any non-zero direction, normalised before use
    Direction(Vector3<f64>),
}

/// A rotation request: reference × axis × angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation3D {
    pub reference: RotationReference,
    pub axis: RotationAxis,
    pub angle_deg: f64,
}

impl Rotation3D {
    pub fn new(reference: RotationReference, axis: RotationAxis, angle_deg: f64) -> Self {
        Self {
            reference,
            axis,
            angle_deg,
        }
    }

    /// The 3×3 rotation matrix for the requested axis
    pub fn matrix(&self) -> Result<Matrix3<f64>> {
        match self.axis {
            RotationAxis::X => Ok(Transform3D::rotation_x(self.angle_deg)),
            RotationAxis::Y => Ok(Transform3D::rotation_y(self.angle_deg)),
            RotationAxis::Z => Ok(Transform3D::rotation_z(self.angle_deg)),
            RotationAxis::Direction(direction) => Transform3D::rodrigues(&direction, self.angle_deg),
        }
    }

    /// Resolve the pivot, given the centroid of the object being rotated
    pub fn pivot(&self, centroid: Point3D) -> Point3D {
        match self.reference {
            RotationReference::World => Point3D::origin(),
            RotationReference::ObjectCentroid => centroid,
            RotationReference::Point(p) => p,
        }
    }
}

/// Transform builder for 3D rotations
pub struct Transform3D;

impl Transform3D {
    pub fn rotation_x(angle_deg: f64) -> Matrix3<f64> {
        let (s, c) = angle_deg.to_radians().sin_cos();
        Matrix3::new(
            1.0, 0.0, 0.0, //
            0.0, c, -s, //
            0.0, s, c,
        )
    }

    pub fn rotation_y(angle_deg: f64) -> Matrix3<f64> {
        let (s, c) = angle_deg.to_radians().sin_cos();
        Matrix3::new(
            c, 0.0, s, //
            0.0, 1.0, 0.0, //
            -s, 0.0, c,
        )
    }

    pub fn rotation_z(angle_deg: f64) -> Matrix3<f64> {
        let (s, c) = angle_deg.to_radians().sin_cos();
        Matrix3::new(
            c, -s, 0.0, //
            s, c, 0.0, //
            0.0, 0.0, 1.0,
        )
    }

    /// Rodrigues' rotation matrix about a (normalised) direction
    pub fn rodrigues(direction: &Vector3<f64>, angle_deg: f64) -> Result<Matrix3<f64>> {
        let norm = direction.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(SgiError::InvalidAxis);
        }
        let k = direction / norm;
        let (s, c) = angle_deg.to_radians().sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (k.x, k.y, k.z);
        Ok(Matrix3::new(
            c + x * x * t,
            x * y * t - z * s,
            x * z * t + y * s,
            y * x * t + z * s,
            c + y * y * t,
            y * z * t - x * s,
            z * x * t - y * s,
            z * y * t + x * s,
            c + z * z * t,
        ))
    }

    /// Rotate `point` about `pivot`: translate, rotate, translate back
    pub fn rotate_about(point: &Point3D, rotation: &Matrix3<f64>, pivot: &Point3D) -> Point3D {
        *pivot + rotation * (*point - *pivot)
    }
}
