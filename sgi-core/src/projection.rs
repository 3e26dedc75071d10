/// Camera and projection utilities
use nalgebra::{Matrix4, Vector3};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SgiError};
use crate::geometry::{Point2D, Point3D};
use crate::transform::Transform3D;

const PERSPECTIVE_EPSILON: f64 = 1e-9;
const ANGLE_EPSILON: f64 = 1e-12;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    Parallel,
    #[default]
    Perspective,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Parallel => ProjectionMode::Perspective,
            ProjectionMode::Perspective => ProjectionMode::Parallel,
        }
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProjectionMode::Parallel => "parallel",
            ProjectionMode::Perspective => "perspective",
        })
    }
}

impl FromStr for ProjectionMode {
    type Err = SgiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parallel" | "orthographic" => Ok(ProjectionMode::Parallel),
            "perspective" => Ok(ProjectionMode::Perspective),
            other => Err(SgiError::geometry(format!("unknown projection mode '{other}'"))),
        }
    }
}

/// Viewing camera: view reference point, view-plane normal and view-up,
/// with the derived orthonormal basis `(u, v, n)`
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    vrp: Point3D,
    vpn: Vector3<f64>,
    vup: Vector3<f64>,
    u: Vector3<f64>,
    v: Vector3<f64>,
    n: Vector3<f64>,
    pub mode: ProjectionMode,
    distance: f64,
    min_distance: f64,
}

/// Orthonormal basis for a view-plane normal and up vector
fn view_basis(vpn: &Vector3<f64>, vup: &Vector3<f64>) -> Result<[Vector3<f64>; 3]> {
    let n = vpn
        .try_normalize(0.0)
        .ok_or(SgiError::DegenerateCamera("view-plane normal is zero"))?;
    let u = vup
        .cross(&n)
        .try_normalize(PERSPECTIVE_EPSILON)
        .ok_or(SgiError::DegenerateCamera("view-up is parallel to the view-plane normal"))?;
    let v = n.cross(&u);
    Ok([u, v, n])
}

impl Camera {
    pub fn new(vrp: Point3D, vpn: Vector3<f64>, vup: Vector3<f64>) -> Result<Self> {
        let [u, v, n] = view_basis(&vpn, &vup)?;
        Ok(Self {
            vrp,
            vpn,
            vup,
            u,
            v,
            n,
            mode: ProjectionMode::Perspective,
            distance: 500.0,
            min_distance: 10.0,
        })
    }

    /// Set the perspective distance and its lower bound
    pub fn with_distance(mut self, distance: f64, min_distance: f64) -> Self {
        self.min_distance = min_distance;
        self.distance = distance.max(min_distance);
        self
    }

    pub fn with_mode(mut self, mode: ProjectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn vrp(&self) -> Point3D {
        self.vrp
    }

    pub fn vpn(&self) -> Vector3<f64> {
        self.vpn
    }

    pub fn vup(&self) -> Vector3<f64> {
        self.vup
    }

    /// The basis vectors `(u, v, n)`
    pub fn basis(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        (self.u, self.v, self.n)
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn set_vrp(&mut self, vrp: Point3D) {
        self.vrp = vrp;
    }

    /// Replace VPN and VUP; the camera is unchanged on error
    pub fn set_orientation(&mut self, vpn: Vector3<f64>, vup: Vector3<f64>) -> Result<()> {
        let [u, v, n] = view_basis(&vpn, &vup)?;
        self.vpn = vpn;
        self.vup = vup;
        self.u = u;
        self.v = v;
        self.n = n;
        Ok(())
    }

    /// Create the view matrix (world to camera coordinates)
    pub fn view_matrix(&self) -> Matrix4<f64> {
        let (u, v, n) = (self.u, self.v, self.n);
        let t = -self.vrp.coords;
        Matrix4::new(
            u.x, u.y, u.z, u.dot(&t), //
            v.x, v.y, v.z, v.dot(&t), //
            n.x, n.y, n.z, n.dot(&t), //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Subtract VRP and express the offset in the `(u, v, n)` basis
    pub fn world_to_camera(&self, point: &Point3D) -> Point3D {
        let d = point - self.vrp;
        Point3D::new(d.dot(&self.u), d.dot(&self.v), d.dot(&self.n))
    }

    /// Project a 3D point onto the view plane
    pub fn project_point(&self, point: &Point3D) -> Point2D {
        let c = self.world_to_camera(point);
        match self.mode {
            ProjectionMode::Parallel => Point2D::new(c.x, c.y),
            ProjectionMode::Perspective => {
                let d = self.distance;
                let mut denom = c.z + d;
                if denom.abs() < PERSPECTIVE_EPSILON {
                    denom = PERSPECTIVE_EPSILON;
                }
                Point2D::new(d * c.x / denom, d * c.y / denom)
            }
        }
    }

    /// One 2D segment per 3D segment
    pub fn project_segments<'a, I>(&'a self, segments: I) -> impl Iterator<Item = (Point2D, Point2D)> + 'a
    where
        I: IntoIterator<Item = (Point3D, Point3D)>,
        I::IntoIter: 'a,
    {
        segments
            .into_iter()
            .map(move |(a, b)| (self.project_point(&a), self.project_point(&b)))
    }

    /// Yaw about `v`, pitch about `u` (both turning VPN and VUP), then roll
    /// VUP about `n`; the basis is recomputed afterwards
    pub fn rotate(&mut self, yaw_deg: f64, pitch_deg: f64, roll_deg: f64) -> Result<()> {
        let (u, v, n) = (self.u, self.v, self.n);
        let mut vpn = self.vpn;
        let mut vup = self.vup;
        if yaw_deg.abs() > ANGLE_EPSILON {
            let r = Transform3D::rodrigues(&v, yaw_deg)?;
            vpn = r * vpn;
            vup = r * vup;
        }
        if pitch_deg.abs() > ANGLE_EPSILON {
            let r = Transform3D::rodrigues(&u, pitch_deg)?;
            vpn = r * vpn;
            vup = r * vup;
        }
        if roll_deg.abs() > ANGLE_EPSILON {
            vup = Transform3D::rodrigues(&n, roll_deg)? * vup;
        }
        self.set_orientation(vpn, vup)?;
        tracing::trace!(yaw_deg, pitch_deg, roll_deg, "camera rotated");
        Ok(())
    }

    pub fn toggle_projection(&mut self) -> ProjectionMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Add `delta` to the perspective distance, never going below the minimum
    pub fn adjust_distance(&mut self, delta: f64) -> f64 {
        self.distance = (self.distance + delta).max(self.min_distance);
        self.distance
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            vrp: Point3D::origin(),
            vpn: Vector3::z(),
            vup: Vector3::y(),
            u: Vector3::x(),
            v: Vector3::y(),
            n: Vector3::z(),
            mode: ProjectionMode::Perspective,
            distance: 500.0,
            min_distance: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(Point3D::origin(), Vector3::z(), Vector3::y()).unwrap();
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert_eq!(camera, Camera::default());
    }

    #[test]
    fn test_degenerate_basis_rejected() {
        assert!(Camera::new(Point3D::origin(), Vector3::zeros(), Vector3::y()).is_err());
        assert!(matches!(
            Camera::new(Point3D::origin(), Vector3::y(), Vector3::y() * 3.0),
            Err(SgiError::DegenerateCamera(_))
        ));
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let camera = Camera::new(
            Point3D::new(1.0, 2.0, 3.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(0.0, 1.0, 0.2),
        )
        .unwrap();
        let (u, v, n) = camera.basis();
        for axis in [u, v, n] {
            assert_relative_eq!(axis.norm(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(u.dot(&v), 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.dot(&n), 0.0, epsilon = 1e-12);
        assert_relative_eq!(u.cross(&v), n, epsilon = 1e-12);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(
            Point3D::new(4.0, -1.0, 2.0),
            Vector3::new(0.0, 1.0, 1.0),
            Vector3::y(),
        )
        .unwrap();
        let p = Point3D::new(3.0, 7.0, -5.0);
        let via_matrix = camera.view_matrix().transform_point(&p);
        assert_relative_eq!(via_matrix, camera.world_to_camera(&p), epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_and_perspective() {
        let mut camera = Camera::default().with_mode(ProjectionMode::Parallel);
        let p = Point3D::new(10.0, 20.0, 500.0);
        assert_relative_eq!(camera.project_point(&p), Point2D::new(10.0, 20.0));
        camera.toggle_projection();
        // d = 500, z = 500: halved
        assert_relative_eq!(camera.project_point(&p), Point2D::new(5.0, 10.0));
    }

    #[test]
    fn test_perspective_denominator_guarded() {
        let camera = Camera::default();
        let p = camera.project_point(&Point3D::new(1.0, 1.0, -500.0));
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn test_distance_has_floor() {
        let mut camera = Camera::default();
        assert_relative_eq!(camera.adjust_distance(-100.0), 400.0);
        assert_relative_eq!(camera.adjust_distance(-1000.0), 10.0);
    }

    #[test]
    fn test_yaw_turns_view_plane_normal() {
        let mut camera = Camera::default();
        camera.rotate(90.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(camera.vpn(), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(camera.vup(), Vector3::y(), epsilon = 1e-12);

        let mut rolled = Camera::default();
        rolled.rotate(0.0, 0.0, 90.0).unwrap();
        assert_relative_eq!(rolled.vpn(), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(rolled.vup(), -Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_projection_mode_parsing() {
        assert_eq!("Parallel".parse::<ProjectionMode>().unwrap(), ProjectionMode::Parallel);
        assert_eq!(ProjectionMode::Perspective.to_string(), "perspective");
        assert!("fisheye".parse::<ProjectionMode>().is_err());
    }
}
