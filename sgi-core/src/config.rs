//! Editor settings, loadable from TOML.
//!
//! Every field has a default, so a partial file (or an empty one) is valid.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clipping::LineClipper;
use crate::curve::CurveMode;
use crate::error::{Result, SgiError};
use crate::geometry::{Color, Point3D};
use crate::obj::ImportOptions;
use crate::projection::{Camera, ProjectionMode};
use crate::viewport::{Margins, Window};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            x_min: -100.0,
            x_max: 100.0,
            y_min: -100.0,
            y_max: 100.0,
        }
    }
}

impl WindowConfig {
    pub fn to_window(&self) -> Result<Window> {
        Window::new(self.x_min, self.x_max, self.y_min, self.y_max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub mode: CurveMode,
    /// Samples per Bézier segment
    pub bezier_samples: usize,
    /// Samples per B-spline window
    pub bspline_samples: usize,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            mode: CurveMode::G0,
            bezier_samples: 200,
            bspline_samples: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub bezier_resolution: [usize; 2],
    pub bspline_resolution: [usize; 2],
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            bezier_resolution: [16, 16],
            bspline_resolution: [12, 12],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub vrp: [f64; 3],
    pub vpn: [f64; 3],
    pub vup: [f64; 3],
    pub projection: ProjectionMode,
    pub distance: f64,
    pub min_distance: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            vrp: [0.0, 0.0, 0.0],
            vpn: [0.0, 0.0, 1.0],
            vup: [0.0, 1.0, 0.0],
            projection: ProjectionMode::Perspective,
            distance: 500.0,
            min_distance: 10.0,
        }
    }
}

impl CameraConfig {
    pub fn to_camera(&self) -> Result<Camera> {
        let camera = Camera::new(
            Point3D::from(self.vrp),
            Vector3::from(self.vpn),
            Vector3::from(self.vup),
        )?;
        Ok(camera
            .with_mode(self.projection)
            .with_distance(self.distance, self.min_distance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClippingConfig {
    pub line_clipper: LineClipper,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub stroke: Color,
}

/// Top-level editor configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub window: WindowConfig,
    pub viewport: Margins,
    pub curves: CurveConfig,
    pub surfaces: SurfaceConfig,
    pub camera: CameraConfig,
    pub clipping: ClippingConfig,
    pub style: StyleConfig,
}

impl EditorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would leave curves, surfaces or the camera unusable
    pub fn validate(&self) -> Result<()> {
        let counts = [
            self.curves.bezier_samples,
            self.curves.bspline_samples,
            self.surfaces.bezier_resolution[0],
            self.surfaces.bezier_resolution[1],
            self.surfaces.bspline_resolution[0],
            self.surfaces.bspline_resolution[1],
        ];
        if counts.contains(&0) {
            return Err(SgiError::InvalidSampleCount);
        }
        for value in [self.camera.distance, self.camera.min_distance] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SgiError::InvalidFactor(value));
            }
        }
        self.window.to_window()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded editor configuration");
        Ok(config)
    }

    /// Importer settings derived from the surface section
    pub fn import_options(&self) -> ImportOptions {
        let [bu, bv] = self.surfaces.bezier_resolution;
        let [su, sv] = self.surfaces.bspline_resolution;
        ImportOptions {
            bezier_resolution: (bu, bv),
            bspline_resolution: (su, sv),
            color: self.style.stroke,
        }
    }
}
