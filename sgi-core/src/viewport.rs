//! World window and device viewport.
//!
//! The [`Window`] is the (possibly rotated) world rectangle being viewed; the
//! [`Viewport`] is the device rectangle it is mapped into. Device `y` grows
//! downwards.

use crate::clipping::ClipRect;
use crate::error::{Result, SgiError};
use crate::geometry::{rotate_about, Point2D};

const ASPECT_EPSILON: f64 = 1e-9;

/// The world-space rectangle currently visible, with a rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    rotation_deg: f64,
}

impl Window {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        let valid = [x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite())
            && x_max > x_min
            && y_max > y_min;
        if !valid {
            return Err(SgiError::InvalidWindow {
                x_min,
                x_max,
                y_min,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
            rotation_deg: 0.0,
        })
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn aspect(&self) -> f64 {
        self.width() / self.height()
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// The axis-aligned bounds, for clipping in window-local space
    pub fn clip_rect(&self) -> ClipRect {
        ClipRect::new(self.x_min, self.x_max, self.y_min, self.y_max)
    }

    /// Scale the extents about the centre (`< 1` zooms in, `> 1` zooms out)
    pub fn zoom(&mut self, factor: f64) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(SgiError::InvalidFactor(factor));
        }
        let c = self.center();
        let half_w = self.width() * factor / 2.0;
        let half_h = self.height() * factor / 2.0;
        // extents that collapse or overflow leave the window untouched
        let zoomed = Window::new(c.x - half_w, c.x + half_w, c.y - half_h, c.y + half_h)?;
        *self = Window {
            rotation_deg: self.rotation_deg,
            ..zoomed
        };
        Ok(())
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x_min += dx;
        self.x_max += dx;
        self.y_min += dy;
        self.y_max += dy;
    }

    /// Add to the rotation, wrapping into `[0, 360)`
    pub fn rotate(&mut self, angle_deg: f64) {
        self.rotation_deg = (self.rotation_deg + angle_deg).rem_euclid(360.0);
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation_deg.abs() > ASPECT_EPSILON
    }

    /// Rotate a world point into window-aligned space (by `+rotation`)
    pub fn to_local(&self, point: Point2D) -> Point2D {
        rotate_about(point, self.rotation_deg, self.center())
    }

    /// Rotate a window-aligned point back into world space (by `-rotation`)
    pub fn to_world(&self, point: Point2D) -> Point2D {
        rotate_about(point, -self.rotation_deg, self.center())
    }

    /// Grow along the narrower axis so that `width / height == target`,
    /// keeping the centre fixed
    fn match_aspect(&mut self, target: f64) {
        let (w, h) = (self.width(), self.height());
        if (self.aspect() - target).abs() < ASPECT_EPSILON {
            return;
        }
        let c = self.center();
        if self.aspect() > target {
            let half = w / target / 2.0;
            self.y_min = c.y - half;
            self.y_max = c.y + half;
        } else {
            let half = h * target / 2.0;
            self.x_min = c.x - half;
            self.x_max = c.x + half;
        }
        tracing::trace!(aspect = target, width = self.width(), height = self.height(), "window aspect matched");
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            x_min: -100.0,
            x_max: 100.0,
            y_min: -100.0,
            y_max: 100.0,
            rotation_deg: 0.0,
        }
    }
}

/// Fixed device-pixel insets between the canvas edge and the viewport
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 10.0,
            top: 10.0,
            right: 40.0,
            bottom: 30.0,
        }
    }
}

/// The device-space rectangle `(px0, py0)–(px1, py1)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    margins: Margins,
    px0: f64,
    py0: f64,
    px1: f64,
    py1: f64,
}

impl Viewport {
    pub fn new(margins: Margins) -> Self {
        Self {
            margins,
            px0: margins.left,
            py0: margins.top,
            px1: margins.left + 1.0,
            py1: margins.top + 1.0,
        }
    }

    /// Device rectangle as `(px0, py0, px1, py1)`
    pub fn rect(&self) -> (f64, f64, f64, f64) {
        (self.px0, self.py0, self.px1, self.py1)
    }

    pub fn width(&self) -> f64 {
        (self.px1 - self.px0).max(1.0)
    }

    pub fn height(&self) -> f64 {
        (self.py1 - self.py0).max(1.0)
    }

    pub fn center(&self) -> Point2D {
        Point2D::new((self.px0 + self.px1) / 2.0, (self.py0 + self.py1) / 2.0)
    }

    /// Recompute the rectangle for a new canvas size and force the window's
    /// aspect ratio to match it
    pub fn update_rect(&mut self, canvas_width: f64, canvas_height: f64, window: &mut Window) {
        let w = canvas_width.max(1.0);
        let h = canvas_height.max(1.0);
        self.px0 = self.margins.left;
        self.py0 = self.margins.top;
        self.px1 = (w - self.margins.right).max(self.px0 + 1.0);
        self.py1 = (h - self.margins.bottom).max(self.py0 + 1.0);
        window.match_aspect(self.width() / self.height());
    }

    fn scale_and_offsets(&self, window: &Window) -> (f64, f64, f64) {
        let (vx, vy) = (self.width(), self.height());
        let (wx, wy) = (window.width(), window.height());
        let s = (vx / wx).min(vy / wy);
        let offset_x = self.px0 + (vx - s * wx) / 2.0;
        let offset_y = self.py0 + (vy - s * wy) / 2.0;
        (s, offset_x, offset_y)
    }

    /// Map a world point to device coordinates
    pub fn world_to_device(&self, window: &Window, point: Point2D) -> Point2D {
        let local = window.to_local(point);
        self.local_to_device(window, local)
    }

    /// Map a window-aligned (already rotated) point to device coordinates
    pub fn local_to_device(&self, window: &Window, local: Point2D) -> Point2D {
        let (s, ox, oy) = self.scale_and_offsets(window);
        Point2D::new(
            (local.x - window.x_min) * s + ox,
            (window.y_max - local.y) * s + oy,
        )
    }

    /// Map a device pixel back to world coordinates, undoing the rotation
    pub fn device_to_world(&self, window: &Window, device: Point2D) -> Point2D {
        let (s, ox, oy) = self.scale_and_offsets(window);
        let local = Point2D::new(
            (device.x - ox) / s + window.x_min,
            window.y_max - (device.y - oy) / s,
        );
        window.to_world(local)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Margins::default())
    }
}
