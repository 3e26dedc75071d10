//! Core-facing editor API.
//!
//! The shell owns all interaction state (current tool, points being
//! collected, which object is selected) and passes the selection into each
//! call explicitly. The editor owns the scene and the view.

use nalgebra::Vector3;
use std::path::Path;

use crate::clipping::LineClipper;
use crate::config::EditorConfig;
use crate::curve::CurveMode;
use crate::error::{Result, SgiError};
use crate::geometry::{Color, Point2D, Point3D};
use crate::obj::{self, ImportOptions, SkippedLine};
use crate::object::{
    BSplineSurface, BezierSurface, DisplayFile, Object2D, Object3D, ObjectSummary, Primitive2D, SceneObject,
};
use crate::projection::{Camera, ProjectionMode};
use crate::render::{DrawItem, RenderSettings, Renderer};
use crate::surface::Patch;
use crate::transform::{RotationAxis, RotationReference, Rotation3D, Transform2D};
use crate::viewport::{Viewport, Window};

/// The scene being edited plus the view onto it.
///
/// Not internally synchronised; wrap it in a lock to share across threads.
#[derive(Debug, Clone)]
pub struct Editor {
    config: EditorConfig,
    display: DisplayFile,
    window: Window,
    viewport: Viewport,
    camera: Camera,
    clipper: LineClipper,
    curve_mode: CurveMode,
    stroke: Color,
    next_id: usize,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: config.window.to_window()?,
            viewport: Viewport::new(config.viewport),
            camera: config.camera.to_camera()?,
            clipper: config.clipping.line_clipper,
            curve_mode: config.curves.mode,
            stroke: config.style.stroke,
            display: DisplayFile::new(),
            next_id: 1,
            config,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn display(&self) -> &DisplayFile {
        &self.display
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn clipper(&self) -> LineClipper {
        self.clipper
    }

    pub fn curve_mode(&self) -> CurveMode {
        self.curve_mode
    }

    pub fn default_stroke(&self) -> Color {
        self.stroke
    }

    pub fn set_default_stroke(&mut self, color: Color) {
        self.stroke = color;
    }

    fn next_name(&self, label: &str) -> String {
        format!("{label}_{}", self.next_id)
    }

    fn insert(&mut self, object: SceneObject) -> usize {
        self.next_id += 1;
        tracing::debug!(name = object.name(), kind = %object.kind(), "object created");
        self.display.add(object)
    }

    fn insert_flat(&mut self, primitive: Primitive2D, points: Vec<Point2D>, fill: bool) -> Result<usize> {
        let mut builder = Object2D::builder(self.next_name(primitive.label()), primitive)
            .points(points)
            .stroke(self.stroke)
            .curve_mode(self.curve_mode);
        if fill {
            builder = builder.fill(self.stroke);
        }
        let object = builder.build()?;
        Ok(self.insert(object.into()))
    }

    pub fn add_point(&mut self, at: Point2D) -> Result<usize> {
        self.insert_flat(Primitive2D::Point, vec![at], false)
    }

    pub fn add_line(&mut self, from: Point2D, to: Point2D) -> Result<usize> {
        self.insert_flat(Primitive2D::Line, vec![from, to], false)
    }

    /// Closed polygon; `filled` fills it with the current stroke colour
    pub fn add_wireframe(&mut self, points: Vec<Point2D>, filled: bool) -> Result<usize> {
        self.insert_flat(Primitive2D::Wireframe, points, filled)
    }

    /// Curve in the current curve mode
    pub fn add_curve(&mut self, points: Vec<Point2D>) -> Result<usize> {
        self.insert_flat(Primitive2D::Curve, points, false)
    }

    /// 3D wireframe whose edges are consecutive point pairs
    pub fn add_object3d(&mut self, points: &[Point3D]) -> Result<usize> {
        let object = Object3D::from_point_pairs(self.next_name("Object3D"), points)?.with_color(self.stroke);
        Ok(self.insert(object.into()))
    }

    pub fn add_cube(&mut self, center: Point3D, size: f64) -> Result<usize> {
        let object = Object3D::cube(self.next_name("Object3D"), center, size)?.with_color(self.stroke);
        Ok(self.insert(object.into()))
    }

    pub fn add_bezier_surface(&mut self, patches: &[Patch<Point3D>]) -> Result<usize> {
        let [nu, nv] = self.config.surfaces.bezier_resolution;
        let surface = BezierSurface::from_control_grids(self.next_name("BezierSurface"), patches, nu, nv)?
            .with_color(self.stroke);
        Ok(self.insert(surface.into()))
    }

    pub fn add_bspline_surface(&mut self, grid: Vec<Vec<Point3D>>) -> Result<usize> {
        let [nu, nv] = self.config.surfaces.bspline_resolution;
        let surface =
            BSplineSurface::from_points(self.next_name("BSplineSurface"), grid, nu, nv)?.with_color(self.stroke);
        Ok(self.insert(surface.into()))
    }

    fn selected(&mut self, target: Option<usize>) -> Result<&mut SceneObject> {
        let index = target.ok_or(SgiError::NoSelection)?;
        self.display.get_mut(index)
    }

    /// Translate; 2D objects ignore `delta.z`
    pub fn translate(&mut self, target: Option<usize>, delta: Vector3<f64>) -> Result<()> {
        match self.selected(target)? {
            SceneObject::Flat(o) => o.apply_transform(&Transform2D::translation(delta.x, delta.y)),
            other => {
                if let Some(arena) = other.as_arena_mut() {
                    arena.translate(delta);
                }
            }
        }
        tracing::debug!(?target, dx = delta.x, dy = delta.y, dz = delta.z, "translated");
        Ok(())
    }

    /// Scale about `about`, or about the object's centroid when `None`;
    /// 2D objects use `factors.x`, `factors.y` and the point's `x`, `y`
    pub fn scale(&mut self, target: Option<usize>, factors: Vector3<f64>, about: Option<Point3D>) -> Result<()> {
        if let Some(bad) = factors.iter().find(|f| !f.is_finite()) {
            return Err(SgiError::InvalidFactor(*bad));
        }
        match self.selected(target)? {
            SceneObject::Flat(o) => {
                let center = match about {
                    Some(p) => Point2D::new(p.x, p.y),
                    None => o.centroid().unwrap_or_else(Point2D::origin),
                };
                o.apply_transform(&Transform2D::scale_about(factors.x, factors.y, center));
            }
            other => {
                if let Some(arena) = other.as_arena_mut() {
                    arena.scale(factors, about)?;
                }
            }
        }
        tracing::debug!(?target, sx = factors.x, sy = factors.y, sz = factors.z, "scaled");
        Ok(())
    }

    /// Same factor on every axis
    pub fn scale_uniform(&mut self, target: Option<usize>, factor: f64, about: Option<Point3D>) -> Result<()> {
        self.scale(target, Vector3::repeat(factor), about)
    }

    /// Planar scale; `sy` falls back to `sx` and z is left alone
    pub fn scale_xy(&mut self, target: Option<usize>, sx: f64, sy: Option<f64>, about: Option<Point3D>) -> Result<()> {
        self.scale(target, Vector3::new(sx, sy.unwrap_or(sx), 1.0), about)
    }

    /// Rotate by reference × axis. 2D objects only turn about Z.
    pub fn rotate(&mut self, target: Option<usize>, rotation: &Rotation3D) -> Result<()> {
        match self.selected(target)? {
            SceneObject::Flat(o) => {
                if rotation.axis != RotationAxis::Z {
                    return Err(SgiError::geometry("2D objects can only rotate about the Z axis"));
                }
                let pivot = match rotation.reference {
                    RotationReference::World => Point2D::origin(),
                    RotationReference::ObjectCentroid => o.centroid().unwrap_or_else(Point2D::origin),
                    RotationReference::Point(p) => Point2D::new(p.x, p.y),
                };
                o.apply_transform(&Transform2D::rotation_about(rotation.angle_deg, pivot));
            }
            other => {
                if let Some(arena) = other.as_arena_mut() {
                    arena.rotate(rotation)?;
                }
            }
        }
        tracing::debug!(?target, angle = rotation.angle_deg, "rotated");
        Ok(())
    }

    /// Recolour; filled wireframes take the colour as their fill too
    pub fn recolor(&mut self, target: Option<usize>, color: Color) -> Result<()> {
        self.selected(target)?.set_color(color);
        tracing::debug!(?target, %color, "recoloured");
        Ok(())
    }

    pub fn delete(&mut self, target: Option<usize>) -> Result<SceneObject> {
        let index = target.ok_or(SgiError::NoSelection)?;
        let removed = self.display.remove(index)?;
        tracing::debug!(name = removed.name(), "object deleted");
        Ok(removed)
    }

    /// Centroid of the selected object; 2D objects report `z = 0`
    pub fn centroid(&self, target: Option<usize>) -> Result<Point3D> {
        let index = target.ok_or(SgiError::NoSelection)?;
        let centroid = match self.display.get(index)? {
            SceneObject::Flat(o) => o.centroid().map(|c| Point3D::new(c.x, c.y, 0.0)),
            other => other.as_arena().and_then(|a| a.centroid()),
        };
        Ok(centroid.unwrap_or_else(Point3D::origin))
    }

    pub fn listing(&self) -> Vec<ObjectSummary> {
        self.display.listing()
    }

    /// Recompute the viewport for a new canvas size
    pub fn resize(&mut self, canvas_width: f64, canvas_height: f64) {
        self.viewport
            .update_rect(canvas_width, canvas_height, &mut self.window);
        tracing::trace!(canvas_width, canvas_height, "viewport resized");
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.window.pan(dx, dy);
        tracing::trace!(dx, dy, "window panned");
    }

    pub fn zoom(&mut self, factor: f64) -> Result<()> {
        self.window.zoom(factor)?;
        tracing::trace!(factor, "window zoomed");
        Ok(())
    }

    pub fn rotate_window(&mut self, angle_deg: f64) {
        self.window.rotate(angle_deg);
        tracing::trace!(rotation = self.window.rotation_deg(), "window rotated");
    }

    pub fn window_center(&self) -> Point2D {
        self.window.center()
    }

    pub fn rotate_camera(&mut self, yaw_deg: f64, pitch_deg: f64, roll_deg: f64) -> Result<()> {
        self.camera.rotate(yaw_deg, pitch_deg, roll_deg)
    }

    pub fn toggle_projection(&mut self) -> ProjectionMode {
        let mode = self.camera.toggle_projection();
        tracing::trace!(%mode, "projection toggled");
        mode
    }

    pub fn set_projection(&mut self, mode: ProjectionMode) {
        self.camera.mode = mode;
    }

    /// Change the perspective distance, returning the new value
    pub fn adjust_distance(&mut self, delta: f64) -> f64 {
        let distance = self.camera.adjust_distance(delta);
        tracing::trace!(distance, "perspective distance changed");
        distance
    }

    pub fn set_clipper(&mut self, clipper: LineClipper) {
        self.clipper = clipper;
        tracing::trace!(%clipper, "line clipper changed");
    }

    /// Mode used by curves created from now on
    pub fn set_curve_mode(&mut self, mode: CurveMode) {
        self.curve_mode = mode;
    }

    /// Map a device pixel to world coordinates
    pub fn device_to_world(&self, device: Point2D) -> Point2D {
        self.viewport.device_to_world(&self.window, device)
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            clipper: self.clipper,
            bezier_samples: self.config.curves.bezier_samples,
            bspline_samples: self.config.curves.bspline_samples,
        }
    }

    /// Full redraw: the viewport frame followed by every visible object
    pub fn draw_list(&self) -> Vec<DrawItem> {
        Renderer::new(&self.window, &self.viewport, &self.camera, self.render_settings()).render(&self.display)
    }

    fn import_options(&self) -> ImportOptions {
        ImportOptions {
            color: self.stroke,
            ..self.config.import_options()
        }
    }

    /// Append the objects of a scene text; returns the records that were skipped
    pub fn load_scene(&mut self, text: &str) -> Vec<SkippedLine> {
        let report = obj::load_scene_with(text, &self.import_options());
        tracing::debug!(imported = report.objects.len(), "scene loaded");
        self.display.extend(report.objects);
        report.skipped
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<SkippedLine>> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.load_scene(&text))
    }

    pub fn save_scene(&self) -> String {
        obj::save_scene(&self.display)
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        obj::save_scene_file(path, &self.display)
    }

    /// Remove every object
    pub fn clear(&mut self) {
        self.display.clear();
    }
}

impl Default for Editor {
    fn default() -> Self {
        let config = EditorConfig::default();
        Self {
            window: Window::default(),
            viewport: Viewport::new(config.viewport),
            camera: Camera::default(),
            clipper: config.clipping.line_clipper,
            curve_mode: config.curves.mode,
            stroke: config.style.stroke,
            display: DisplayFile::new(),
            next_id: 1,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_names_use_running_counter() {
        let mut editor = Editor::default();
        editor.add_point(Point2D::origin()).unwrap();
        editor.add_line(Point2D::origin(), Point2D::new(1.0, 1.0)).unwrap();
        assert!(editor.add_curve(vec![Point2D::origin()]).is_err());
        editor.add_cube(Point3D::origin(), 10.0).unwrap();
        let names: Vec<_> = editor.listing().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["Point_1", "Line_2", "Object3D_3"]);
    }

    #[test]
    fn test_selection_required() {
        let mut editor = Editor::default();
        editor.add_point(Point2D::origin()).unwrap();
        assert!(matches!(editor.translate(None, Vector3::x()), Err(SgiError::NoSelection)));
        assert!(matches!(editor.delete(None), Err(SgiError::NoSelection)));
        assert!(matches!(editor.recolor(Some(3), Color::WHITE), Err(SgiError::ObjectNotFound(3))));
        assert_eq!(editor.display().len(), 1);
    }

    #[test]
    fn test_flat_transforms() {
        let mut editor = Editor::default();
        let square = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(0.0, 2.0),
        ];
        let id = Some(editor.add_wireframe(square, true).unwrap());
        editor.translate(id, Vector3::new(1.0, 1.0, 99.0)).unwrap();
        assert_relative_eq!(editor.centroid(id).unwrap(), Point3D::new(2.0, 2.0, 0.0));
        editor.scale(id, Vector3::new(2.0, 2.0, 1.0), None).unwrap();
        assert_relative_eq!(editor.centroid(id).unwrap(), Point3D::new(2.0, 2.0, 0.0));
        let world_quarter = Rotation3D::new(RotationReference::World, RotationAxis::Z, 90.0);
        editor.rotate(id, &world_quarter).unwrap();
        assert_relative_eq!(editor.centroid(id).unwrap(), Point3D::new(-2.0, 2.0, 0.0), epsilon = 1e-9);
        let tilt = Rotation3D::new(RotationReference::World, RotationAxis::X, 90.0);
        assert!(editor.rotate(id, &tilt).is_err());
    }

    #[test]
    fn test_solid_transforms() {
        let mut editor = Editor::default();
        let id = Some(editor.add_cube(Point3D::new(1.0, 1.0, 1.0), 2.0).unwrap());
        editor.translate(id, Vector3::new(0.0, 0.0, 5.0)).unwrap();
        assert_relative_eq!(editor.centroid(id).unwrap(), Point3D::new(1.0, 1.0, 6.0));
        let spin = Rotation3D::new(RotationReference::World, RotationAxis::Z, 180.0);
        editor.rotate(id, &spin).unwrap();
        assert_relative_eq!(editor.centroid(id).unwrap(), Point3D::new(-1.0, -1.0, 6.0), epsilon = 1e-9);
        assert!(editor.scale(id, Vector3::new(f64::NAN, 1.0, 1.0), None).is_err());
    }

    #[test]
    fn test_scale_shorthands() {
        let mut editor = Editor::default();
        let id = Some(editor.add_line(Point2D::new(-1.0, -2.0), Point2D::new(1.0, 2.0)).unwrap());
        editor.scale_xy(id, 3.0, None, None).unwrap();
        let SceneObject::Flat(line) = editor.display().get(0).unwrap() else {
            panic!("expected a 2D object");
        };
        assert_relative_eq!(line.coordinates()[1], Point2D::new(3.0, 6.0), epsilon = 1e-12);

        editor.scale_xy(id, 1.0, Some(0.5), Some(Point3D::origin())).unwrap();
        let SceneObject::Flat(line) = editor.display().get(0).unwrap() else {
            panic!("expected a 2D object");
        };
        assert_relative_eq!(line.coordinates()[0], Point2D::new(-3.0, -3.0), epsilon = 1e-12);

        let cube = Some(editor.add_cube(Point3D::new(1.0, 1.0, 1.0), 2.0).unwrap());
        editor.scale_uniform(cube, 2.0, Some(Point3D::origin())).unwrap();
        assert_relative_eq!(editor.centroid(cube).unwrap(), Point3D::new(2.0, 2.0, 2.0), epsilon = 1e-12);
        assert!(matches!(editor.scale_uniform(cube, f64::INFINITY, None), Err(SgiError::InvalidFactor(_))));
    }

    #[test]
    fn test_new_validates_config() {
        let mut config = EditorConfig::default();
        config.curves.bspline_samples = 0;
        assert!(matches!(Editor::new(config), Err(SgiError::InvalidSampleCount)));

        let mut config = EditorConfig::default();
        config.camera.distance = -5.0;
        assert!(matches!(Editor::new(config), Err(SgiError::InvalidFactor(_))));
        assert!(Editor::new(EditorConfig::default()).is_ok());
    }

    #[test]
    fn test_recolour_filled_wireframe() {
        let mut editor = Editor::default();
        let triangle = vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0), Point2D::new(0.0, 1.0)];
        let id = Some(editor.add_wireframe(triangle, true).unwrap());
        let red = Color::rgb(255, 0, 0);
        editor.recolor(id, red).unwrap();
        let SceneObject::Flat(o) = editor.display().get(0).unwrap() else {
            panic!("expected a 2D object");
        };
        assert_eq!(o.fill(), Some(red));
    }

    #[test]
    fn test_curve_mode_applies_to_new_curves() {
        let mut editor = Editor::default();
        editor.set_curve_mode(CurveMode::BSpline);
        let three = vec![Point2D::origin(), Point2D::new(1.0, 1.0), Point2D::new(2.0, 0.0)];
        assert!(matches!(
            editor.add_curve(three),
            Err(SgiError::InsufficientControlPoints { required: 4, .. })
        ));
    }

    #[test]
    fn test_view_controls() {
        let mut editor = Editor::default();
        editor.resize(800.0, 600.0);
        let center = editor.viewport().center();
        assert_relative_eq!(editor.device_to_world(center), Point2D::origin(), epsilon = 1e-9);
        editor.pan(10.0, 0.0);
        assert_relative_eq!(editor.window_center(), Point2D::new(10.0, 0.0));
        assert!(editor.zoom(-1.0).is_err());
        assert_eq!(editor.toggle_projection(), ProjectionMode::Parallel);
        assert_relative_eq!(editor.adjust_distance(-10_000.0), 10.0);
        editor.set_clipper(LineClipper::LiangBarsky);
        assert_eq!(editor.render_settings().clipper, LineClipper::LiangBarsky);
    }
}
