/// Redraw pipeline: display file to clipped device-space draw items
use crate::clipping::{clip_point, sutherland_hodgman, ClipRect, LineClipper};
use crate::curve;
use crate::error::Result;
use crate::geometry::{Color, Point2D, Point3D};
use crate::object::{DisplayFile, Object2D, Primitive2D, SceneObject};
use crate::projection::Camera;
use crate::viewport::{Viewport, Window};

/// One primitive for the shell to draw, in device pixels
#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    /// The viewport rectangle
    Frame { min: Point2D, max: Point2D },
    Dot { at: Point2D, color: Color },
    Segment { from: Point2D, to: Point2D, color: Color },
    /// A closed polygon, optionally filled
    Polygon {
        points: Vec<Point2D>,
        stroke: Color,
        fill: Option<Color>,
    },
}

/// Sampling and clipping choices for a redraw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub clipper: LineClipper,
    pub bezier_samples: usize,
    pub bspline_samples: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clipper: LineClipper::CohenSutherland,
            bezier_samples: 200,
            bspline_samples: 50,
        }
    }
}

/// Rebuilds the full draw list on every call; nothing is cached
pub struct Renderer<'a> {
    window: &'a Window,
    viewport: &'a Viewport,
    camera: &'a Camera,
    settings: RenderSettings,
    rect: ClipRect,
    items: Vec<DrawItem>,
}

impl<'a> Renderer<'a> {
    pub fn new(window: &'a Window, viewport: &'a Viewport, camera: &'a Camera, settings: RenderSettings) -> Self {
        Self {
            window,
            viewport,
            camera,
            settings,
            rect: window.clip_rect(),
            items: Vec::new(),
        }
    }

    /// Draw the viewport frame, then every object in display order
    pub fn render(mut self, display: &DisplayFile) -> Vec<DrawItem> {
        let (px0, py0, px1, py1) = self.viewport.rect();
        self.items.push(DrawItem::Frame {
            min: Point2D::new(px0, py0),
            max: Point2D::new(px1, py1),
        });
        for object in display {
            if let Err(e) = self.render_object(object) {
                tracing::warn!(object = object.name(), error = %e, "object not drawn");
            }
        }
        tracing::trace!(items = self.items.len(), "redraw complete");
        self.items
    }

    fn render_object(&mut self, object: &SceneObject) -> Result<()> {
        match object {
            SceneObject::Flat(o) => self.render_flat(o)?,
            SceneObject::Wireframe3D(o) => self.render_solid(o.segments(), o.color()),
            SceneObject::BezierSurface(s) => self.render_solid(s.tessellate()?, s.color()),
            SceneObject::BSplineSurface(s) => self.render_solid(s.tessellate()?, s.color()),
        }
        Ok(())
    }

    fn render_flat(&mut self, object: &Object2D) -> Result<()> {
        let coords = object.coordinates();
        let color = object.stroke();
        match object.primitive() {
            Primitive2D::Point => {
                if let Some(&p) = coords.first() {
                    self.push_dot(p, color);
                }
            }
            Primitive2D::Line => {
                if let [a, b] = coords {
                    self.push_segment(*a, *b, color);
                }
            }
            Primitive2D::Wireframe => self.push_polygon(coords, color, object.fill()),
            Primitive2D::Curve => {
                let samples = match object.curve_mode() {
                    curve::CurveMode::BSpline => self.settings.bspline_samples,
                    _ => self.settings.bezier_samples,
                };
                let points = curve::evaluate(object.curve_mode(), coords, samples)?;
                for pair in points.windows(2) {
                    self.push_segment(pair[0], pair[1], color);
                }
            }
        }
        Ok(())
    }

    fn render_solid(&mut self, segments: impl IntoIterator<Item = (Point3D, Point3D)>, color: Color) {
        let camera = self.camera;
        for (a, b) in camera.project_segments(segments) {
            self.push_segment(a, b, color);
        }
    }

    fn push_dot(&mut self, p: Point2D, color: Color) {
        let local = self.window.to_local(p);
        if clip_point(local, &self.rect) {
            let at = self.viewport.local_to_device(self.window, local);
            self.items.push(DrawItem::Dot { at, color });
        }
    }

    fn push_segment(&mut self, a: Point2D, b: Point2D, color: Color) {
        let (la, lb) = (self.window.to_local(a), self.window.to_local(b));
        if let Some((ca, cb)) = self.settings.clipper.clip(la, lb, &self.rect) {
            self.items.push(DrawItem::Segment {
                from: self.viewport.local_to_device(self.window, ca),
                to: self.viewport.local_to_device(self.window, cb),
                color,
            });
        }
    }

    fn push_polygon(&mut self, points: &[Point2D], stroke: Color, fill: Option<Color>) {
        let local: Vec<Point2D> = points.iter().map(|p| self.window.to_local(*p)).collect();
        let clipped = sutherland_hodgman(&local, &self.rect);
        if clipped.len() < 2 {
            return;
        }
        let points = clipped
            .into_iter()
            .map(|p| self.viewport.local_to_device(self.window, p))
            .collect();
        self.items.push(DrawItem::Polygon { points, stroke, fill });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveMode;
    use crate::object::Object3D;
    use crate::projection::ProjectionMode;
    use approx::assert_relative_eq;

    struct Scene {
        window: Window,
        viewport: Viewport,
        camera: Camera,
    }

    impl Scene {
        fn new() -> Self {
            let mut window = Window::default();
            let mut viewport = Viewport::default();
            viewport.update_rect(450.0, 440.0, &mut window);
            Self {
                window,
                viewport,
                camera: Camera::default().with_mode(ProjectionMode::Parallel),
            }
        }

        fn draw(&self, display: &DisplayFile) -> Vec<DrawItem> {
            Renderer::new(&self.window, &self.viewport, &self.camera, RenderSettings::default()).render(display)
        }
    }

    #[test]
    fn test_frame_comes_first() {
        let scene = Scene::new();
        let items = scene.draw(&DisplayFile::new());
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], DrawItem::Frame { .. }));
    }

    #[test]
    fn test_points_outside_are_dropped() {
        let scene = Scene::new();
        let mut display = DisplayFile::new();
        display.add(Object2D::point("in", Point2D::new(0.0, 0.0)).unwrap());
        display.add(Object2D::point("out", Point2D::new(500.0, 0.0)).unwrap());
        let items = scene.draw(&display);
        assert_eq!(items.len(), 2);
        let DrawItem::Dot { at, .. } = items[1] else {
            panic!("expected a dot");
        };
        assert_relative_eq!(at, scene.viewport.center(), epsilon = 1e-9);
    }

    #[test]
    fn test_line_clipped_to_window_edges() {
        let scene = Scene::new();
        let mut display = DisplayFile::new();
        display.add(Object2D::line("l", Point2D::new(-150.0, 0.0), Point2D::new(150.0, 0.0)).unwrap());
        let items = scene.draw(&display);
        let DrawItem::Segment { from, to, .. } = items[1] else {
            panic!("expected a segment");
        };
        let (px0, _, px1, _) = scene.viewport.rect();
        assert_relative_eq!(from.x, px0, epsilon = 1e-9);
        assert_relative_eq!(to.x, px1, epsilon = 1e-9);
    }

    #[test]
    fn test_filled_polygon_is_clipped() {
        let scene = Scene::new();
        let mut display = DisplayFile::new();
        let big = Object2D::builder("w", Primitive2D::Wireframe)
            .points([
                Point2D::new(-200.0, -200.0),
                Point2D::new(200.0, -200.0),
                Point2D::new(200.0, 200.0),
                Point2D::new(-200.0, 200.0),
            ])
            .fill(Color::WHITE)
            .build()
            .unwrap();
        display.add(big);
        let items = scene.draw(&display);
        let DrawItem::Polygon { points, fill, .. } = &items[1] else {
            panic!("expected a polygon");
        };
        assert_eq!(*fill, Some(Color::WHITE));
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_curve_becomes_segments() {
        let scene = Scene::new();
        let mut display = DisplayFile::new();
        let points = vec![
            Point2D::new(-50.0, 0.0),
            Point2D::new(-50.0, 50.0),
            Point2D::new(50.0, 50.0),
            Point2D::new(50.0, 0.0),
        ];
        display.add(Object2D::curve("c", points.clone(), CurveMode::G0).unwrap());
        display.add(Object2D::curve("b", points, CurveMode::BSpline).unwrap());
        let items = scene.draw(&display);
        // 200 Bézier segments, then 49 between the 50 B-spline samples
        assert_eq!(items.len(), 1 + 200 + 49);
    }

    #[test]
    fn test_cube_edges_projected() {
        let scene = Scene::new();
        let mut display = DisplayFile::new();
        display.add(Object3D::cube("c", Point3D::origin(), 50.0).unwrap());
        let items = scene.draw(&display);
        // parallel projection along z folds the 4 depth edges to points,
        // which still clip as degenerate segments
        assert_eq!(items.len(), 1 + 12);
    }
}
