/// SGI Core Library - geometry engine of the scene editor
///
/// World/window/viewport mapping, 2D clipping, curve and surface evaluation,
/// the 3D object model with its camera, and the OBJ-style scene codec.
/// Everything here is headless; a shell drives it through [`Editor`] and
/// draws the [`DrawItem`]s it returns.

pub mod clipping;
pub mod config;
pub mod curve;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod obj;
pub mod object;
pub mod projection;
pub mod render;
pub mod surface;
pub mod transform;
pub mod viewport;

// Re-export commonly used types
pub use clipping::{ClipRect, LineClipper};
pub use config::EditorConfig;
pub use curve::CurveMode;
pub use editor::Editor;
pub use error::{Result, SgiError};
pub use geometry::{Color, Point2D, Point3D};
pub use obj::{ImportOptions, ImportReport, SkippedLine};
pub use object::{
    BSplineSurface, BezierSurface, DisplayFile, Object2D, Object3D, ObjectKind, ObjectSummary, Primitive2D,
    SceneObject, VertexArena,
};
pub use projection::{Camera, ProjectionMode};
pub use render::{DrawItem, RenderSettings};
pub use transform::{Rotation3D, RotationAxis, RotationReference, Transform2D};
pub use viewport::{Margins, Viewport, Window};
