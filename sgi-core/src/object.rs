/// Scene objects and the display file
use nalgebra::Vector3;
use std::fmt;

use crate::curve::CurveMode;
use crate::error::{Result, SgiError};
use crate::geometry::{centroid_2d, centroid_3d, Color, Point2D, Point3D, PointOps3D};
use crate::surface::{self, Patch};
use crate::transform::{Rotation3D, Transform2D, Transform3D};

/// Shape of a 2D object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive2D {
    Point,
    Line,
    /// Closed polygon
    Wireframe,
    Curve,
}

impl Primitive2D {
    pub fn label(&self) -> &'static str {
        match self {
            Primitive2D::Point => "Point",
            Primitive2D::Line => "Line",
            Primitive2D::Wireframe => "Wireframe",
            Primitive2D::Curve => "Curve",
        }
    }

    fn check_arity(&self, count: usize, mode: CurveMode) -> Result<()> {
        let ok = match self {
            Primitive2D::Point => count == 1,
            Primitive2D::Line => count == 2,
            Primitive2D::Wireframe => count >= 3,
            Primitive2D::Curve => count >= mode.min_points(),
        };
        if ok {
            return Ok(());
        }
        if *self == Primitive2D::Curve {
            return Err(SgiError::too_few_points("curve", mode.min_points(), count));
        }
        let expected = match self {
            Primitive2D::Point => "exactly 1",
            Primitive2D::Line => "exactly 2",
            _ => "at least 3",
        };
        Err(SgiError::geometry(format!(
            "{} needs {expected} coordinates, got {count}",
            self.label().to_lowercase()
        )))
    }
}

/// A 2D primitive: point, line, closed wireframe or curve
#[derive(Debug, Clone, PartialEq)]
pub struct Object2D {
    name: String,
    primitive: Primitive2D,
    coordinates: Vec<Point2D>,
    stroke: Color,
    fill: Option<Color>,
    curve_mode: CurveMode,
}

impl Object2D {
    pub fn builder(name: impl Into<String>, primitive: Primitive2D) -> Object2DBuilder {
        Object2DBuilder {
            name: name.into(),
            primitive,
            coordinates: Vec::new(),
            stroke: Color::default(),
            fill: None,
            curve_mode: CurveMode::default(),
        }
    }

    pub fn point(name: impl Into<String>, at: Point2D) -> Result<Self> {
        Self::builder(name, Primitive2D::Point).point(at).build()
    }

    pub fn line(name: impl Into<String>, from: Point2D, to: Point2D) -> Result<Self> {
        Self::builder(name, Primitive2D::Line).points([from, to]).build()
    }

    pub fn wireframe(name: impl Into<String>, points: Vec<Point2D>) -> Result<Self> {
        Self::builder(name, Primitive2D::Wireframe).points(points).build()
    }

    pub fn curve(name: impl Into<String>, points: Vec<Point2D>, mode: CurveMode) -> Result<Self> {
        Self::builder(name, Primitive2D::Curve)
            .points(points)
            .curve_mode(mode)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primitive(&self) -> Primitive2D {
        self.primitive
    }

    pub fn coordinates(&self) -> &[Point2D] {
        &self.coordinates
    }

    pub fn stroke(&self) -> Color {
        self.stroke
    }

    /// Fill colour of a filled wireframe
    pub fn fill(&self) -> Option<Color> {
        self.fill
    }

    pub fn curve_mode(&self) -> CurveMode {
        self.curve_mode
    }

    /// Recolour the stroke; a filled wireframe takes the colour as its fill too
    pub fn set_color(&mut self, color: Color) {
        self.stroke = color;
        if self.fill.is_some() {
            self.fill = Some(color);
        }
    }

    pub fn centroid(&self) -> Option<Point2D> {
        centroid_2d(&self.coordinates)
    }

    pub fn apply_transform(&mut self, transform: &Transform2D) {
        transform.apply(&mut self.coordinates);
    }
}

/// Named-field construction of an [`Object2D`], validated on [`build`](Self::build)
#[derive(Debug, Clone)]
pub struct Object2DBuilder {
    name: String,
    primitive: Primitive2D,
    coordinates: Vec<Point2D>,
    stroke: Color,
    fill: Option<Color>,
    curve_mode: CurveMode,
}

impl Object2DBuilder {
    pub fn point(mut self, point: Point2D) -> Self {
        self.coordinates.push(point);
        self
    }

    pub fn points(mut self, points: impl IntoIterator<Item = Point2D>) -> Self {
        self.coordinates.extend(points);
        self
    }

    pub fn stroke(mut self, color: Color) -> Self {
        self.stroke = color;
        self
    }

    /// Fill the polygon (wireframes only)
    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn curve_mode(mut self, mode: CurveMode) -> Self {
        self.curve_mode = mode;
        self
    }

    pub fn build(self) -> Result<Object2D> {
        self.primitive
            .check_arity(self.coordinates.len(), self.curve_mode)?;
        if self.fill.is_some() && self.primitive != Primitive2D::Wireframe {
            return Err(SgiError::geometry("only wireframes can be filled"));
        }
        Ok(Object2D {
            name: self.name,
            primitive: self.primitive,
            coordinates: self.coordinates,
            stroke: self.stroke,
            fill: self.fill,
            // the mode only matters for curves
            curve_mode: if self.primitive == Primitive2D::Curve {
                self.curve_mode
            } else {
                CurveMode::default()
            },
        })
    }
}

/// Rigid transforms over an object's vertex arena.
///
/// Edges and patches refer to vertices by index, so every operation moves
/// each shared vertex exactly once.
pub trait VertexArena {
    fn vertices(&self) -> &[Point3D];
    fn vertices_mut(&mut self) -> &mut [Point3D];

    /// Mean of the arena vertices
    fn centroid(&self) -> Option<Point3D> {
        centroid_3d(self.vertices())
    }

    fn translate(&mut self, delta: Vector3<f64>) {
        for v in self.vertices_mut() {
            v.translate(&delta);
        }
    }

    /// Scale about `center`, or about the centroid when `None`
    fn scale(&mut self, factors: Vector3<f64>, center: Option<Point3D>) -> Result<()> {
        if let Some(bad) = factors.iter().find(|f| !f.is_finite()) {
            return Err(SgiError::InvalidFactor(*bad));
        }
        let Some(center) = center.or_else(|| self.centroid()) else {
            return Ok(());
        };
        for v in self.vertices_mut() {
            v.scale_about(&factors, &center);
        }
        Ok(())
    }

    fn rotate(&mut self, rotation: &Rotation3D) -> Result<()> {
        let matrix = rotation.matrix()?;
        let pivot = rotation.pivot(self.centroid().unwrap_or_else(Point3D::origin));
        for v in self.vertices_mut() {
            *v = Transform3D::rotate_about(v, &matrix, &pivot);
        }
        Ok(())
    }
}

fn check_index(index: usize, len: usize) -> Result<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(SgiError::geometry(format!(
            "vertex index {index} out of range for {len} vertices"
        )))
    }
}

/// A 3D wireframe: edges between shared vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Object3D {
    name: String,
    color: Color,
    vertices: Vec<Point3D>,
    edges: Vec<[usize; 2]>,
}

const CUBE_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

impl Object3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::default(),
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Build from consecutive point pairs, one edge per pair
    pub fn from_point_pairs(name: impl Into<String>, points: &[Point3D]) -> Result<Self> {
        if points.len() < 2 || points.len() % 2 != 0 {
            return Err(SgiError::geometry(format!(
                "3D wireframe needs an even number of points (at least 2), got {}",
                points.len()
            )));
        }
        let mut object = Self::new(name);
        for pair in points.chunks_exact(2) {
            let a = object.add_vertex(pair[0]);
            let b = object.add_vertex(pair[1]);
            object.edges.push([a, b]);
        }
        Ok(object)
    }

    /// Axis-aligned cube: 8 shared vertices, 12 edges
    pub fn cube(name: impl Into<String>, center: Point3D, size: f64) -> Result<Self> {
        if !(size.is_finite() && size > 0.0) {
            return Err(SgiError::InvalidFactor(size));
        }
        let h = size / 2.0;
        let corners = [
            (-h, -h, -h),
            (h, -h, -h),
            (h, h, -h),
            (-h, h, -h),
            (-h, -h, h),
            (h, -h, h),
            (h, h, h),
            (-h, h, h),
        ];
        let mut object = Self::new(name);
        for (dx, dy, dz) in corners {
            object.add_vertex(center + Vector3::new(dx, dy, dz));
        }
        object.edges.extend_from_slice(&CUBE_EDGES);
        Ok(object)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Append a vertex, returning its arena index
    pub fn add_vertex(&mut self, point: Point3D) -> usize {
        self.vertices.push(point);
        self.vertices.len() - 1
    }

    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<()> {
        let len = self.vertices.len();
        self.edges.push([check_index(a, len)?, check_index(b, len)?]);
        Ok(())
    }

    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Edge endpoints resolved through the arena
    pub fn segments(&self) -> impl Iterator<Item = (Point3D, Point3D)> + '_ {
        self.edges
            .iter()
            .map(|[a, b]| (self.vertices[*a], self.vertices[*b]))
    }
}

impl VertexArena for Object3D {
    fn vertices(&self) -> &[Point3D] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Point3D] {
        &mut self.vertices
    }
}

/// One bicubic Bézier patch: arena indices plus its tessellation resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BezierPatch {
    pub control: Patch<usize>,
    pub nu: usize,
    pub nv: usize,
}

/// An ordered list of Bézier patches over a shared vertex arena
#[derive(Debug, Clone, PartialEq)]
pub struct BezierSurface {
    name: String,
    color: Color,
    vertices: Vec<Point3D>,
    patches: Vec<BezierPatch>,
}

impl BezierSurface {
    /// Build from index patches into `vertices`
    pub fn new(name: impl Into<String>, vertices: Vec<Point3D>, patches: Vec<BezierPatch>) -> Result<Self> {
        if patches.is_empty() {
            return Err(SgiError::too_few_points("Bézier surface", 16, 0));
        }
        for patch in &patches {
            if patch.nu == 0 || patch.nv == 0 {
                return Err(SgiError::InvalidSampleCount);
            }
            for &index in patch.control.iter().flatten() {
                check_index(index, vertices.len())?;
            }
        }
        Ok(Self {
            name: name.into(),
            color: Color::default(),
            vertices,
            patches,
        })
    }

    /// Build from explicit 4×4 control grids, each with its own 16 vertices
    pub fn from_control_grids(
        name: impl Into<String>,
        grids: &[Patch<Point3D>],
        nu: usize,
        nv: usize,
    ) -> Result<Self> {
        let mut vertices = Vec::with_capacity(grids.len() * 16);
        let mut patches = Vec::with_capacity(grids.len());
        for grid in grids {
            let base = vertices.len();
            vertices.extend(grid.iter().flatten().copied());
            patches.push(BezierPatch {
                control: std::array::from_fn(|i| std::array::from_fn(|j| base + i * 4 + j)),
                nu,
                nv,
            });
        }
        Self::new(name, vertices, patches)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn patches(&self) -> &[BezierPatch] {
        &self.patches
    }

    /// Control points of one patch, resolved through the arena
    pub fn control_points(&self, patch: &BezierPatch) -> Patch<Point3D> {
        patch.control.map(|row| row.map(|i| self.vertices[i]))
    }

    /// Grid lines of every patch at its own resolution
    pub fn tessellate(&self) -> Result<Vec<(Point3D, Point3D)>> {
        let mut segments = Vec::new();
        for patch in &self.patches {
            let grid = surface::bezier_patch_grid(&self.control_points(patch), patch.nu, patch.nv)?;
            segments.extend(surface::grid_segments(&grid));
        }
        Ok(segments)
    }
}

impl VertexArena for BezierSurface {
    fn vertices(&self) -> &[Point3D] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Point3D] {
        &mut self.vertices
    }
}

/// A B-spline surface over an m×n control grid (4 ≤ m, n ≤ 20)
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineSurface {
    name: String,
    color: Color,
    vertices: Vec<Point3D>,
    control: Vec<Vec<usize>>,
    nu: usize,
    nv: usize,
}

impl BSplineSurface {
    /// Build from an index grid into `vertices`
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Point3D>,
        control: Vec<Vec<usize>>,
        nu: usize,
        nv: usize,
    ) -> Result<Self> {
        surface::validate_grid(&control)?;
        if nu == 0 || nv == 0 {
            return Err(SgiError::InvalidSampleCount);
        }
        for &index in control.iter().flatten() {
            check_index(index, vertices.len())?;
        }
        Ok(Self {
            name: name.into(),
            color: Color::default(),
            vertices,
            control,
            nu,
            nv,
        })
    }

    /// Build from a grid of points, one vertex per cell
    pub fn from_points(name: impl Into<String>, grid: Vec<Vec<Point3D>>, nu: usize, nv: usize) -> Result<Self> {
        surface::validate_grid(&grid)?;
        let cols = grid[0].len();
        let control = (0..grid.len())
            .map(|r| (0..cols).map(|c| r * cols + c).collect())
            .collect();
        let vertices = grid.into_iter().flatten().collect();
        Self::new(name, vertices, control, nu, nv)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// `(rows, cols)` of the control grid
    pub fn dimensions(&self) -> (usize, usize) {
        (self.control.len(), self.control[0].len())
    }

    pub fn resolution(&self) -> (usize, usize) {
        (self.nu, self.nv)
    }

    /// The control grid as arena indices
    pub fn control(&self) -> &[Vec<usize>] {
        &self.control
    }

    /// The control grid resolved through the arena
    pub fn control_points(&self) -> Vec<Vec<Point3D>> {
        self.control
            .iter()
            .map(|row| row.iter().map(|&i| self.vertices[i]).collect())
            .collect()
    }

    /// Grid lines of every overlapping 4×4 sub-patch
    pub fn tessellate(&self) -> Result<Vec<(Point3D, Point3D)>> {
        let mut segments = Vec::new();
        for patch in surface::subdivide_patches(&self.control_points())? {
            let grid = surface::bspline_patch_grid(&patch, self.nu, self.nv)?;
            segments.extend(surface::grid_segments(&grid));
        }
        Ok(segments)
    }
}

impl VertexArena for BSplineSurface {
    fn vertices(&self) -> &[Point3D] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Point3D] {
        &mut self.vertices
    }
}

/// Kind label shown in object listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Flat(Primitive2D),
    Object3D,
    BezierSurface,
    BSplineSurface,
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Flat(primitive) => primitive.label(),
            ObjectKind::Object3D => "Object3D",
            ObjectKind::BezierSurface => "BezierSurface",
            ObjectKind::BSplineSurface => "BSplineSurface",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Anything that can live in the display file
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Flat(Object2D),
    Wireframe3D(Object3D),
    BezierSurface(BezierSurface),
    BSplineSurface(BSplineSurface),
}

impl SceneObject {
    pub fn name(&self) -> &str {
        match self {
            SceneObject::Flat(o) => o.name(),
            SceneObject::Wireframe3D(o) => o.name(),
            SceneObject::BezierSurface(s) => s.name(),
            SceneObject::BSplineSurface(s) => s.name(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            SceneObject::Flat(o) => ObjectKind::Flat(o.primitive()),
            SceneObject::Wireframe3D(_) => ObjectKind::Object3D,
            SceneObject::BezierSurface(_) => ObjectKind::BezierSurface,
            SceneObject::BSplineSurface(_) => ObjectKind::BSplineSurface,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            SceneObject::Flat(o) => o.stroke(),
            SceneObject::Wireframe3D(o) => o.color(),
            SceneObject::BezierSurface(s) => s.color(),
            SceneObject::BSplineSurface(s) => s.color(),
        }
    }

    pub fn set_color(&mut self, color: Color) {
        match self {
            SceneObject::Flat(o) => o.set_color(color),
            SceneObject::Wireframe3D(o) => o.set_color(color),
            SceneObject::BezierSurface(s) => s.set_color(color),
            SceneObject::BSplineSurface(s) => s.set_color(color),
        }
    }

    pub fn is_3d(&self) -> bool {
        !matches!(self, SceneObject::Flat(_))
    }

    /// The vertex arena of a 3D object or surface
    pub fn as_arena_mut(&mut self) -> Option<&mut dyn VertexArena> {
        match self {
            SceneObject::Flat(_) => None,
            SceneObject::Wireframe3D(o) => Some(o),
            SceneObject::BezierSurface(s) => Some(s),
            SceneObject::BSplineSurface(s) => Some(s),
        }
    }

    pub fn as_arena(&self) -> Option<&dyn VertexArena> {
        match self {
            SceneObject::Flat(_) => None,
            SceneObject::Wireframe3D(o) => Some(o),
            SceneObject::BezierSurface(s) => Some(s),
            SceneObject::BSplineSurface(s) => Some(s),
        }
    }
}

impl From<Object2D> for SceneObject {
    fn from(object: Object2D) -> Self {
        SceneObject::Flat(object)
    }
}

impl From<Object3D> for SceneObject {
    fn from(object: Object3D) -> Self {
        SceneObject::Wireframe3D(object)
    }
}

impl From<BezierSurface> for SceneObject {
    fn from(surface: BezierSurface) -> Self {
        SceneObject::BezierSurface(surface)
    }
}

impl From<BSplineSurface> for SceneObject {
    fn from(surface: BSplineSurface) -> Self {
        SceneObject::BSplineSurface(surface)
    }
}

/// One row of an object listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub name: String,
    pub kind: ObjectKind,
}

/// Ordered scene contents; insertion order is drawing order.
///
/// Not internally synchronised: share it across threads only behind a lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayFile {
    objects: Vec<SceneObject>,
}

impl DisplayFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an object, returning its index
    pub fn add(&mut self, object: impl Into<SceneObject>) -> usize {
        self.objects.push(object.into());
        self.objects.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Result<SceneObject> {
        if index >= self.objects.len() {
            return Err(SgiError::ObjectNotFound(index));
        }
        Ok(self.objects.remove(index))
    }

    pub fn get(&self, index: usize) -> Result<&SceneObject> {
        self.objects.get(index).ok_or(SgiError::ObjectNotFound(index))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut SceneObject> {
        self.objects
            .get_mut(index)
            .ok_or(SgiError::ObjectNotFound(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SceneObject> {
        self.objects.iter()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn listing(&self) -> Vec<ObjectSummary> {
        self.objects
            .iter()
            .map(|o| ObjectSummary {
                name: o.name().to_string(),
                kind: o.kind(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a DisplayFile {
    type Item = &'a SceneObject;
    type IntoIter = std::slice::Iter<'a, SceneObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

impl Extend<SceneObject> for DisplayFile {
    fn extend<I: IntoIterator<Item = SceneObject>>(&mut self, iter: I) {
        self.objects.extend(iter);
    }
}
