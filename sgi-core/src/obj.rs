//! Wavefront-style scene text format.
//!
//! Each line is lexed into a record with nom. Records then feed independent
//! builders for 2D primitives, 3D wireframes, Bézier surfaces and B-spline
//! surfaces, so a bad record only costs its own object.

use nom::{
    bytes::complete::{take_till1, take_while1},
    character::complete::{char, digit1, space0, space1},
    combinator::{eof, map, map_res, opt, recognize, rest},
    multi::{many0, many1},
    number::complete::double,
    sequence::{pair, preceded, tuple},
    IResult,
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::curve::CurveMode;
use crate::error::Result;
use crate::geometry::{Color, Point2D, Point3D};
use crate::object::{
    BSplineSurface, BezierPatch, BezierSurface, Object2D, Object3D, Primitive2D, SceneObject, VertexArena,
};
use crate::surface::{export_blocks, Patch};

/// Import settings the file format does not carry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    pub bezier_resolution: (usize, usize),
    pub bspline_resolution: (usize, usize),
    /// Colour given to imported objects
    pub color: Color,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            bezier_resolution: (16, 16),
            bspline_resolution: (12, 12),
            color: Color::BLACK,
        }
    }
}

/// A record the importer discarded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for SkippedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Everything extracted from a scene file
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub objects: Vec<SceneObject>,
    pub skipped: Vec<SkippedLine>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Record {
    Group(Option<String>),
    Vertex(Vec<f64>),
    ParamVertex(f64, f64),
    Points(Vec<i64>),
    Polyline(Vec<i64>),
    Face(Vec<i64>),
    CsType(Vec<String>),
    Degree(Vec<usize>),
    Curve(Vec<i64>),
    Surface(Vec<i64>),
    End,
    Ignored,
}

fn number(input: &str) -> IResult<&str, f64> {
    preceded(space1, double)(input)
}

/// A vertex reference, `i`, `i/t` or `i/t/n`; only `i` is kept
fn index(input: &str) -> IResult<&str, i64> {
    let (input, value) = preceded(
        space1,
        map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>),
    )(input)?;
    let (input, _) = opt(preceded(char('/'), take_till1(char::is_whitespace)))(input)?;
    Ok((input, value))
}

fn word(input: &str) -> IResult<&str, String> {
    map(preceded(space1, take_till1(char::is_whitespace)), str::to_ascii_lowercase)(input)
}

fn degree(input: &str) -> IResult<&str, usize> {
    preceded(space1, map_res(digit1, str::parse::<usize>))(input)
}

fn group_name(input: &str) -> IResult<&str, Record> {
    map(rest, |name: &str| {
        let name = name.trim();
        Record::Group((!name.is_empty()).then(|| name.to_string()))
    })(input)
}

fn param_vertex(input: &str) -> IResult<&str, Record> {
    let (input, (u, v)) = pair(number, number)(input)?;
    let (input, _) = many0(number)(input)?;
    Ok((input, Record::ParamVertex(u, v)))
}

fn parse_record(line: &str) -> IResult<&str, Record> {
    let (input, keyword) = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(line)?;
    let (input, record) = match keyword.to_ascii_lowercase().as_str() {
        "o" | "g" => group_name(input)?,
        "v" => map(many1(number), Record::Vertex)(input)?,
        "vp" => param_vertex(input)?,
        "p" => map(many1(index), Record::Points)(input)?,
        "l" => map(many1(index), Record::Polyline)(input)?,
        "f" => map(many1(index), Record::Face)(input)?,
        "cstype" => map(many1(word), Record::CsType)(input)?,
        "deg" => map(many1(degree), Record::Degree)(input)?,
        "curv" => map(preceded(pair(number, number), many1(index)), Record::Curve)(input)?,
        "surf" => map(
            preceded(tuple((number, number, number, number)), many1(index)),
            Record::Surface,
        )(input)?,
        "end" => (input, Record::End),
        _ => ("", Record::Ignored),
    };
    let (input, _) = space0(input)?;
    let (input, _) = eof(input)?;
    Ok((input, record))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Flat,
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsType {
    Bezier,
    BSpline,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlatShape {
    Points,
    Polyline,
    Curve(CurveMode),
}

#[derive(Debug)]
struct FlatItem {
    line: usize,
    name: Option<String>,
    shape: FlatShape,
    indices: Vec<usize>,
}

/// Solid records collected under one `o`/`g` name
#[derive(Debug, Default)]
struct Group {
    name: Option<String>,
    edges: Vec<(usize, Vec<[usize; 2]>)>,
    bezier: Vec<(usize, [usize; 16])>,
    bspline: Vec<(usize, [usize; 16])>,
}

/// An `l` read before any vertex: its table is decided once the file is read
#[derive(Debug)]
struct Undecided {
    line: usize,
    group: usize,
    indices: Vec<usize>,
}

struct SceneReader {
    options: ImportOptions,
    flat_vertices: Vec<Point2D>,
    solid_vertices: Vec<Point3D>,
    last_table: Option<Table>,
    cstype: Option<CsType>,
    degree: Vec<usize>,
    flat: Vec<FlatItem>,
    groups: Vec<Group>,
    undecided: Vec<Undecided>,
    skipped: Vec<SkippedLine>,
}

/// Resolve a 1-based or negative (relative) index against `count` vertices
fn resolve_index(index: i64, count: usize) -> Option<usize> {
    match index {
        i if i > 0 => usize::try_from(i).ok(),
        i if i < 0 => {
            let back = usize::try_from(i.unsigned_abs()).ok()?;
            (back <= count).then(|| count + 1 - back)
        }
        _ => None,
    }
}

fn consecutive_pairs(indices: &[usize]) -> Vec<[usize; 2]> {
    indices.windows(2).map(|w| [w[0], w[1]]).collect()
}

impl SceneReader {
    fn new(options: ImportOptions) -> Self {
        Self {
            options,
            flat_vertices: Vec::new(),
            solid_vertices: Vec::new(),
            last_table: None,
            cstype: None,
            degree: Vec::new(),
            flat: Vec::new(),
            groups: vec![Group::default()],
            undecided: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, line: usize, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(line, %reason, "skipping scene record");
        self.skipped.push(SkippedLine { line, reason });
    }

    fn group_index(&self) -> usize {
        self.groups.len() - 1
    }

    fn group_name(&self) -> Option<String> {
        self.groups.last().and_then(|g| g.name.clone())
    }

    fn table_len(&self, table: Table) -> usize {
        match table {
            Table::Flat => self.flat_vertices.len(),
            Table::Solid => self.solid_vertices.len(),
        }
    }

    fn resolve(&mut self, line: usize, raw: &[i64], count: usize) -> Option<Vec<usize>> {
        let resolved: Option<Vec<usize>> = raw.iter().map(|&i| resolve_index(i, count)).collect();
        if resolved.is_none() {
            self.skip(line, "vertex index is zero or reaches before the first vertex");
        }
        resolved
    }

    fn read_line(&mut self, line: usize, raw: &str) {
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            return;
        }
        let record = match parse_record(content) {
            Ok((_, record)) => record,
            Err(_) => {
                let keyword = content.split_whitespace().next().unwrap_or_default();
                self.skip(line, format!("malformed '{keyword}' record"));
                return;
            }
        };
        self.apply(line, record);
    }

    fn apply(&mut self, line: usize, record: Record) {
        match record {
            Record::Group(name) => self.groups.push(Group {
                name,
                ..Group::default()
            }),
            Record::Vertex(coords) => self.add_vertex(line, &coords),
            Record::ParamVertex(u, v) => {
                self.flat_vertices.push(Point2D::new(u, v));
                self.last_table = Some(Table::Flat);
            }
            Record::Points(raw) => {
                if let Some(indices) = self.resolve(line, &raw, self.flat_vertices.len()) {
                    self.push_flat(line, FlatShape::Points, indices);
                }
            }
            Record::Polyline(raw) => self.add_polyline(line, &raw),
            Record::Face(raw) => self.add_face(line, &raw),
            Record::CsType(words) => {
                self.cstype = Some(if words.iter().any(|w| w == "bspline") {
                    CsType::BSpline
                } else if words.iter().any(|w| w == "bezier") {
                    CsType::Bezier
                } else {
                    CsType::Other
                });
            }
            Record::Degree(degree) => self.degree = degree,
            Record::Curve(raw) => self.add_curve(line, &raw),
            Record::Surface(raw) => self.add_surface(line, &raw),
            Record::End => {
                self.cstype = None;
                self.degree.clear();
            }
            Record::Ignored => {}
        }
    }

    fn add_vertex(&mut self, line: usize, coords: &[f64]) {
        if coords.iter().any(|c| !c.is_finite()) {
            self.skip(line, "vertex coordinate is not finite");
            return;
        }
        match coords {
            [x, y] => {
                self.flat_vertices.push(Point2D::new(*x, *y));
                self.last_table = Some(Table::Flat);
            }
            [x, y, z, ..] => {
                self.solid_vertices.push(Point3D::new(*x, *y, *z));
                self.last_table = Some(Table::Solid);
            }
            _ => self.skip(line, "vertex needs 2 or 3 coordinates"),
        }
    }

    fn push_flat(&mut self, line: usize, shape: FlatShape, indices: Vec<usize>) {
        let name = self.group_name();
        self.flat.push(FlatItem {
            line,
            name,
            shape,
            indices,
        });
    }

    fn push_edges(&mut self, line: usize, edges: Vec<[usize; 2]>) {
        if let Some(group) = self.groups.last_mut() {
            group.edges.push((line, edges));
        }
    }

    fn add_polyline(&mut self, line: usize, raw: &[i64]) {
        let Some(table) = self.last_table else {
            // negative indices cannot resolve against empty tables
            if let Some(indices) = self.resolve(line, raw, 0) {
                let group = self.group_index();
                self.undecided.push(Undecided { line, group, indices });
            }
            return;
        };
        let Some(indices) = self.resolve(line, raw, self.table_len(table)) else {
            return;
        };
        match table {
            Table::Flat => self.push_flat(line, FlatShape::Polyline, indices),
            Table::Solid if indices.len() < 2 => self.skip(line, "3D edge list needs at least 2 indices"),
            Table::Solid => self.push_edges(line, consecutive_pairs(&indices)),
        }
    }

    fn add_face(&mut self, line: usize, raw: &[i64]) {
        if raw.len() < 3 {
            self.skip(line, "face needs at least 3 vertices");
            return;
        }
        let Some(indices) = self.resolve(line, raw, self.solid_vertices.len()) else {
            return;
        };
        let n = indices.len();
        let edges = (0..n).map(|i| [indices[i], indices[(i + 1) % n]]).collect();
        self.push_edges(line, edges);
    }

    fn add_curve(&mut self, line: usize, raw: &[i64]) {
        let mode = match self.cstype {
            Some(CsType::BSpline) => CurveMode::BSpline,
            Some(CsType::Bezier) if self.degree.first().is_some_and(|&d| d > 3) => CurveMode::G1,
            Some(CsType::Bezier) => CurveMode::G0,
            _ => {
                self.skip(line, "curv outside a bezier or bspline block");
                return;
            }
        };
        if let Some(indices) = self.resolve(line, raw, self.flat_vertices.len()) {
            self.push_flat(line, FlatShape::Curve(mode), indices);
        }
    }

    fn add_surface(&mut self, line: usize, raw: &[i64]) {
        let kind = match self.cstype {
            Some(kind @ (CsType::Bezier | CsType::BSpline)) => kind,
            _ => {
                self.skip(line, "surf outside a bezier or bspline block");
                return;
            }
        };
        if self.degree != [3, 3] {
            self.skip(line, "only bicubic surfaces (deg 3 3) are supported");
            return;
        }
        if raw.len() != 16 {
            self.skip(line, format!("surf needs exactly 16 control indices, got {}", raw.len()));
            return;
        }
        let Some(indices) = self.resolve(line, raw, self.solid_vertices.len()) else {
            return;
        };
        let mut block = [0usize; 16];
        block.copy_from_slice(&indices);
        if let Some(group) = self.groups.last_mut() {
            match kind {
                CsType::BSpline => group.bspline.push((line, block)),
                _ => group.bezier.push((line, block)),
            }
        }
    }

    /// Attribute the `l` records read before any vertex
    fn settle_undecided(&mut self) {
        let table = if !self.flat_vertices.is_empty() {
            Table::Flat
        } else {
            Table::Solid
        };
        for item in std::mem::take(&mut self.undecided) {
            match table {
                Table::Flat => self.flat.push(FlatItem {
                    line: item.line,
                    name: self.groups[item.group].name.clone(),
                    shape: FlatShape::Polyline,
                    indices: item.indices,
                }),
                Table::Solid if item.indices.len() < 2 => {
                    self.skip(item.line, "3D edge list needs at least 2 indices")
                }
                Table::Solid => self.groups[item.group]
                    .edges
                    .push((item.line, consecutive_pairs(&item.indices))),
            }
        }
        for group in &mut self.groups {
            group.edges.sort_by_key(|(line, _)| *line);
        }
    }

    fn build_flat(&self, item: &FlatItem) -> Result<Vec<Object2D>> {
        let coords = item
            .indices
            .iter()
            .map(|&i| {
                self.flat_vertices
                    .get(i - 1)
                    .copied()
                    .ok_or_else(|| out_of_range(i, self.flat_vertices.len()))
            })
            .collect::<Result<Vec<_>>>()?;
        let stroke = self.options.color;
        match item.shape {
            FlatShape::Points => coords
                .into_iter()
                .map(|p| {
                    Object2D::builder(item.name.as_deref().unwrap_or("Point2D"), Primitive2D::Point)
                        .point(p)
                        .stroke(stroke)
                        .build()
                })
                .collect(),
            FlatShape::Polyline => {
                let mut coords = coords;
                // exported wireframes repeat their first index to close the loop
                if item.indices.len() >= 4 && item.indices.first() == item.indices.last() {
                    coords.pop();
                }
                let primitive = match coords.len() {
                    1 => Primitive2D::Point,
                    2 => Primitive2D::Line,
                    _ => Primitive2D::Wireframe,
                };
                let object = Object2D::builder(item.name.as_deref().unwrap_or("Object2D"), primitive)
                    .points(coords)
                    .stroke(stroke)
                    .build()?;
                Ok(vec![object])
            }
            FlatShape::Curve(mode) => {
                let object = Object2D::builder(item.name.as_deref().unwrap_or("Curve2D"), Primitive2D::Curve)
                    .points(coords)
                    .curve_mode(mode)
                    .stroke(stroke)
                    .build()?;
                Ok(vec![object])
            }
        }
    }

    fn finish(mut self) -> ImportReport {
        self.settle_undecided();
        let mut placed: Vec<(usize, SceneObject)> = Vec::new();
        let mut failures: Vec<(usize, String)> = Vec::new();

        for item in &self.flat {
            match self.build_flat(item) {
                Ok(objects) => placed.extend(objects.into_iter().map(|o| (item.line, o.into()))),
                Err(e) => failures.push((item.line, e.to_string())),
            }
        }

        for group in &self.groups {
            self.build_wireframe(group, &mut placed, &mut failures);
            self.build_bezier(group, &mut placed, &mut failures);
            self.build_bspline(group, &mut placed, &mut failures);
        }

        for (line, reason) in failures {
            self.skip(line, reason);
        }
        self.skipped.sort_by_key(|s| s.line);
        placed.sort_by_key(|(line, _)| *line);

        let report = ImportReport {
            objects: placed.into_iter().map(|(_, o)| o).collect(),
            skipped: self.skipped,
        };
        tracing::debug!(
            objects = report.objects.len(),
            skipped = report.skipped.len(),
            "scene imported"
        );
        report
    }

    fn build_wireframe(&self, group: &Group, placed: &mut Vec<(usize, SceneObject)>, failures: &mut Vec<(usize, String)>) {
        let mut arena = ArenaBuilder::new(&self.solid_vertices);
        let mut edges = Vec::new();
        let mut first_line = None;
        for (line, pairs) in &group.edges {
            let checked: Result<Vec<[usize; 2]>> = pairs
                .iter()
                .map(|[a, b]| Ok([arena.check(*a)?, arena.check(*b)?]))
                .collect();
            match checked {
                Ok(pairs) => {
                    edges.extend(pairs.into_iter().map(|[a, b]| [arena.local(a), arena.local(b)]));
                    first_line.get_or_insert(*line);
                }
                Err(e) => failures.push((*line, e.to_string())),
            }
        }
        let Some(line) = first_line else {
            return;
        };
        let mut object = Object3D::new(group.name.as_deref().unwrap_or("Object3D")).with_color(self.options.color);
        for vertex in arena.vertices {
            object.add_vertex(vertex);
        }
        for [a, b] in edges {
            if let Err(e) = object.add_edge(a, b) {
                failures.push((line, e.to_string()));
                return;
            }
        }
        placed.push((line, object.into()));
    }

    fn build_bezier(&self, group: &Group, placed: &mut Vec<(usize, SceneObject)>, failures: &mut Vec<(usize, String)>) {
        let (nu, nv) = self.options.bezier_resolution;
        let mut arena = ArenaBuilder::new(&self.solid_vertices);
        let mut patches = Vec::new();
        let mut first_line = None;
        for (line, block) in &group.bezier {
            match arena.patch(block) {
                Ok(control) => {
                    patches.push(BezierPatch { control, nu, nv });
                    first_line.get_or_insert(*line);
                }
                Err(e) => failures.push((*line, e.to_string())),
            }
        }
        let Some(line) = first_line else {
            return;
        };
        let name = group.name.as_deref().unwrap_or("BezierSurface");
        match BezierSurface::new(name, arena.vertices, patches) {
            Ok(surface) => placed.push((line, surface.with_color(self.options.color).into())),
            Err(e) => failures.push((line, e.to_string())),
        }
    }

    fn build_bspline(&self, group: &Group, placed: &mut Vec<(usize, SceneObject)>, failures: &mut Vec<(usize, String)>) {
        let (nu, nv) = self.options.bspline_resolution;
        let base = group.name.as_deref().unwrap_or("BSplineSurface");
        let single = group.bspline.len() == 1;
        for (k, (line, block)) in group.bspline.iter().enumerate() {
            let name = if single {
                base.to_string()
            } else {
                format!("{base}_b{}", k + 1)
            };
            let mut arena = ArenaBuilder::new(&self.solid_vertices);
            let built = arena.patch(block).and_then(|control| {
                let control = control.iter().map(|row| row.to_vec()).collect();
                BSplineSurface::new(name, arena.vertices, control, nu, nv)
            });
            match built {
                Ok(surface) => placed.push((*line, surface.with_color(self.options.color).into())),
                Err(e) => failures.push((*line, e.to_string())),
            }
        }
    }
}

fn out_of_range(index: usize, count: usize) -> crate::error::SgiError {
    crate::error::SgiError::geometry(format!("vertex index {index} out of range for {count} vertices"))
}

/// Maps file vertex indices onto a fresh per-object arena, sharing repeats
struct ArenaBuilder<'a> {
    source: &'a [Point3D],
    local: HashMap<usize, usize>,
    vertices: Vec<Point3D>,
}

impl<'a> ArenaBuilder<'a> {
    fn new(source: &'a [Point3D]) -> Self {
        Self {
            source,
            local: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    fn check(&self, index: usize) -> Result<usize> {
        if (1..=self.source.len()).contains(&index) {
            Ok(index)
        } else {
            Err(out_of_range(index, self.source.len()))
        }
    }

    /// Arena slot of a checked 1-based file index
    fn local(&mut self, index: usize) -> usize {
        if let Some(&slot) = self.local.get(&index) {
            return slot;
        }
        self.vertices.push(self.source[index - 1]);
        let slot = self.vertices.len() - 1;
        self.local.insert(index, slot);
        slot
    }

    fn patch(&mut self, block: &[usize; 16]) -> Result<Patch<usize>> {
        for &i in block {
            self.check(i)?;
        }
        Ok(std::array::from_fn(|r| std::array::from_fn(|c| self.local(block[r * 4 + c]))))
    }
}

/// Parse scene text with default options
pub fn load_scene(text: &str) -> ImportReport {
    load_scene_with(text, &ImportOptions::default())
}

/// Parse scene text; malformed records are reported, never fatal
pub fn load_scene_with(text: &str, options: &ImportOptions) -> ImportReport {
    let mut reader = SceneReader::new(*options);
    for (i, line) in text.lines().enumerate() {
        reader.read_line(i + 1, line);
    }
    reader.finish()
}

/// Read and parse a scene file
pub fn load_scene_file(path: impl AsRef<Path>, options: &ImportOptions) -> Result<ImportReport> {
    let text = std::fs::read_to_string(path)?;
    Ok(load_scene_with(&text, options))
}

/// Serialize objects to scene text.
///
/// 2D and 3D vertices are numbered independently, matching the two vertex
/// tables of the importer.
pub fn save_scene<'a>(objects: impl IntoIterator<Item = &'a SceneObject>) -> String {
    let mut writer = SceneWriter::default();
    let mut count = 0usize;
    for object in objects {
        match object {
            SceneObject::Flat(o) => writer.write_flat(o),
            SceneObject::Wireframe3D(o) => writer.write_wireframe(o),
            SceneObject::BezierSurface(s) => writer.write_bezier(s),
            SceneObject::BSplineSurface(s) => writer.write_bspline(s),
        }
        count += 1;
    }
    tracing::debug!(objects = count, lines = writer.lines.len(), "scene exported");
    let mut text = writer.lines.join("\n");
    text.push('\n');
    text
}

/// Serialize objects and write them to `path`
pub fn save_scene_file<'a>(path: impl AsRef<Path>, objects: impl IntoIterator<Item = &'a SceneObject>) -> Result<()> {
    std::fs::write(path, save_scene(objects))?;
    Ok(())
}

struct SceneWriter {
    lines: Vec<String>,
    next_flat: usize,
    next_solid: usize,
}

impl Default for SceneWriter {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            next_flat: 1,
            next_solid: 1,
        }
    }
}

fn join_indices(indices: impl IntoIterator<Item = usize>) -> String {
    indices
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl SceneWriter {
    fn write_flat(&mut self, object: &Object2D) {
        self.lines.push(format!("o {}", object.name()));
        let first = self.next_flat;
        for p in object.coordinates() {
            self.lines.push(format!("v {:.6} {:.6}", p.x, p.y));
        }
        let count = object.coordinates().len();
        self.next_flat += count;
        let ids = first..first + count;
        match object.primitive() {
            Primitive2D::Point => self.lines.push(format!("p {first}")),
            Primitive2D::Line => self.lines.push(format!("l {}", join_indices(ids))),
            Primitive2D::Wireframe => {
                self.lines
                    .push(format!("l {} {first}", join_indices(ids)));
            }
            Primitive2D::Curve => {
                let (cstype, deg) = match object.curve_mode() {
                    CurveMode::BSpline => ("bspline", 3),
                    CurveMode::G0 => ("bezier", 3),
                    CurveMode::G1 => ("bezier", count.saturating_sub(1).max(1)),
                };
                self.lines.push(format!("cstype {cstype}"));
                self.lines.push(format!("deg {deg}"));
                self.lines.push(format!("curv 0.0 1.0 {}", join_indices(ids)));
                self.lines.push("end".to_string());
            }
        }
    }

    /// Write the referenced arena vertices in first-use order, returning
    /// the file index of each arena slot
    fn write_vertices(&mut self, arena: &[Point3D], order: impl IntoIterator<Item = usize>) -> HashMap<usize, usize> {
        let mut ids = HashMap::new();
        for slot in order {
            if ids.contains_key(&slot) {
                continue;
            }
            let p = arena[slot];
            self.lines.push(format!("v {:.6} {:.6} {:.6}", p.x, p.y, p.z));
            ids.insert(slot, self.next_solid);
            self.next_solid += 1;
        }
        ids
    }

    fn write_wireframe(&mut self, object: &Object3D) {
        self.lines.push(format!("o {}", object.name()));
        let ids = self.write_vertices(object.vertices(), object.edges().iter().flatten().copied());
        for [a, b] in object.edges() {
            self.lines.push(format!("l {} {}", ids[a], ids[b]));
        }
    }

    fn write_surface_blocks(&mut self, cstype: &str, ids: &HashMap<usize, usize>, blocks: &[Patch<usize>]) {
        self.lines.push(format!("cstype {cstype}"));
        self.lines.push("deg 3 3".to_string());
        for block in blocks {
            let indices = join_indices(block.iter().flatten().map(|slot| ids[slot]));
            self.lines.push(format!("surf 0 1 0 1 {indices}"));
        }
        self.lines.push("end".to_string());
    }

    fn write_bezier(&mut self, surface: &BezierSurface) {
        self.lines.push(format!("o {}", surface.name()));
        let blocks: Vec<Patch<usize>> = surface.patches().iter().map(|p| p.control).collect();
        let ids = self.write_vertices(surface.vertices(), blocks.iter().flatten().flatten().copied());
        self.write_surface_blocks("bezier", &ids, &blocks);
    }

    fn write_bspline(&mut self, surface: &BSplineSurface) {
        self.lines.push(format!("o {}", surface.name()));
        let blocks = export_blocks(surface.control());
        let ids = self.write_vertices(surface.vertices(), blocks.iter().flatten().flatten().copied());
        self.write_surface_blocks("bspline", &ids, &blocks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;
    use approx::assert_relative_eq;

    fn flat(object: &SceneObject) -> &Object2D {
        match object {
            SceneObject::Flat(o) => o,
            other => panic!("expected a 2D object, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_points_scenario() {
        let report = load_scene("o A\nv 1 1\nv 2 2\np 1 2");
        assert!(report.is_clean());
        assert_eq!(report.objects.len(), 2);
        for (object, expected) in report.objects.iter().zip([(1.0, 1.0), (2.0, 2.0)]) {
            assert_eq!(object.name(), "A");
            assert_eq!(object.kind(), ObjectKind::Flat(Primitive2D::Point));
            assert_relative_eq!(flat(object).coordinates()[0], Point2D::new(expected.0, expected.1));
        }
    }

    #[test]
    fn test_arity_inference_and_closing_index() {
        let text = "o W\nv 0 0\nv 1 0\nv 1 1\nl 1 2 3 1\no L\nl 1 2\no P\nl 3\n";
        let report = load_scene(text);
        let kinds: Vec<_> = report.objects.iter().map(|o| o.kind().label()).collect();
        assert_eq!(kinds, ["Wireframe", "Line", "Point"]);
        assert_eq!(flat(&report.objects[0]).coordinates().len(), 3);
    }

    #[test]
    fn test_negative_indices_are_relative() {
        let report = load_scene("v 0 0\nv 5 5\nl -2 -1\nv 9 9\np -1");
        assert!(report.is_clean());
        let line = flat(&report.objects[0]);
        assert_relative_eq!(line.coordinates()[1], Point2D::new(5.0, 5.0));
        assert_relative_eq!(flat(&report.objects[1]).coordinates()[0], Point2D::new(9.0, 9.0));
    }

    #[test]
    fn test_bad_records_skipped_individually() {
        let text = "o A\nv 1 1\nv 1 nope\np 0\np 7\nv 3 3\nl 1 2 # trailing comment\n";
        let report = load_scene(text);
        assert_eq!(report.objects.len(), 1);
        assert_eq!(report.objects[0].kind().label(), "Line");
        let lines: Vec<usize> = report.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, [3, 4, 5]);
    }

    #[test]
    fn test_faces_share_vertices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\no Tet\nf 1/1 2/2 3/3\nf 1 2 4\n";
        let report = load_scene(text);
        let SceneObject::Wireframe3D(tet) = &report.objects[0] else {
            panic!("expected a 3D wireframe");
        };
        assert_eq!(tet.name(), "Tet");
        assert_eq!(tet.edges().len(), 6);
        assert_eq!(tet.vertices().len(), 4);
    }

    #[test]
    fn test_heterogeneous_file() {
        let text = "\
o Flat
v 0 0
v 4 0
l 1 2
o Solid
v 0 0 0
v 1 1 1
l 1 2
o Curve
v 0 10
v 10 10
v 10 0
CSTYPE bspline
deg 3
curv 0.0 1.0 1 3 4 5
end
";
        let report = load_scene(text);
        assert!(report.is_clean(), "{:?}", report.skipped);
        let kinds: Vec<_> = report.objects.iter().map(|o| o.kind().label()).collect();
        assert_eq!(kinds, ["Line", "Object3D", "Curve"]);
        assert_eq!(flat(&report.objects[2]).curve_mode(), CurveMode::BSpline);
    }

    #[test]
    fn test_surface_records_validated() {
        let mut text = String::new();
        for i in 0..16 {
            text.push_str(&format!("v {} {} 0\n", i % 4, i / 4));
        }
        let ids = join_indices(1..=16);
        text.push_str(&format!("o S\ncstype bezier\ndeg 3 2\nsurf 0 1 0 1 {ids}\nend\n"));
        text.push_str("cstype bezier\ndeg 3 3\nsurf 0 1 0 1 1 2 3\n");
        text.push_str(&format!("surf 0 1 0 1 {ids}\nend\n"));
        let report = load_scene(&text);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.objects.len(), 1);
        assert_eq!(report.objects[0].kind(), ObjectKind::BezierSurface);
    }

    #[test]
    fn test_bspline_blocks_named_per_block() {
        let mut text = String::new();
        for i in 0..16 {
            text.push_str(&format!("v {} {} 1\n", i % 4, i / 4));
        }
        let ids = join_indices(1..=16);
        text.push_str(&format!("o Mesh\ncstype bspline\ndeg 3 3\nsurf 0 1 0 1 {ids}\nsurf 0 1 0 1 {ids}\nend\n"));
        let names: Vec<_> = load_scene(&text).objects.iter().map(|o| o.name().to_string()).collect();
        assert_eq!(names, ["Mesh_b1", "Mesh_b2"]);
    }

    #[test]
    fn test_bare_line_before_vertices() {
        let report = load_scene("o Early\nl 1 2\nv 0 0 0\nv 1 0 0\n");
        assert_eq!(report.objects[0].kind(), ObjectKind::Object3D);
    }

    #[test]
    fn test_flat_line_before_vertices() {
        let report = load_scene("o Early\nl 1 2\nv 0 0\nv 3 4\n");
        assert!(report.is_clean());
        let line = flat(&report.objects[0]);
        assert_eq!(line.primitive(), Primitive2D::Line);
        assert_relative_eq!(line.coordinates()[1], Point2D::new(3.0, 4.0));
    }

    #[test]
    fn test_parameter_vertices_join_flat_table() {
        let report = load_scene("o P\nvp 0.25 0.5\nv 1 1\np 1 2\n");
        assert!(report.is_clean());
        assert_eq!(report.objects.len(), 2);
        assert_relative_eq!(flat(&report.objects[0]).coordinates()[0], Point2D::new(0.25, 0.5));
        assert_relative_eq!(flat(&report.objects[1]).coordinates()[0], Point2D::new(1.0, 1.0));
    }

    #[test]
    fn test_high_degree_bezier_curve_is_g1() {
        let text = "v 0 0\nv 1 1\nv 2 0\nv 3 1\nv 4 0\no C\ncstype bezier\ndeg 4\ncurv 0.0 1.0 1 2 3 4 5\nend\n";
        let report = load_scene(text);
        assert!(report.is_clean(), "{:?}", report.skipped);
        let curve = flat(&report.objects[0]);
        assert_eq!(curve.curve_mode(), CurveMode::G1);
        assert_eq!(curve.coordinates().len(), 5);
    }

    #[test]
    fn test_negative_indices_in_faces_and_surfaces() {
        let report = load_scene("v 0 0 0\nv 1 0 0\nv 0 1 0\no T\nf -3 -2 -1\n");
        assert!(report.is_clean());
        let SceneObject::Wireframe3D(tri) = &report.objects[0] else {
            panic!("expected a 3D wireframe");
        };
        assert_eq!(tri.vertices().len(), 3);
        assert_eq!(tri.edges().len(), 3);

        let mut vertices = String::new();
        for i in 0..16 {
            vertices.push_str(&format!("v {} {} {}\n", i % 4, i / 4, i % 3));
        }
        let absolute = join_indices(1..=16);
        let relative = (1..=16).rev().map(|i| format!("-{i}")).collect::<Vec<_>>().join(" ");
        let surface = |ids: &str| format!("{vertices}o S\ncstype bezier\ndeg 3 3\nsurf 0 1 0 1 {ids}\nend\n");
        let by_absolute = load_scene(&surface(&absolute));
        let by_relative = load_scene(&surface(&relative));
        assert!(by_relative.is_clean(), "{:?}", by_relative.skipped);
        assert_eq!(by_relative.objects, by_absolute.objects);
    }

    #[test]
    fn test_surface_with_extra_indices_skipped() {
        let mut text = String::new();
        for i in 0..21 {
            text.push_str(&format!("v {} {} 0\n", i % 4, i / 4));
        }
        let ids = join_indices(1..=21);
        text.push_str(&format!("o S\ncstype bezier\ndeg 3 3\nsurf 0 1 0 1 {ids}\nend\n"));
        let report = load_scene(&text);
        assert!(report.objects.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 25);
        assert!(report.skipped[0].reason.contains("exactly 16"));
    }

    #[test]
    fn test_export_format() {
        let line = Object2D::line("L", Point2D::new(1.0, 2.0), Point2D::new(3.0, 4.0)).unwrap();
        let square = Object2D::wireframe(
            "W",
            vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0), Point2D::new(1.0, 1.0)],
        )
        .unwrap();
        let edge = Object3D::from_point_pairs("E", &[Point3D::origin(), Point3D::new(1.0, 1.0, 1.0)]).unwrap();
        let scene: Vec<SceneObject> = vec![line.into(), square.into(), edge.into()];
        let text = save_scene(&scene);
        let expected = "\
o L
v 1.000000 2.000000
v 3.000000 4.000000
l 1 2
o W
v 0.000000 0.000000
v 1.000000 0.000000
v 1.000000 1.000000
l 3 4 5 3
o E
v 0.000000 0.000000 0.000000
v 1.000000 1.000000 1.000000
l 1 2
";
        assert_eq!(text, expected);
    }
}
