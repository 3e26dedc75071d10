//! Bicubic surface tessellation.
//!
//! Bézier patches are sampled directly through the Bernstein basis.
//! B-spline patches use the forward-difference matrix method: the geometry
//! matrices are converted to power-basis coefficients `C = M·G·Mᵀ`, seeded
//! into difference tables `DD = E(hs)·C·E(ht)ᵀ`, and stepped across the grid
//! with additions only.

use nalgebra::{Matrix4, Vector4};

use crate::curve::bspline_basis;
use crate::error::{Result, SgiError};
use crate::geometry::Point3D;

/// Smallest B-spline control grid dimension
pub const GRID_MIN: usize = 4;
/// Largest B-spline control grid dimension
pub const GRID_MAX: usize = 20;

/// A 4×4 block of control data (points, or indices into a vertex arena)
pub type Patch<T> = [[T; 4]; 4];

/// Cubic Bernstein weights `[B0, B1, B2, B3]` at `t`
pub fn bernstein3(t: f64) -> [f64; 4] {
    let u = 1.0 - t;
    [u * u * u, 3.0 * t * u * u, 3.0 * t * t * u, t * t * t]
}

/// Evaluate a bicubic Bézier patch at `(u, v)`
pub fn bezier_patch_point(control: &Patch<Point3D>, u: f64, v: f64) -> Point3D {
    let bu = bernstein3(u);
    let bv = bernstein3(v);
    let mut acc = nalgebra::Vector3::zeros();
    for (i, row) in control.iter().enumerate() {
        for (j, p) in row.iter().enumerate() {
            acc += p.coords * (bu[i] * bv[j]);
        }
    }
    Point3D::from(acc)
}

/// Sample a Bézier patch on a `(nu+1) × (nv+1)` grid, indexed `[u][v]`
pub fn bezier_patch_grid(control: &Patch<Point3D>, nu: usize, nv: usize) -> Result<Vec<Vec<Point3D>>> {
    if nu == 0 || nv == 0 {
        return Err(SgiError::InvalidSampleCount);
    }
    Ok((0..=nu)
        .map(|iu| {
            let u = iu as f64 / nu as f64;
            (0..=nv)
                .map(|jv| bezier_patch_point(control, u, jv as f64 / nv as f64))
                .collect()
        })
        .collect())
}

/// Forward-difference seed matrix for step `h`.
///
/// Multiplying it by power-basis coefficients `[a, b, c, d]` yields
/// `(f, Δ, Δ², Δ³)` at parameter 0.
pub fn forward_difference_matrix(h: f64) -> Matrix4<f64> {
    let (h2, h3) = (h * h, h * h * h);
    Matrix4::new(
        0.0, 0.0, 0.0, 1.0, //
        h3, h2, h, 0.0, //
        6.0 * h3, 2.0 * h2, 0.0, 0.0, //
        6.0 * h3, 0.0, 0.0, 0.0,
    )
}

/// Split a patch into its three scalar geometry matrices `(Gx, Gy, Gz)`
fn geometry_matrices(control: &Patch<Point3D>) -> [Matrix4<f64>; 3] {
    let gx = Matrix4::from_fn(|i, j| control[i][j].x);
    let gy = Matrix4::from_fn(|i, j| control[i][j].y);
    let gz = Matrix4::from_fn(|i, j| control[i][j].z);
    [gx, gy, gz]
}

/// Power-basis coefficients `C = M·G·Mᵀ` for one coordinate
fn bspline_coefficients(g: &Matrix4<f64>) -> Matrix4<f64> {
    let m = bspline_basis();
    m * g * m.transpose()
}

/// Step one cubic by forward differences, emitting `n + 1` values
fn forward_difference_curve(n: usize, seeds: Vector4<f64>) -> Vec<f64> {
    let (mut f, mut d1, mut d2, d3) = (seeds[0], seeds[1], seeds[2], seeds[3]);
    let mut out = Vec::with_capacity(n + 1);
    for _ in 0..=n {
        out.push(f);
        f += d1;
        d1 += d2;
        d2 += d3;
    }
    out
}

/// Advance every column of a difference table one step along its rows
fn advance_rows(dd: &mut Matrix4<f64>) {
    for c in 0..4 {
        dd[(0, c)] += dd[(1, c)];
        dd[(1, c)] += dd[(2, c)];
        dd[(2, c)] += dd[(3, c)];
    }
}

/// Tessellate a B-spline patch by forward differences.
///
/// Returns a `(nv+1) × (nu+1)` grid indexed `[v][u]`, where `u` runs along
/// the first index of `control`.
pub fn bspline_patch_grid(control: &Patch<Point3D>, nu: usize, nv: usize) -> Result<Vec<Vec<Point3D>>> {
    if nu == 0 || nv == 0 {
        return Err(SgiError::InvalidSampleCount);
    }
    let es = forward_difference_matrix(1.0 / nu as f64);
    let et_t = forward_difference_matrix(1.0 / nv as f64).transpose();
    let mut tables = geometry_matrices(control).map(|g| es * bspline_coefficients(&g) * et_t);

    // one curve in v per step in u
    let mut by_u: Vec<Vec<Point3D>> = Vec::with_capacity(nu + 1);
    for _ in 0..=nu {
        let [xs, ys, zs] = tables
            .each_ref()
            .map(|dd| forward_difference_curve(nv, dd.row(0).transpose()));
        by_u.push(
            (0..=nv)
                .map(|j| Point3D::new(xs[j], ys[j], zs[j]))
                .collect(),
        );
        tables.iter_mut().for_each(advance_rows);
    }

    Ok(transpose_grid(&by_u))
}

/// Evaluate a B-spline patch directly at `(s, t)` through the power basis
pub fn bspline_patch_point(control: &Patch<Point3D>, s: f64, t: f64) -> Point3D {
    let sv = Vector4::new(s * s * s, s * s, s, 1.0);
    let tv = Vector4::new(t * t * t, t * t, t, 1.0);
    let [x, y, z] = geometry_matrices(control).map(|g| sv.dot(&(bspline_coefficients(&g) * tv)));
    Point3D::new(x, y, z)
}

fn transpose_grid<T: Copy>(grid: &[Vec<T>]) -> Vec<Vec<T>> {
    let cols = grid.first().map_or(0, Vec::len);
    (0..cols)
        .map(|j| grid.iter().map(|row| row[j]).collect())
        .collect()
}

/// Check that a control grid is rectangular with 4..=20 rows and columns
pub fn validate_grid<T>(grid: &[Vec<T>]) -> Result<(usize, usize)> {
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);
    let reason = if rows < GRID_MIN || cols < GRID_MIN {
        Some("at least 4 rows and 4 columns are required")
    } else if rows > GRID_MAX || cols > GRID_MAX {
        Some("at most 20 rows and 20 columns are allowed")
    } else if grid.iter().any(|row| row.len() != cols) {
        Some("all rows must have the same length")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(SgiError::InvalidGrid { rows, cols, reason }),
        None => Ok((rows, cols)),
    }
}

fn block_at<T: Copy>(grid: &[Vec<T>], r0: usize, c0: usize) -> Patch<T> {
    std::array::from_fn(|i| std::array::from_fn(|j| grid[r0 + i][c0 + j]))
}

/// Split an m×n grid into overlapping 4×4 patches (stride 1), `(m-3)(n-3)` in all
pub fn subdivide_patches<T: Copy>(grid: &[Vec<T>]) -> Result<Vec<Patch<T>>> {
    let (rows, cols) = validate_grid(grid)?;
    let mut patches = Vec::with_capacity((rows - 3) * (cols - 3));
    for r0 in 0..rows - 3 {
        for c0 in 0..cols - 3 {
            patches.push(block_at(grid, r0, c0));
        }
    }
    Ok(patches)
}

/// Split an m×n grid into non-overlapping 4×4 blocks (stride 4), as written
/// by the scene exporter. Trailing rows/columns that do not fill a block are
/// not covered.
pub fn export_blocks<T: Copy>(grid: &[Vec<T>]) -> Vec<Patch<T>> {
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);
    let mut blocks = Vec::new();
    for r0 in (0..rows.saturating_sub(3)).step_by(4) {
        for c0 in (0..cols.saturating_sub(3)).step_by(4) {
            blocks.push(block_at(grid, r0, c0));
        }
    }
    blocks
}

/// Grid lines of a tessellated patch: polylines along both directions
pub fn grid_segments(grid: &[Vec<Point3D>]) -> Vec<(Point3D, Point3D)> {
    let mut segments = Vec::new();
    for row in grid {
        segments.extend(row.windows(2).map(|w| (w[0], w[1])));
    }
    for column in transpose_grid(grid) {
        segments.extend(column.windows(2).map(|w| (w[0], w[1])));
    }
    segments
}
