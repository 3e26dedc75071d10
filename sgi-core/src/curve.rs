//! Parametric curve evaluation: Bézier (Bernstein basis), multi-segment
//! Bézier chains and uniform cubic B-splines via forward differences.

use nalgebra::{Matrix4, Vector4};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SgiError};
use crate::geometry::Point2D;

/// Minimum number of control points for a cubic B-spline
pub const BSPLINE_MIN_POINTS: usize = 4;

/// Curve interpolation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum CurveMode {
    /// Chained cubic Bézier segments sharing endpoints
    #[default]
    G0,
    /// A single Bézier curve over all control points
    G1,
    /// Uniform cubic B-spline
    #[serde(rename = "BS")]
    BSpline,
}

impl CurveMode {
    pub fn min_points(&self) -> usize {
        match self {
            CurveMode::G0 | CurveMode::G1 => 2,
            CurveMode::BSpline => BSPLINE_MIN_POINTS,
        }
    }
}

impl fmt::Display for CurveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveMode::G0 => write!(f, "G0"),
            CurveMode::G1 => write!(f, "G1"),
            CurveMode::BSpline => write!(f, "BS"),
        }
    }
}

impl FromStr for CurveMode {
    type Err = SgiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "G0" => Ok(CurveMode::G0),
            "G1" => Ok(CurveMode::G1),
            "BS" => Ok(CurveMode::BSpline),
            other => Err(SgiError::geometry(format!("unknown curve mode '{other}'"))),
        }
    }
}

/// Binomial coefficient `C(n, k)` as a float
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// `ln C(n, k)`, finite for any degree
fn ln_binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k).map(|i| ((n - i) as f64 / (i + 1) as f64).ln()).sum()
}

/// Bernstein polynomial `C(n,i) (1-t)^(n-i) t^i` for `t` in `[0, 1]`.
///
/// Evaluated in log space so high degrees do not overflow the coefficient.
pub fn bernstein(n: usize, i: usize, t: f64) -> f64 {
    if i > n {
        return 0.0;
    }
    if t <= 0.0 {
        return if i == 0 { 1.0 } else { 0.0 };
    }
    if t >= 1.0 {
        return if i == n { 1.0 } else { 0.0 };
    }
    (ln_binomial(n, i) + (n - i) as f64 * (1.0 - t).ln() + i as f64 * t.ln()).exp()
}

/// Evaluate a Bézier curve of any degree at `t` via the Bernstein basis.
/// The endpoints are returned exactly at `t = 0` and `t = 1`.
pub fn bezier_point(points: &[Point2D], t: f64) -> Point2D {
    match points {
        [] => Point2D::origin(),
        [first, ..] if t <= 0.0 => *first,
        [.., last] if t >= 1.0 => *last,
        _ => {
            let n = points.len() - 1;
            let (ln_t, ln_u) = (t.ln(), (1.0 - t).ln());
            // running ln C(n, i)
            let mut ln_c = 0.0;
            let (mut x, mut y) = (0.0, 0.0);
            for (i, p) in points.iter().enumerate() {
                if i > 0 {
                    ln_c += ((n - i + 1) as f64 / i as f64).ln();
                }
                let b = (ln_c + (n - i) as f64 * ln_u + i as f64 * ln_t).exp();
                x += b * p.x;
                y += b * p.y;
            }
            Point2D::new(x, y)
        }
    }
}

/// De Casteljau's construction, the geometric counterpart of [`bezier_point`]
pub fn de_casteljau(points: &[Point2D], t: f64) -> Option<Point2D> {
    let mut work = points.to_vec();
    for r in 1..points.len() {
        for i in 0..points.len() - r {
            work[i] = work[i] + (work[i + 1] - work[i]) * t;
        }
    }
    work.first().copied()
}

/// Sample a Bézier curve at `samples + 1` uniform parameter values
pub fn bezier(points: &[Point2D], samples: usize) -> Result<Vec<Point2D>> {
    if samples == 0 {
        return Err(SgiError::InvalidSampleCount);
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }
    Ok((0..=samples)
        .map(|i| bezier_point(points, i as f64 / samples as f64))
        .collect())
}

/// Chain cubic segments over groups of 4 points with stride 3.
///
/// Fewer than 4 points fall back to a single curve over all points; a
/// trailing partial group is ignored.
pub fn bezier_multisegment(points: &[Point2D], samples: usize) -> Result<Vec<Point2D>> {
    if points.len() < 4 {
        return bezier(points, samples);
    }
    let mut curve = Vec::new();
    let mut start = 0;
    while start + 4 <= points.len() {
        let segment = bezier(&points[start..start + 4], samples)?;
        let skip = if curve.is_empty() { 0 } else { 1 };
        curve.extend(segment.into_iter().skip(skip));
        start += 3;
    }
    Ok(curve)
}

/// Uniform cubic B-spline basis matrix
pub fn bspline_basis() -> Matrix4<f64> {
    Matrix4::new(
        -1.0, 3.0, -3.0, 1.0, //
        3.0, -6.0, 3.0, 0.0, //
        -3.0, 0.0, 3.0, 0.0, //
        1.0, 4.0, 1.0, 0.0,
    ) / 6.0
}

/// Forward-difference seeds `(f, Δ, Δ², Δ³)` for the cubic with power-basis
/// coefficients `c = [a, b, c, d]` (`a t³ + b t² + c t + d`) and step `h`
pub fn forward_difference_seeds(c: &Vector4<f64>, h: f64) -> [f64; 4] {
    let (h2, h3) = (h * h, h * h * h);
    [
        c[3],
        c[0] * h3 + c[1] * h2 + c[2] * h,
        6.0 * c[0] * h3 + 2.0 * c[1] * h2,
        6.0 * c[0] * h3,
    ]
}

/// Sample a uniform cubic B-spline by forward differences.
///
/// Every 4-point window contributes `samples` points starting at its own
/// `t = 0`; the final `t = 1` of the last window is not emitted.
pub fn bspline_forward_differences(points: &[Point2D], samples: usize) -> Result<Vec<Point2D>> {
    if points.len() < BSPLINE_MIN_POINTS {
        return Err(SgiError::too_few_points("B-spline curve", BSPLINE_MIN_POINTS, points.len()));
    }
    if samples == 0 {
        return Err(SgiError::InvalidSampleCount);
    }

    let m = bspline_basis();
    let delta = 1.0 / samples as f64;
    let mut result = Vec::with_capacity((points.len() - 3) * samples);

    for window in points.windows(4) {
        let px = Vector4::new(window[0].x, window[1].x, window[2].x, window[3].x);
        let py = Vector4::new(window[0].y, window[1].y, window[2].y, window[3].y);
        let [mut x, mut dx, mut d2x, d3x] = forward_difference_seeds(&(m * px), delta);
        let [mut y, mut dy, mut d2y, d3y] = forward_difference_seeds(&(m * py), delta);

        for _ in 0..samples {
            result.push(Point2D::new(x, y));
            x += dx;
            dx += d2x;
            d2x += d3x;
            y += dy;
            dy += d2y;
            d2y += d3y;
        }
    }
    Ok(result)
}

/// Evaluate one B-spline window directly at `t`, for comparison with the
/// forward-difference stepper
pub fn bspline_segment_point(window: &[Point2D; 4], t: f64) -> Point2D {
    let m = bspline_basis();
    let tv = Vector4::new(t * t * t, t * t, t, 1.0);
    let px = Vector4::new(window[0].x, window[1].x, window[2].x, window[3].x);
    let py = Vector4::new(window[0].y, window[1].y, window[2].y, window[3].y);
    Point2D::new(tv.dot(&(m * px)), tv.dot(&(m * py)))
}

/// Sample a curve under the given mode
pub fn evaluate(mode: CurveMode, points: &[Point2D], samples: usize) -> Result<Vec<Point2D>> {
    match mode {
        CurveMode::G0 => bezier_multisegment(points, samples),
        CurveMode::G1 => bezier(points, samples),
        CurveMode::BSpline => bspline_forward_differences(points, samples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn arch() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 10.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(10.0, 0.0),
        ]
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(4, 2), 6.0);
        assert_eq!(binomial(10, 0), 1.0);
        assert_eq!(binomial(3, 5), 0.0);
    }

    #[test]
    fn test_bezier_sample_count_and_endpoints() {
        let curve = bezier(&arch(), 4).unwrap();
        assert_eq!(curve.len(), 5);
        assert_eq!(curve[0], Point2D::new(0.0, 0.0));
        assert_relative_eq!(curve[4], Point2D::new(10.0, 0.0));
        assert_relative_eq!(curve[2], Point2D::new(5.0, 7.5), epsilon = 1e-12);
    }

    #[test]
    fn test_endpoints_for_any_degree() {
        for n in 2..9 {
            let points: Vec<_> = (0..n)
                .map(|i| Point2D::new(i as f64 * 3.0, ((i * 7) % 5) as f64))
                .collect();
            let curve = bezier(&points, 17).unwrap();
            assert_relative_eq!(curve[0], points[0], epsilon = 1e-12);
            assert_relative_eq!(curve[17], points[n - 1], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bernstein_matches_de_casteljau() {
        let points = vec![
            Point2D::new(-3.0, 2.0),
            Point2D::new(1.0, 8.0),
            Point2D::new(4.0, -6.0),
            Point2D::new(9.0, 1.0),
            Point2D::new(12.0, 5.0),
        ];
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let geometric = de_casteljau(&points, t).unwrap();
            assert_relative_eq!(bezier_point(&points, t), geometric, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_high_degree_curve_stays_finite() {
        let points: Vec<Point2D> = (0..1100)
            .map(|i| Point2D::new(i as f64, ((i % 7) as f64) - 3.0))
            .collect();
        let curve = bezier(&points, 4).unwrap();
        assert_eq!(curve.len(), 5);
        assert!(curve.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert_eq!(curve[0], points[0]);
        assert_eq!(curve[4], points[1099]);
        // x control points are evenly spaced, so x(t) is linear
        assert_relative_eq!(curve[2].x, 549.5, epsilon = 1e-6);
        assert_relative_eq!(bernstein(1099, 549, 0.5), bernstein(1099, 550, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_multisegment_on_four_points_is_single_segment() {
        assert_eq!(bezier_multisegment(&arch(), 30).unwrap(), bezier(&arch(), 30).unwrap());
    }

    #[test]
    fn test_multisegment_shares_joints() {
        let mut points = arch();
        points.extend([Point2D::new(10.0, -10.0), Point2D::new(20.0, -10.0), Point2D::new(20.0, 0.0)]);
        let curve = bezier_multisegment(&points, 10).unwrap();
        assert_eq!(curve.len(), 21);
        assert_relative_eq!(curve[10], Point2D::new(10.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(curve[20], Point2D::new(20.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_multisegment_short_input_falls_back() {
        let points = &arch()[..3];
        assert_eq!(bezier_multisegment(points, 8).unwrap(), bezier(points, 8).unwrap());
    }

    #[test]
    fn test_bspline_requires_four_points() {
        let err = bspline_forward_differences(&arch()[..3], 10).unwrap_err();
        assert!(matches!(
            err,
            SgiError::InsufficientControlPoints { required: 4, actual: 3, .. }
        ));
    }

    #[test]
    fn test_bspline_forward_differences_match_direct_evaluation() {
        let mut points = arch();
        points.push(Point2D::new(20.0, 5.0));
        let samples = 25;
        let curve = bspline_forward_differences(&points, samples).unwrap();
        assert_eq!(curve.len(), 2 * samples);
        for (w, window) in points.windows(4).enumerate() {
            let window: [Point2D; 4] = [window[0], window[1], window[2], window[3]];
            for k in 0..samples {
                let t = k as f64 / samples as f64;
                let direct = bspline_segment_point(&window, t);
                let stepped = curve[w * samples + k];
                assert_abs_diff_eq!(stepped.x, direct.x, epsilon = 1e-6);
                assert_abs_diff_eq!(stepped.y, direct.y, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert!(matches!(bezier(&arch(), 0), Err(SgiError::InvalidSampleCount)));
        assert!(matches!(
            bspline_forward_differences(&arch(), 0),
            Err(SgiError::InvalidSampleCount)
        ));
    }

    #[test]
    fn test_mode_parse_and_display() {
        for mode in [CurveMode::G0, CurveMode::G1, CurveMode::BSpline] {
            assert_eq!(mode.to_string().parse::<CurveMode>().unwrap(), mode);
        }
        assert!("G2".parse::<CurveMode>().is_err());
    }
}
