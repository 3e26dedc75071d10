//! Error types for the editor core.

use thiserror::Error;

/// Errors surfaced by core operations to the calling shell.
///
/// None of these are fatal: every variant describes a rejected request
/// and leaves the scene untouched.
#[derive(Error, Debug)]
pub enum SgiError {
    /// A selection-dependent operation was requested with nothing selected.
    #[error("no object selected")]
    NoSelection,

    /// The selection index does not name an object in the display file.
    #[error("no object at index {0}")]
    ObjectNotFound(usize),

    /// Window bounds must satisfy `x_min < x_max` and `y_min < y_max`.
    #[error("invalid window bounds: x [{x_min}, {x_max}], y [{y_min}, {y_max}]")]
    InvalidWindow {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },

    /// Zoom and scale factors must be finite (zoom also strictly positive).
    #[error("invalid factor: {0}")]
    InvalidFactor(f64),

    /// Sampling routines need at least one step.
    #[error("sample count must be at least 1")]
    InvalidSampleCount,

    /// Too few control points for the requested curve or object.
    #[error("{what} needs at least {required} control points, got {actual}")]
    InsufficientControlPoints {
        what: &'static str,
        required: usize,
        actual: usize,
    },

    /// B-spline control grids must be rectangular with 4..=20 rows and columns.
    #[error("invalid control grid {rows}x{cols}: {reason}")]
    InvalidGrid {
        rows: usize,
        cols: usize,
        reason: &'static str,
    },

    /// Arbitrary-axis rotation was requested about a zero-length direction.
    #[error("rotation axis must be a non-zero direction")]
    InvalidAxis,

    /// VPN is zero or parallel to VUP, so no view basis exists.
    #[error("degenerate camera basis: {0}")]
    DegenerateCamera(&'static str),

    /// An object was built with a coordinate count its kind does not allow.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error reading or writing a scene or configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SgiError {
    /// Create an invalid-geometry error.
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry(message.into())
    }

    /// Create an insufficient-control-points error.
    pub fn too_few_points(what: &'static str, required: usize, actual: usize) -> Self {
        Self::InsufficientControlPoints {
            what,
            required,
            actual,
        }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, SgiError>;
