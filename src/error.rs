use thiserror::Error;

/// Errors raised while building boxes and surfaces or loading configuration.
///
/// Optimizer non-convergence has no variant here; the classifier reports such
/// boxes as `Crossing`.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// Split position outside the open interval (0, 1)
    #[error("split ratio must lie strictly between 0 and 1, got {0}")]
    InvalidSplitRatio(f64),

    /// The dimension chosen for a split cannot be divided
    #[error("cannot split along axis {axis}: half-extent {value} is degenerate")]
    DegenerateDimension {
        /// Local axis index (0 = ex, 1 = ey, 2 = ez)
        axis: usize,
        /// Offending half-extent
        value: f64,
    },

    /// A box half-extent that is not finite and positive
    #[error("box half-extent along axis {axis} must be finite and positive, got {value}")]
    InvalidDimension {
        /// Local axis index (0 = ex, 1 = ey, 2 = ez)
        axis: usize,
        /// Offending half-extent
        value: f64,
    },

    /// The subdivision code has no room left for another level
    #[error("subdivision code cannot encode more than 63 levels")]
    SubdivisionTooDeep,

    #[error("unknown surface kind: {0}")]
    UnknownSurfaceKind(String),

    #[error("surface kind {kind} expects {expected} parameters, got {got}")]
    WrongParameterCount {
        kind: String,
        expected: String,
        got: usize,
    },

    #[error("invalid surface parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, GeometryError>;
