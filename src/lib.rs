// Core modules, re-exported for Rust usage
mod bounding_box;
mod classifier;
mod config;
mod error;
mod fast_rng;
mod mnemonic;
mod optimize;
mod subdivision;
mod surface;
mod transform;

pub use bounding_box::{BoundingBox, SplitDirection};
pub use classifier::{Classifier, Sense};
pub use config::{Config, DEFAULT_MAX_EVALUATIONS, DEFAULT_SEED};
pub use error::{GeometryError, Result};
pub use fast_rng::FastRng;
pub use optimize::{Goal, LocalOptimizer, OptimizeOutcome, OptimizeStatus, ProjectedGradient};
pub use subdivision::{is_in, Branch, Containment, SubdivCode, MAX_DEPTH};
pub use surface::{Modifier, Surface, SurfaceKind};
pub use transform::Transformation;

/// Number of spatial dimensions
pub const NDIM: usize = 3;
/// Number of box corners
pub const NCOR: usize = 8;

/// Point or vector in space
pub type Point = nalgebra::Vector3<f64>;
