// Tunables for box classification and per-box random streams
use crate::error::{GeometryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default evaluation budget handed to the local optimizer for each corner start.
pub const DEFAULT_MAX_EVALUATIONS: usize = 1000;

/// Default root seed for box random streams.
pub const DEFAULT_SEED: u64 = 0x853c_49e6_748f_ea9b;

/// Settings shared by the classifier and by root box construction.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides:
///
/// ```
/// use quadric_box::Config;
///
/// let config = Config::from_json_str(r#"{ "max_evaluations": 250 }"#).unwrap();
/// assert_eq!(config.max_evaluations, 250);
/// assert_eq!(config.stop_value, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of objective evaluations per optimizer run.
    pub max_evaluations: usize,
    /// The optimizer stops as soon as the objective reaches this value.
    pub stop_value: f64,
    /// Relative step tolerance used as the convergence criterion.
    pub xtol_rel: f64,
    /// Absolute objective change tolerance used as the convergence criterion.
    pub ftol_abs: f64,
    /// Corner values with magnitude at or below this count as touching the surface.
    pub sign_tolerance: f64,
    /// Root seed for the random streams of boxes built from this
    /// configuration with `BoundingBox::from_config`.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            stop_value: 0.0,
            xtol_rel: 1e-10,
            ftol_abs: 1e-14,
            sign_tolerance: 0.0,
            seed: DEFAULT_SEED,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_sign_tolerance(mut self, sign_tolerance: f64) -> Self {
        self.sign_tolerance = sign_tolerance;
        self
    }

    /// Check that the numeric settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_evaluations == 0 {
            return Err(GeometryError::InvalidConfig(
                "max_evaluations must be at least 1".to_string(),
            ));
        }
        if !self.stop_value.is_finite() {
            return Err(GeometryError::InvalidConfig(format!(
                "stop_value must be finite, got {}",
                self.stop_value
            )));
        }
        for (name, value) in [
            ("xtol_rel", self.xtol_rel),
            ("ftol_abs", self.ftol_abs),
            ("sign_tolerance", self.sign_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GeometryError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
