use crate::core::lattice::Lattice;
use crate::core::symmetry::operation::SymOp;
use crate::core::symmetry::space_group::SpaceGroup;
use nalgebra::Vector3;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_POSITION_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_OPERATION_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_COEFFICIENT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_REPIVOT_ATTEMPTS: usize = 3;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {value} (must be positive and finite)")]
    InvalidTolerance { name: &'static str, value: f64 },

    #[error("Invalid origin offset {0:?} (components must be finite)")]
    InvalidOriginOffset([f64; 3]),
}

/// The metric in which `position_tolerance` is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean distance between fractional coordinates.
    #[default]
    Fractional,
    /// Distance in Angstroms through the structure's lattice.
    Cartesian,
}

impl DistanceMetric {
    /// The lattice whose metric realizes this choice for a structure in `lattice`.
    pub fn lattice_for(&self, lattice: &Lattice) -> Lattice {
        match self {
            DistanceMetric::Fractional => Lattice::cartesian(),
            DistanceMetric::Cartesian => lattice.clone(),
        }
    }
}

/// Tolerances shared by every symmetry analysis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymmetryConfig {
    /// Periodic distance below which two positions are the same site.
    pub position_tolerance: f64,
    /// Tolerance on translations (modulo 1) when comparing operations.
    pub operation_tolerance: f64,
    /// Constraint coefficients and constants below this magnitude are zero.
    pub coefficient_tolerance: f64,
    /// Extra row reductions attempted when a constraint formula refers to itself.
    pub max_repivot_attempts: usize,
    pub metric: DistanceMetric,
    /// Fractional offset of the space group origin. Every operation `g` acts as
    /// `p ↦ g(p + offset) − offset`.
    pub origin_offset: [f64; 3],
}

impl Default for SymmetryConfig {
    fn default() -> Self {
        Self {
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
            operation_tolerance: DEFAULT_OPERATION_TOLERANCE,
            coefficient_tolerance: DEFAULT_COEFFICIENT_TOLERANCE,
            max_repivot_attempts: DEFAULT_MAX_REPIVOT_ATTEMPTS,
            metric: DistanceMetric::default(),
            origin_offset: [0.0; 3],
        }
    }
}

impl SymmetryConfig {
    pub fn builder() -> SymmetryConfigBuilder {
        SymmetryConfigBuilder::new()
    }

    /// Checks that every tolerance is positive and finite and the origin offset is finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("position_tolerance", self.position_tolerance),
            ("operation_tolerance", self.operation_tolerance),
            ("coefficient_tolerance", self.coefficient_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }
        if !self.origin_offset.iter().all(|value| value.is_finite()) {
            return Err(ConfigError::InvalidOriginOffset(self.origin_offset));
        }
        Ok(())
    }

    pub fn origin(&self) -> Vector3<f64> {
        Vector3::from(self.origin_offset)
    }

    /// The operations of `group` in storage order, acting about the configured origin.
    pub fn operations_of(&self, group: &SpaceGroup) -> Vec<SymOp> {
        let origin = self.origin();
        group
            .operations()
            .iter()
            .map(|op| op.about_origin(&origin))
            .collect()
    }
}

#[derive(Default)]
pub struct SymmetryConfigBuilder {
    position_tolerance: Option<f64>,
    operation_tolerance: Option<f64>,
    coefficient_tolerance: Option<f64>,
    max_repivot_attempts: Option<usize>,
    metric: Option<DistanceMetric>,
    origin_offset: Option<[f64; 3]>,
}

impl SymmetryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position_tolerance(mut self, tolerance: f64) -> Self {
        self.position_tolerance = Some(tolerance);
        self
    }
    pub fn operation_tolerance(mut self, tolerance: f64) -> Self {
        self.operation_tolerance = Some(tolerance);
        self
    }
    pub fn coefficient_tolerance(mut self, tolerance: f64) -> Self {
        self.coefficient_tolerance = Some(tolerance);
        self
    }
    pub fn max_repivot_attempts(mut self, attempts: usize) -> Self {
        self.max_repivot_attempts = Some(attempts);
        self
    }
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = Some(metric);
        self
    }
    pub fn origin_offset(mut self, offset: [f64; 3]) -> Self {
        self.origin_offset = Some(offset);
        self
    }

    pub fn build(self) -> Result<SymmetryConfig, ConfigError> {
        let defaults = SymmetryConfig::default();
        let config = SymmetryConfig {
            position_tolerance: self
                .position_tolerance
                .unwrap_or(defaults.position_tolerance),
            operation_tolerance: self
                .operation_tolerance
                .unwrap_or(defaults.operation_tolerance),
            coefficient_tolerance: self
                .coefficient_tolerance
                .unwrap_or(defaults.coefficient_tolerance),
            max_repivot_attempts: self
                .max_repivot_attempts
                .unwrap_or(defaults.max_repivot_attempts),
            metric: self.metric.unwrap_or(defaults.metric),
            origin_offset: self.origin_offset.unwrap_or(defaults.origin_offset),
        };
        config.validate()?;
        Ok(config)
    }
}
