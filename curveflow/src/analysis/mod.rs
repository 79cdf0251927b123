//! Curve statistics and the parameter suggestions derived from them.
//!
//! The numbers are coarse descriptive heuristics over a 2D point list,
//! meant to pre-fill the optimize and offset stages with sensible values.

mod curve;
mod suggestions;

pub use curve::{BoundingBox, CurveAnalysis, Symmetry};
pub use suggestions::{
    DeformerSuggestion, OffsetAlgorithm, OffsetDirection, OptimizationTier, OptimizerSuggestion,
    ParameterSuggestions, PerformanceSuggestion, ProcessingPriority, QualityTier,
};

use serde::{Deserialize, Serialize};

/// A 2D curve point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}
