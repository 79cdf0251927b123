//! Stage parameter suggestions derived from a [`CurveAnalysis`].

use serde::{Deserialize, Serialize};
use tracing::info;

use super::CurveAnalysis;
use crate::core::{Parameters, StageKind};
use crate::errors::CurveflowError;
use crate::workflow::Sequencer;

/// Coarse optimization effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationTier {
    /// Few points.
    Low,
    /// More than 200 points.
    Medium,
    /// More than 500 points.
    High,
}

impl OptimizationTier {
    /// Position on the 1-10 `optimization_level` scale.
    #[must_use]
    pub const fn level(self) -> i64 {
        match self {
            Self::Low => 3,
            Self::Medium => 5,
            Self::High => 8,
        }
    }
}

/// Offset quality bucket, chosen by bounding-box area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Area up to 10000.
    Low,
    /// Area above 10000.
    Medium,
    /// Area above 20000.
    High,
    /// Area above 50000.
    Ultra,
}

impl QualityTier {
    /// Position on the 1-10 `quality_level` scale.
    #[must_use]
    pub const fn level(self) -> i64 {
        match self {
            Self::Low => 3,
            Self::Medium => 5,
            Self::High => 8,
            Self::Ultra => 10,
        }
    }
}

/// Offset algorithm understood by the deformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetAlgorithm {
    /// Offset parallel to the curve, for closed outlines.
    Parallel,
    /// Offset along point normals, for open curves.
    Perpendicular,
}

impl OffsetAlgorithm {
    /// Name passed to the deformer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Perpendicular => "perpendicular",
        }
    }
}

/// Side(s) of the curve to offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetDirection {
    /// Inside and outside.
    Both,
    /// Right-hand side only.
    Right,
}

impl OffsetDirection {
    /// Name passed to the deformer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Right => "right",
        }
    }
}

/// What the processing budget should favor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingPriority {
    /// Simple curves.
    Speed,
    /// Moderately complex curves.
    Balanced,
    /// Dense, complex curves.
    Quality,
}

/// Suggested optimize-stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSuggestion {
    /// Optimization effort.
    pub optimization_level: OptimizationTier,
    /// Smoothing factor in `0.0..=1.0`.
    pub smoothing_factor: f64,
    /// Simplification threshold in `0.001..=0.1`.
    pub simplification_threshold: f64,
    /// Always on.
    pub curvature_based: bool,
    /// Multi-resolution pass for dense curves.
    pub multires_optimization: bool,
    /// Number of optimizer passes.
    pub optimization_iterations: i64,
}

/// Suggested offset-stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeformerSuggestion {
    /// Ten percent of the mean bounding-box side.
    pub offset_distance: f64,
    /// Side(s) to offset.
    pub offset_direction: OffsetDirection,
    /// Always on.
    pub smooth_curves: bool,
    /// Offset algorithm.
    pub offset_algorithm: OffsetAlgorithm,
    /// Quality bucket.
    pub offset_quality: QualityTier,
    /// Always on.
    pub auto_offset_adjustment: bool,
    /// Always on.
    pub collision_resolution: bool,
}

/// Suggested resource settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSuggestion {
    /// What to favor.
    pub processing_priority: ProcessingPriority,
    /// Parallel processing for more than 100 points.
    pub parallel_processing: bool,
    /// Memory limit in megabytes.
    pub memory_limit: u32,
    /// Caching for more than 200 points.
    pub use_cache: bool,
}

/// The full set of suggestions for one curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSuggestions {
    /// Optimize stage.
    pub optimizer: OptimizerSuggestion,
    /// Offset stage.
    pub deformer: DeformerSuggestion,
    /// Resource hints.
    pub performance: PerformanceSuggestion,
}

impl ParameterSuggestions {
    /// Derives suggestions from curve statistics.
    #[must_use]
    pub fn from_analysis(analysis: &CurveAnalysis) -> Self {
        Self {
            optimizer: suggest_optimizer(analysis),
            deformer: suggest_deformer(analysis),
            performance: suggest_performance(analysis),
        }
    }

    /// Parameters for the optimize stage.
    ///
    /// Keys without a declared range ride along for the plugin.
    #[must_use]
    pub fn optimize_parameters(&self) -> Parameters {
        let o = &self.optimizer;
        Parameters::new()
            .with("optimization_level", o.optimization_level.level())
            .with("smoothness_factor", o.smoothing_factor)
            .with("simplification_threshold", o.simplification_threshold)
            .with("curvature_based", o.curvature_based)
            .with("multires_optimization", o.multires_optimization)
            .with("optimization_iterations", o.optimization_iterations)
    }

    /// Parameters for the offset stage.
    #[must_use]
    pub fn offset_parameters(&self) -> Parameters {
        let d = &self.deformer;
        Parameters::new()
            .with("offset_distance", d.offset_distance)
            .with("offset_algorithm", d.offset_algorithm.as_str())
            .with("quality_level", d.offset_quality.level())
            .with("offset_direction", d.offset_direction.as_str())
            .with("smooth_curves", d.smooth_curves)
            .with("auto_offset_adjustment", d.auto_offset_adjustment)
            .with("collision_resolution", d.collision_resolution)
    }

    /// Writes the optimizer and deformer suggestions into the sequencer.
    ///
    /// Both parameter sets are validated before either is applied.
    ///
    /// # Errors
    ///
    /// Fails like [`Sequencer::update_parameters`], e.g. while running.
    pub fn apply(&self, sequencer: &mut Sequencer) -> Result<(), CurveflowError> {
        let optimize = self.optimize_parameters();
        let offset = self.offset_parameters();
        StageKind::Optimize.validate_parameters(&optimize)?;
        StageKind::Offset.validate_parameters(&offset)?;

        sequencer.update_parameters(StageKind::Optimize, &optimize)?;
        sequencer.update_parameters(StageKind::Offset, &offset)?;
        info!(
            optimization_level = self.optimizer.optimization_level.level(),
            offset_distance = self.deformer.offset_distance,
            "Applied suggested parameters"
        );
        Ok(())
    }
}

fn suggest_optimizer(analysis: &CurveAnalysis) -> OptimizerSuggestion {
    let points = analysis.point_count;
    let (tier, mut smoothing, mut simplification) = if points > 500 {
        (OptimizationTier::High, 0.7_f64, 0.02_f64)
    } else if points > 200 {
        (OptimizationTier::Medium, 0.5, 0.01)
    } else {
        (OptimizationTier::Low, 0.3, 0.005)
    };

    if analysis.complexity > 2.0 {
        smoothing *= 0.8;
        simplification *= 1.5;
    }
    if analysis.curvature > 1.0 {
        smoothing *= 1.2;
    }

    OptimizerSuggestion {
        optimization_level: tier,
        smoothing_factor: smoothing.clamp(0.0, 1.0),
        simplification_threshold: simplification.clamp(0.001, 0.1),
        curvature_based: true,
        multires_optimization: points > 300,
        optimization_iterations: if points > 200 { 3 } else { 2 },
    }
}

fn suggest_deformer(analysis: &CurveAnalysis) -> DeformerSuggestion {
    let mean_side = (analysis.width() + analysis.height()) / 2.0;
    let quality = if analysis.area > 50_000.0 {
        QualityTier::Ultra
    } else if analysis.area > 20_000.0 {
        QualityTier::High
    } else if analysis.area > 10_000.0 {
        QualityTier::Medium
    } else {
        QualityTier::Low
    };
    let (algorithm, direction) = if analysis.is_closed {
        (OffsetAlgorithm::Parallel, OffsetDirection::Both)
    } else {
        (OffsetAlgorithm::Perpendicular, OffsetDirection::Right)
    };

    DeformerSuggestion {
        offset_distance: mean_side * 0.1,
        offset_direction: direction,
        smooth_curves: true,
        offset_algorithm: algorithm,
        offset_quality: quality,
        auto_offset_adjustment: true,
        collision_resolution: true,
    }
}

fn suggest_performance(analysis: &CurveAnalysis) -> PerformanceSuggestion {
    let points = analysis.point_count;
    let processing_priority = if analysis.complexity > 2.0 {
        ProcessingPriority::Quality
    } else if analysis.complexity > 1.0 {
        ProcessingPriority::Balanced
    } else {
        ProcessingPriority::Speed
    };
    let memory_limit = if points > 1000 {
        1024
    } else if points > 500 {
        768
    } else {
        512
    };

    PerformanceSuggestion {
        processing_priority,
        parallel_processing: points > 100,
        memory_limit,
        use_cache: points > 200,
    }
}
