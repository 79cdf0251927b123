//! Stand-in handlers used when the optimizer and offset plugins are not loaded.
//!
//! They produce payloads of the same shape the real plugins report, with
//! fixed numbers, so a front end can be exercised end to end.

use serde_json::json;

use super::{HandlerOutcome, StageHandler};
use crate::cancellation::CancellationToken;
use crate::core::{Parameters, StageKind};

const SIMULATED_INPUT_POINTS: i64 = 100;
const SIMULATED_OPTIMIZED_POINTS: i64 = 75;

fn cancelled(cancel: &CancellationToken) -> Option<HandlerOutcome> {
    cancel.stop_message().map(HandlerOutcome::fail)
}

/// Accepts any non-empty `file_path`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadHandler;

impl StageHandler for LoadHandler {
    fn handle(
        &self,
        _kind: StageKind,
        parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        if let Some(outcome) = cancelled(cancel) {
            return Ok(outcome);
        }
        let file_path = parameters.get_str("file_path").unwrap_or_default();
        if file_path.trim().is_empty() {
            return Ok(HandlerOutcome::fail("no input curve file selected"));
        }
        let file_format = parameters.get_str("file_format").unwrap_or("svg");
        Ok(HandlerOutcome::ok(json!({
            "status": "loaded",
            "file_path": file_path,
            "file_format": file_format,
        }))
        .with_message(format!("loaded {file_path}")))
    }
}

/// Reports a fixed point reduction, or the requested target count.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeHandler;

impl StageHandler for OptimizeHandler {
    fn handle(
        &self,
        _kind: StageKind,
        parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        if let Some(outcome) = cancelled(cancel) {
            return Ok(outcome);
        }
        let optimized = match parameters.get_i64("target_point_count") {
            Some(target) if target > 0 => target.min(SIMULATED_INPUT_POINTS),
            _ => SIMULATED_OPTIMIZED_POINTS,
        };
        Ok(HandlerOutcome::ok(json!({
            "status": "optimized",
            "original_points": SIMULATED_INPUT_POINTS,
            "optimized_points": optimized,
            "quality_improvement": 0.15,
        }))
        .with_message(format!("{SIMULATED_INPUT_POINTS} -> {optimized} points")))
    }
}

/// Reports two generated curves at the requested distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetHandler;

impl StageHandler for OffsetHandler {
    fn handle(
        &self,
        _kind: StageKind,
        parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        if let Some(outcome) = cancelled(cancel) {
            return Ok(outcome);
        }
        let distance = parameters.get_f64("offset_distance").unwrap_or(1.0);
        if distance.abs() < f64::EPSILON {
            return Ok(HandlerOutcome::fail("bad offset_distance"));
        }
        Ok(HandlerOutcome::ok(json!({
            "status": "generated",
            "offset_distance": distance,
            "curves_generated": 2,
        })))
    }
}

/// Reports a fixed quality score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateHandler;

impl StageHandler for ValidateHandler {
    fn handle(
        &self,
        _kind: StageKind,
        _parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        if let Some(outcome) = cancelled(cancel) {
            return Ok(outcome);
        }
        Ok(HandlerOutcome::ok(json!({"status": "validated", "quality_score": 0.95})))
    }
}

/// Echoes the export destination without writing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportHandler;

impl StageHandler for ExportHandler {
    fn handle(
        &self,
        _kind: StageKind,
        parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        if let Some(outcome) = cancelled(cancel) {
            return Ok(outcome);
        }
        Ok(HandlerOutcome::ok(json!({
            "status": "exported",
            "output_path": parameters.get_str("output_path").unwrap_or("output"),
            "output_format": parameters.get_str("output_format").unwrap_or("svg"),
            "include_metadata": parameters.get_bool("include_metadata").unwrap_or(true),
        })))
    }
}
