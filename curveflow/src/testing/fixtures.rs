//! Sample curves and ready-to-run sequencers.

use std::f64::consts::PI;
use std::sync::Arc;

use crate::analysis::Point;
use crate::core::{Parameters, StageKind};
use crate::errors::CurveflowError;
use crate::events::EventSink;
use crate::stages::StageHandlers;
use crate::workflow::Sequencer;

/// `count` points evenly spaced on a circle around the origin.
///
/// The first point is not repeated at the end.
#[must_use]
pub fn circle(radius: f64, count: usize) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / count as f64;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// A half circle from `(radius, 0)` to `(-radius, 0)`.
#[must_use]
pub fn open_arc(radius: f64, count: usize) -> Vec<Point> {
    let steps = count.saturating_sub(1).max(1) as f64;
    (0..count)
        .map(|i| {
            let angle = PI * i as f64 / steps;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// An axis-aligned square outline with `per_side` points on each side.
///
/// The outline ends on its starting corner, so it reads as closed.
#[must_use]
pub fn square(side: f64, per_side: usize) -> Vec<Point> {
    let per_side = per_side.max(1);
    let step = side / per_side as f64;
    let corners = [(0.0, 0.0), (side, 0.0), (side, side), (0.0, side)];
    let directions = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];

    let mut points: Vec<Point> = corners
        .iter()
        .zip(directions)
        .flat_map(|(&(x, y), (dx, dy))| {
            (0..per_side).map(move |i| {
                let t = step * i as f64;
                Point::new(x + dx * t, y + dy * t)
            })
        })
        .collect();
    points.push(Point::new(0.0, 0.0));
    points
}

/// Load parameters naming an input file, so the simulated load stage passes.
#[must_use]
pub fn input_parameters(path: &str) -> Parameters {
    Parameters::new().with("file_path", path)
}

/// A sequencer on the simulated handlers with an input file already chosen.
pub fn simulated_sequencer(sink: Arc<dyn EventSink>) -> Result<Sequencer, CurveflowError> {
    let mut sequencer = Sequencer::new(StageHandlers::simulated(), sink);
    sequencer.update_parameters(StageKind::Load, &input_parameters("curves/outline.svg"))?;
    Ok(sequencer)
}
