//! Descriptive statistics over a curve's points.

use serde::{Deserialize, Serialize};

use super::Point;

/// Distance under which two coordinates count as matching.
const MATCH_TOLERANCE: f64 = 1.0;

/// Axis-aligned extent of a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lower-left corner.
    pub min: Point,
    /// Upper-right corner.
    pub max: Point,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for no points.
    #[must_use]
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(
            Self {
                min: first,
                max: first,
            },
            |bb, p| Self {
                min: Point::new(bb.min.x.min(p.x), bb.min.y.min(p.y)),
                max: Point::new(bb.max.x.max(p.x), bb.max.y.max(p.y)),
            },
        ))
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// `width * height`.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// Reflection symmetry about the centroid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symmetry {
    /// Every x reflected through the centroid matches some point's x.
    pub horizontal: bool,
    /// Every y reflected through the centroid matches some point's y.
    pub vertical: bool,
    /// Both of the above.
    pub rotational: bool,
}

impl Symmetry {
    /// Checks each point's reflection against the whole set.
    ///
    /// Fewer than two points are never symmetric.
    #[must_use]
    pub fn of(points: &[Point]) -> Self {
        if points.len() < 2 {
            return Self::default();
        }
        let n = points.len() as f64;
        let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

        let matches = |target: f64, coord: fn(&Point) -> f64| {
            points
                .iter()
                .any(|p| (coord(p) - target).abs() < MATCH_TOLERANCE)
        };
        let horizontal = points.iter().all(|p| matches(2.0 * cx - p.x, |q| q.x));
        let vertical = points.iter().all(|p| matches(2.0 * cy - p.y, |q| q.y));

        Self {
            horizontal,
            vertical,
            rotational: horizontal && vertical,
        }
    }
}

/// Statistics used to suggest stage parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveAnalysis {
    /// Number of points.
    pub point_count: usize,
    /// Extent of the points.
    pub bounds: BoundingBox,
    /// Bounding-box area.
    pub area: f64,
    /// Length of the closed polygon through the points.
    pub perimeter: f64,
    /// Mean triangle area over consecutive point triples.
    pub curvature: f64,
    /// Points per unit of `width + height`.
    pub complexity: f64,
    /// Points per unit of perimeter.
    pub point_density: f64,
    /// Whether the last point returns to the first.
    pub is_closed: bool,
    /// Reflection symmetry.
    pub symmetry: Symmetry,
}

impl CurveAnalysis {
    /// Analyzes a point list. Returns `None` when it is empty.
    #[must_use]
    pub fn analyze(points: &[Point]) -> Option<Self> {
        let bounds = BoundingBox::of(points)?;
        let n = points.len() as f64;
        let span = bounds.width() + bounds.height();
        let perimeter = perimeter(points);

        Some(Self {
            point_count: points.len(),
            bounds,
            area: bounds.area(),
            perimeter,
            curvature: total_turn_area(points) / n,
            complexity: if span > 0.0 { n / span } else { 0.0 },
            point_density: if perimeter > 0.0 { n / perimeter } else { 0.0 },
            is_closed: is_closed(points),
            symmetry: Symmetry::of(points),
        })
    }

    /// Bounding-box width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    /// Bounding-box height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bounds.height()
    }
}

/// Closed-loop length, including the segment from last back to first.
fn perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.distance_to(b))
        .sum()
}

fn total_turn_area(points: &[Point]) -> f64 {
    points
        .windows(3)
        .map(|w| {
            let (p1, p2, p3) = (w[0], w[1], w[2]);
            ((p2.x - p1.x) * (p3.y - p1.y) - (p3.x - p1.x) * (p2.y - p1.y)).abs() / 2.0
        })
        .sum()
}

fn is_closed(points: &[Point]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 3 => {
            first.distance_to(last) < MATCH_TOLERANCE
        }
        _ => false,
    }
}
