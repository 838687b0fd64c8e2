//! Distance matrix over the points of one tour
//!
//! Index convention, shared by every component that reads the matrix:
//! `0` is the start depot, `1..=N` are the delivery stops in the order they
//! were supplied, `N + 1` is the end depot.

use crate::error::TourError;
use crate::services::geo::haversine_distance;
use crate::types::Coordinates;

/// Start depot + one stop + end depot
pub const MIN_POINTS: usize = 3;

/// Travel costs in kilometers, `costs[i][j]` from point i to point j
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    costs: Vec<Vec<f64>>,
    size: usize,
}

impl DistanceMatrix {
    /// Wrap rows produced elsewhere (e.g. a routing service). Rows must form a square.
    pub fn from_rows(costs: Vec<Vec<f64>>) -> Result<Self, TourError> {
        let size = costs.len();
        if let Some(row) = costs.iter().find(|row| row.len() != size) {
            return Err(TourError::MatrixIndexMismatch {
                expected: size,
                actual: row.len(),
            });
        }
        Ok(Self { costs, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of delivery stops between the two depots
    pub fn stop_count(&self) -> usize {
        self.size.saturating_sub(2)
    }

    pub const fn start_index(&self) -> usize {
        0
    }

    /// Matrix index of the `i`-th stop (0-based)
    pub const fn stop_index(&self, i: usize) -> usize {
        i + 1
    }

    pub fn end_index(&self) -> usize {
        self.size.saturating_sub(1)
    }

    /// Cost from `from` to `to`; `None` when the pair is out of range or the
    /// cell holds no usable value.
    pub fn cost(&self, from: usize, to: usize) -> Option<f64> {
        self.costs
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .filter(|c| c.is_finite() && *c >= 0.0)
    }

    /// Fail unless the matrix was built for exactly `stop_count` stops plus two depots
    pub fn ensure_stop_count(&self, stop_count: usize) -> Result<(), TourError> {
        let expected = stop_count + 2;
        debug_assert_eq!(self.size, expected, "distance matrix / point list misaligned");
        if self.size != expected {
            return Err(TourError::MatrixIndexMismatch {
                expected,
                actual: self.size,
            });
        }
        Ok(())
    }
}

/// Lay out matrix input points: start depot, stops, end depot
pub fn matrix_points(start: Coordinates, stops: &[Coordinates], end: Coordinates) -> Vec<Coordinates> {
    let mut points = Vec::with_capacity(stops.len() + 2);
    points.push(start);
    points.extend_from_slice(stops);
    points.push(end);
    points
}

/// Build the full pairwise haversine matrix
pub fn build_matrix(points: &[Coordinates]) -> Result<DistanceMatrix, TourError> {
    if points.len() < MIN_POINTS {
        return Err(TourError::InsufficientPoints {
            available: points.len(),
        });
    }

    let n = points.len();
    let mut costs = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..n {
            if i != j {
                costs[i][j] = haversine_distance(&points[i], &points[j]);
            }
        }
    }

    Ok(DistanceMatrix { costs, size: n })
}
