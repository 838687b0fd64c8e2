//! Nearest-neighbor ordering, geography only

use tracing::debug;

use super::{assemble, candidates, nearest, Position};
use crate::error::TourError;
use crate::services::matrix::DistanceMatrix;
use crate::types::{Coordinates, DeliveryPoint};

/// Greedy tour from `start`: always drive to the closest unvisited stop.
///
/// Returns every stop that has coordinates, with `order` = 1..N and
/// `distance` = cost of the leg that reached it. Deterministic: ties go to
/// the stop supplied first.
pub fn optimize_simple(
    points: Vec<DeliveryPoint>,
    start: Coordinates,
    matrix: &DistanceMatrix,
) -> Result<Vec<DeliveryPoint>, TourError> {
    matrix.ensure_stop_count(points.len())?;

    let mut remaining = candidates(&points, matrix);
    let mut position = Position::start(matrix, start);
    let mut visits = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let costs: Vec<f64> = remaining.iter().map(|c| position.cost_to(matrix, c)).collect();
        let pool: Vec<usize> = (0..remaining.len()).collect();
        let Some(pick) = nearest(&pool, &costs) else {
            break;
        };

        let chosen = remaining.remove(pick);
        visits.push((chosen.index, costs[pick]));
        position = Position::at(&chosen);
    }

    debug!("Nearest-neighbor ordered {} stops", visits.len());

    Ok(assemble(points, &visits))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::types::Priority;
    use std::collections::HashSet;

    #[test]
    fn test_scenario_closer_stop_first() {
        let points = vec![
            point("B", 45.80, 6.00, Priority::Standard),
            point("A", 45.91, 6.16, Priority::Standard),
        ];
        let matrix = haversine_matrix(&points);

        let route = optimize_simple(points, depot(), &matrix).unwrap();

        assert_eq!(names(&route), vec!["A", "B"]);
        assert!((route[0].distance - 1.36).abs() < 0.1);
        assert_eq!(route[0].order, 1);
        assert_eq!(route[1].order, 2);
    }

    #[test]
    fn test_returns_permutation_with_contiguous_orders() {
        let points = vec![
            point("A", 45.91, 6.16, Priority::Standard),
            point("B", 45.80, 6.00, Priority::Standard),
            point("C", 45.86, 6.10, Priority::Standard),
            point("D", 45.95, 6.20, Priority::Standard),
            point("E", 45.88, 6.13, Priority::Standard),
        ];
        let ids: HashSet<_> = points.iter().map(|p| p.id).collect();
        let matrix = haversine_matrix(&points);

        let route = optimize_simple(points, depot(), &matrix).unwrap();

        assert_eq!(route.len(), 5);
        let route_ids: HashSet<_> = route.iter().map(|p| p.id).collect();
        assert_eq!(route_ids, ids);
        let orders: Vec<u32> = route.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
        assert!(route.iter().all(|p| p.distance >= 0.0));
    }

    #[test]
    fn test_deterministic() {
        let points = vec![
            point("A", 45.91, 6.16, Priority::Standard),
            point("B", 45.80, 6.00, Priority::Standard),
            point("C", 45.86, 6.10, Priority::Standard),
        ];
        let matrix = haversine_matrix(&points);

        let first = optimize_simple(points.clone(), depot(), &matrix).unwrap();
        let second = optimize_simple(points, depot(), &matrix).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_ties_go_to_first_supplied() {
        let points = vec![
            point("A", 45.91, 6.16, Priority::Standard),
            point("B", 45.92, 6.17, Priority::Standard),
        ];
        // Both stops equidistant from the start and from each other
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 2.0, 2.0, 1.0],
            vec![2.0, 0.0, 1.0, 1.0],
            vec![2.0, 1.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0, 0.0],
        ])
        .unwrap();

        let route = optimize_simple(points, depot(), &matrix).unwrap();
        assert_eq!(names(&route), vec!["A", "B"]);
    }

    #[test]
    fn test_uses_matrix_costs_over_geography() {
        let points = vec![
            point("A", 45.91, 6.16, Priority::Standard),
            point("B", 45.80, 6.00, Priority::Standard),
        ];
        // Road network makes B the cheaper first leg
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 9.0, 4.0, 1.0],
            vec![9.0, 0.0, 5.0, 1.0],
            vec![4.0, 5.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0, 0.0],
        ])
        .unwrap();

        let route = optimize_simple(points, depot(), &matrix).unwrap();
        assert_eq!(names(&route), vec!["B", "A"]);
        assert_eq!(route[0].distance, 4.0);
        assert_eq!(route[1].distance, 5.0);
    }

    #[test]
    fn test_missing_cell_falls_back_to_haversine() {
        let points = vec![point("A", 45.91, 6.16, Priority::Standard)];
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, f64::INFINITY, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ])
        .unwrap();

        let route = optimize_simple(points, depot(), &matrix).unwrap();
        assert!((route[0].distance - 1.36).abs() < 0.1);
    }

    #[test]
    fn test_stop_without_coordinates_is_not_selected() {
        let mut unlocated = point("Z", 45.0, 6.0, Priority::Standard);
        unlocated.address.coordinates = None;
        let points = vec![point("A", 45.91, 6.16, Priority::Standard), unlocated];
        let matrix = DistanceMatrix::from_rows(vec![vec![1.0; 4]; 4]).unwrap();

        let route = optimize_simple(points, depot(), &matrix).unwrap();
        assert_eq!(names(&route), vec!["A"]);
        assert_eq!(route[0].order, 1);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_rejects_misaligned_matrix() {
        let points = vec![point("A", 45.91, 6.16, Priority::Standard)];
        let matrix = DistanceMatrix::from_rows(vec![vec![0.0; 4]; 4]).unwrap();
        assert_eq!(
            optimize_simple(points, depot(), &matrix),
            Err(TourError::MatrixIndexMismatch { expected: 3, actual: 4 })
        );
    }
}
