//! Stop ordering
//!
//! Two greedy nearest-neighbor variants over a [`DistanceMatrix`]:
//! geography only, or priority/time-window aware. The variant is chosen once
//! per request as an [`OptimizerStrategy`].

mod config;
mod constrained;
mod simple;

pub use config::ConstraintConfig;
pub use constrained::optimize_with_constraints;
pub use simple::optimize_simple;

use tracing::warn;

use crate::error::TourError;
use crate::services::geo::haversine_distance;
use crate::services::matrix::DistanceMatrix;
use crate::types::{Coordinates, DeliveryPoint, Priority, ScheduleParams};

/// Optimizer variant, selected once per request
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerStrategy {
    Simple,
    Constrained(ConstraintConfig),
}

impl OptimizerStrategy {
    /// Constrained when any stop carries a non-standard priority or a time window
    pub fn select(points: &[DeliveryPoint], config: &ConstraintConfig) -> Self {
        let constrained = points.iter().any(|p| {
            p.priority() != Priority::Standard
                || p.time_window(config.express_deadline).is_some()
        });

        if constrained {
            OptimizerStrategy::Constrained(config.clone())
        } else {
            OptimizerStrategy::Simple
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OptimizerStrategy::Simple => "simple",
            OptimizerStrategy::Constrained(_) => "constrained",
        }
    }

    /// Order `points`; stop `i` must sit at matrix index `i + 1`
    pub fn optimize(
        &self,
        points: Vec<DeliveryPoint>,
        start: Coordinates,
        matrix: &DistanceMatrix,
        schedule: &ScheduleParams,
    ) -> Result<Vec<DeliveryPoint>, TourError> {
        match self {
            OptimizerStrategy::Simple => optimize_simple(points, start, matrix),
            OptimizerStrategy::Constrained(config) => {
                optimize_with_constraints(points, start, matrix, config, schedule)
            }
        }
    }
}

/// A stop that can be selected
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Index in the input point list
    index: usize,
    matrix_index: usize,
    coordinates: Coordinates,
}

/// Where the vehicle currently is
#[derive(Debug, Clone, Copy)]
struct Position {
    matrix_index: usize,
    coordinates: Coordinates,
}

impl Position {
    fn start(matrix: &DistanceMatrix, coordinates: Coordinates) -> Self {
        Self {
            matrix_index: matrix.start_index(),
            coordinates,
        }
    }

    fn at(candidate: &Candidate) -> Self {
        Self {
            matrix_index: candidate.matrix_index,
            coordinates: candidate.coordinates,
        }
    }

    /// Matrix cost, or great-circle distance when the cell is unavailable
    fn cost_to(&self, matrix: &DistanceMatrix, candidate: &Candidate) -> f64 {
        matrix
            .cost(self.matrix_index, candidate.matrix_index)
            .unwrap_or_else(|| haversine_distance(&self.coordinates, &candidate.coordinates))
    }
}

/// Stops with usable coordinates, in input order
fn candidates(points: &[DeliveryPoint], matrix: &DistanceMatrix) -> Vec<Candidate> {
    points
        .iter()
        .enumerate()
        .filter_map(|(index, point)| match point.coordinates() {
            Some(coordinates) => Some(Candidate {
                index,
                matrix_index: matrix.stop_index(index),
                coordinates,
            }),
            None => {
                warn!("Stop {} ({}) has no coordinates, left out of the route", point.id, point.address.full_address);
                None
            }
        })
        .collect()
}

/// Position of the cheapest entry of `pool`; the first one wins ties
fn nearest(pool: &[usize], costs: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for &k in pool {
        if best.map_or(true, |b| costs[k] < costs[b]) {
            best = Some(k);
        }
    }
    best
}

/// Emit stops in visit order with 1-based `order` and leg `distance`
fn assemble(points: Vec<DeliveryPoint>, visits: &[(usize, f64)]) -> Vec<DeliveryPoint> {
    let mut slots: Vec<Option<DeliveryPoint>> = points.into_iter().map(Some).collect();

    visits
        .iter()
        .enumerate()
        .filter_map(|(position, &(index, distance))| {
            slots[index].take().map(|mut point| {
                point.order = position as u32 + 1;
                point.distance = distance;
                point
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use uuid::Uuid;

    use crate::services::matrix::{build_matrix, matrix_points, DistanceMatrix};
    use crate::types::{Address, Coordinates, DeliveryPoint, Package, Priority};

    pub fn depot() -> Coordinates {
        Coordinates { lat: 45.90, lng: 6.15 }
    }

    pub fn end_depot() -> Coordinates {
        Coordinates { lat: 45.885, lng: 6.109 }
    }

    pub fn point(name: &str, lat: f64, lng: f64, priority: Priority) -> DeliveryPoint {
        let address = Address::new("1", name, "74000", "Annecy", "France")
            .with_coordinates(Coordinates { lat, lng });
        DeliveryPoint {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()),
            address: address.clone(),
            packages: vec![Package::new(format!("pkg-{}", name), address).with_priority(priority)],
            order: 0,
            distance: 0.0,
            estimated_time: None,
        }
    }

    pub fn haversine_matrix(points: &[DeliveryPoint]) -> DistanceMatrix {
        let coords: Vec<Coordinates> = points.iter().map(|p| p.coordinates().unwrap()).collect();
        build_matrix(&matrix_points(depot(), &coords, end_depot())).unwrap()
    }

    pub fn names(route: &[DeliveryPoint]) -> Vec<String> {
        route.iter().map(|p| p.address.street_name.clone()).collect()
    }
}
