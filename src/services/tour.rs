//! Tour assembly
//!
//! Runs one optimization request end to end:
//! grouping -> geocoding -> matrix -> ordering -> time projection.
//!
//! Geocoding is the only concurrent stage: every stop without coordinates
//! is looked up at once, each lookup under its own timeout, and the batch
//! is joined before moving on. A stop that cannot be located is skipped and
//! reported, never fatal on its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::defaults;
use crate::error::TourError;
use crate::services::geo::haversine_distance;
use crate::services::geocoding::Geocoder;
use crate::services::grouping::group_by_address;
use crate::services::matrix::{build_matrix, matrix_points, DistanceMatrix};
use crate::services::optimizer::{ConstraintConfig, OptimizerStrategy};
use crate::services::routing::RoutingService;
use crate::services::schedule::project_times;
use crate::types::time_format::format_hhmm;
use crate::types::{
    Address, Coordinates, DeliveryPoint, Depots, ScheduleParams, SkippedStop, TourRequest, TourResult, TourSummary,
};

/// Stage of one optimization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Grouping,
    Geocoding,
    MatrixBuild,
    Optimizing,
    TimeProjection,
    Done,
    Error,
}

impl Stage {
    /// Stage that follows on success; terminal stages have none
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::Grouping),
            Stage::Grouping => Some(Stage::Geocoding),
            Stage::Geocoding => Some(Stage::MatrixBuild),
            Stage::MatrixBuild => Some(Stage::Optimizing),
            Stage::Optimizing => Some(Stage::TimeProjection),
            Stage::TimeProjection => Some(Stage::Done),
            Stage::Done | Stage::Error => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Grouping => "grouping",
            Stage::Geocoding => "geocoding",
            Stage::MatrixBuild => "matrix_build",
            Stage::Optimizing => "optimizing",
            Stage::TimeProjection => "time_projection",
            Stage::Done => "done",
            Stage::Error => "error",
        };
        f.write_str(name)
    }
}

/// Stage history of a single request
#[derive(Debug, Clone)]
pub struct RequestTrace {
    request_id: Uuid,
    stages: Vec<Stage>,
    error: Option<TourError>,
}

impl RequestTrace {
    fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            stages: vec![Stage::Idle],
            error: None,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Idle)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Error that ended the request, if it failed
    pub fn error(&self) -> Option<&TourError> {
        self.error.as_ref()
    }

    /// Move to `stage`; it must be the successor of the current one
    fn advance(&mut self, stage: Stage) {
        debug_assert_eq!(self.current().next(), Some(stage), "illegal stage transition");
        debug!("Request {}: {} -> {}", self.request_id, self.current(), stage);
        self.stages.push(stage);
    }

    /// Jump to `Done`, for requests with nothing left to do
    fn finish_early(&mut self) {
        debug!("Request {}: {} -> done (nothing to optimize)", self.request_id, self.current());
        self.stages.push(Stage::Done);
    }

    fn fail(&mut self, error: &TourError) {
        if error.is_user_facing() {
            warn!("Request {} failed during {}: {}", self.request_id, self.current(), error);
        } else {
            error!("Request {} hit an internal error during {}: {}", self.request_id, self.current(), error);
        }
        self.stages.push(Stage::Error);
        self.error = Some(error.clone());
    }
}

/// Why a stop could not be located
#[derive(Debug, Error)]
enum LookupFailure {
    #[error("address not found")]
    NotFound,
    #[error("geocoding timed out after {0} ms")]
    TimedOut(u128),
    #[error("geocoding failed: {0}")]
    Failed(String),
    #[error("geocoder returned invalid coordinates")]
    InvalidCoordinates,
}

/// Orchestrates one optimization request over the geocoding and routing collaborators.
///
/// Holds no per-request state, so one assembler can serve concurrent requests.
#[derive(Clone)]
pub struct TourAssembler {
    geocoder: Arc<dyn Geocoder>,
    routing: Arc<dyn RoutingService>,
    depots: Depots,
    constraints: ConstraintConfig,
    geocode_timeout: Duration,
}

impl TourAssembler {
    pub fn new(geocoder: Arc<dyn Geocoder>, routing: Arc<dyn RoutingService>, depots: Depots) -> Self {
        Self {
            geocoder,
            routing,
            depots,
            constraints: ConstraintConfig::default(),
            geocode_timeout: Duration::from_millis(defaults::DEFAULT_GEOCODE_TIMEOUT_MS),
        }
    }

    pub fn from_config(config: &Config, geocoder: Arc<dyn Geocoder>, routing: Arc<dyn RoutingService>) -> Self {
        Self::new(geocoder, routing, config.depots.clone())
            .with_constraints(ConstraintConfig::from_config(config))
            .with_geocode_timeout(config.geocode_timeout)
    }

    pub fn with_constraints(mut self, constraints: ConstraintConfig) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_geocode_timeout(mut self, timeout: Duration) -> Self {
        self.geocode_timeout = timeout;
        self
    }

    /// Optimize a request into a time-annotated tour
    pub async fn optimize(&self, request: TourRequest, cancel: &CancellationToken) -> Result<TourResult, TourError> {
        self.optimize_traced(request, cancel).await.0
    }

    /// Same as [`optimize`](Self::optimize), also returning the stages the request went through
    pub async fn optimize_traced(
        &self,
        request: TourRequest,
        cancel: &CancellationToken,
    ) -> (Result<TourResult, TourError>, RequestTrace) {
        let mut trace = RequestTrace::new();
        let result = self.run(request, cancel, &mut trace).await;
        if let Err(e) = &result {
            trace.fail(e);
        }
        (result, trace)
    }

    async fn run(
        &self,
        request: TourRequest,
        cancel: &CancellationToken,
        trace: &mut RequestTrace,
    ) -> Result<TourResult, TourError> {
        let schedule = request.settings.validate()?;

        trace.advance(Stage::Grouping);
        let pending: Vec<_> = request.packages.into_iter().filter(|p| p.is_pending()).collect();
        let points = group_by_address(pending);
        if points.is_empty() {
            info!("Request {}: no pending packages, nothing to optimize", trace.request_id());
            trace.finish_early();
            return Ok(TourResult::empty(&format_hhmm(schedule.start_time())));
        }

        trace.advance(Stage::Geocoding);
        let (located, skipped) = self.locate_all(points, cancel).await?;
        if located.is_empty() {
            return Err(TourError::NothingLocated { skipped });
        }

        trace.advance(Stage::MatrixBuild);
        let coordinates: Vec<Coordinates> = located.iter().filter_map(DeliveryPoint::coordinates).collect();
        let matrix = self.distance_matrix(&coordinates, cancel).await?;
        let matrix_index: HashMap<Uuid, usize> = located
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, matrix.stop_index(i)))
            .collect();

        trace.advance(Stage::Optimizing);
        let strategy = OptimizerStrategy::select(&located, &self.constraints);
        info!(
            "Request {}: ordering {} stops with the {} optimizer",
            trace.request_id(),
            located.len(),
            strategy.name()
        );
        let route = strategy.optimize(located, self.depots.start.coordinates, &matrix, &schedule)?;

        trace.advance(Stage::TimeProjection);
        let return_leg = self.return_leg(&route, &matrix, &matrix_index, &schedule);
        let total_distance_km: f64 = route.iter().map(|p| p.distance).sum();
        let package_count = route.iter().map(|p| p.packages.len()).sum();
        let projection = project_times(route, &schedule, return_leg);

        trace.advance(Stage::Done);
        info!(
            "Request {}: {} stops, {:.2} km, ends at {} ({} skipped)",
            trace.request_id(),
            projection.stops.len(),
            total_distance_km,
            projection.end_time,
            skipped.len()
        );

        Ok(TourResult {
            summary: TourSummary {
                total_time: projection.total_time,
                total_distance_km,
                end_time: projection.end_time,
                return_distance_km: projection.return_distance_km,
                stop_count: projection.stops.len(),
                package_count,
            },
            stops: projection.stops,
            skipped,
            strategy: strategy.name().to_string(),
        })
    }

    /// Geocode every stop lacking coordinates, concurrently.
    ///
    /// Returns located stops (input order kept) and the skipped ones.
    async fn locate_all(
        &self,
        points: Vec<DeliveryPoint>,
        cancel: &CancellationToken,
    ) -> Result<(Vec<DeliveryPoint>, Vec<SkippedStop>), TourError> {
        let missing = points.iter().filter(|p| p.coordinates().is_none()).count();
        debug!("Geocoding {} of {} stops with {}", missing, points.len(), self.geocoder.name());

        // Lookups queued behind a rate limiter get their wait added to the budget
        let interval = self.geocoder.request_interval();
        let mut queued: u32 = 0;
        let lookups = points.iter().map(|p| {
            let budget = self.geocode_timeout + interval * queued;
            if p.coordinates().is_none() {
                queued += 1;
            }
            self.locate(&p.address, budget)
        });
        let outcomes = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Geocoding batch abandoned");
                return Err(TourError::Cancelled);
            }
            outcomes = join_all(lookups) => outcomes,
        };

        let mut located = Vec::with_capacity(points.len());
        let mut skipped = Vec::new();

        for (mut point, outcome) in points.into_iter().zip(outcomes) {
            match outcome {
                Ok(coordinates) => {
                    point.address.coordinates = Some(coordinates);
                    located.push(point);
                }
                Err(failure) => {
                    warn!("Skipping stop {} ({}): {}", point.id, point.address.full_address, failure);
                    skipped.push(SkippedStop {
                        stop_id: point.id,
                        address: point.address.full_address,
                        reason: failure.to_string(),
                    });
                }
            }
        }

        Ok((located, skipped))
    }

    async fn locate(&self, address: &Address, budget: Duration) -> Result<Coordinates, LookupFailure> {
        if let Some(coordinates) = address.located() {
            return Ok(coordinates);
        }

        match tokio::time::timeout(budget, self.geocoder.geocode(address)).await {
            Err(_) => Err(LookupFailure::TimedOut(budget.as_millis())),
            Ok(Err(e)) => Err(LookupFailure::Failed(e.to_string())),
            Ok(Ok(None)) => Err(LookupFailure::NotFound),
            Ok(Ok(Some(result))) if !result.coordinates.is_valid() => Err(LookupFailure::InvalidCoordinates),
            Ok(Ok(Some(result))) => {
                debug!("{} located as '{}'", address.full_address, result.display_name);
                Ok(result.coordinates)
            }
        }
    }

    /// Matrix from the routing service, or great-circle distances when it fails
    async fn distance_matrix(
        &self,
        stops: &[Coordinates],
        cancel: &CancellationToken,
    ) -> Result<DistanceMatrix, TourError> {
        let points = matrix_points(self.depots.start.coordinates, stops, self.depots.end.coordinates);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TourError::Cancelled),
            response = self.routing.get_matrix(&points) => response,
        };

        match response {
            Ok(matrix) if matrix.size() == points.len() => Ok(matrix),
            Ok(matrix) => {
                warn!(
                    "{} returned a {}x{} matrix for {} points, using haversine",
                    self.routing.name(),
                    matrix.size(),
                    matrix.size(),
                    points.len()
                );
                build_matrix(&points)
            }
            Err(e) => {
                warn!("{} matrix failed: {}. Using haversine", self.routing.name(), e);
                build_matrix(&points)
            }
        }
    }

    /// Last stop to end depot, when the tour returns to depot
    fn return_leg(
        &self,
        route: &[DeliveryPoint],
        matrix: &DistanceMatrix,
        matrix_index: &HashMap<Uuid, usize>,
        schedule: &ScheduleParams,
    ) -> Option<f64> {
        if !schedule.return_to_depot() {
            return None;
        }
        let last = route.last()?;
        let end = self.depots.end.coordinates;

        let from_matrix = matrix_index
            .get(&last.id)
            .and_then(|&from| matrix.cost(from, matrix.end_index()));

        from_matrix.or_else(|| last.coordinates().map(|c| haversine_distance(&c, &end)))
    }
}
