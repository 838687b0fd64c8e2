//! Nearest-neighbor ordering with priority tiers and time windows
//!
//! At each step:
//! 1. candidates whose projected arrival falls outside their window are set
//!    aside; if that leaves nothing, the plain nearest candidate is taken;
//! 2. among the rest, the highest tier having a candidate within the detour
//!    bound of the nearest one wins, and its closest candidate is chosen.

use tracing::debug;

use super::{assemble, candidates, nearest, ConstraintConfig, Position};
use crate::error::TourError;
use crate::services::matrix::DistanceMatrix;
use crate::types::time_format::minutes_of_day;
use crate::types::{Coordinates, DeliveryPoint, Priority, ScheduleParams, TimeWindow};

/// Priority and time-window aware variant of [`super::optimize_simple`].
///
/// Output shape is the same: every located stop once, `order` = 1..N,
/// `distance` = cost of the leg that reached it. Never leaves a stop out
/// because of its window.
pub fn optimize_with_constraints(
    points: Vec<DeliveryPoint>,
    start: Coordinates,
    matrix: &DistanceMatrix,
    config: &ConstraintConfig,
    schedule: &ScheduleParams,
) -> Result<Vec<DeliveryPoint>, TourError> {
    matrix.ensure_stop_count(points.len())?;

    let tiers: Vec<Priority> = points.iter().map(DeliveryPoint::priority).collect();
    let windows: Vec<Option<TimeWindow>> = points
        .iter()
        .map(|p| p.time_window(config.express_deadline))
        .collect();

    let start_minute = minutes_of_day(schedule.start_time());
    let mut elapsed_minutes = 0.0;

    let mut remaining = candidates(&points, matrix);
    let mut position = Position::start(matrix, start);
    let mut visits = Vec::with_capacity(remaining.len());
    let mut window_fallbacks = 0usize;
    let mut priority_overrides = 0usize;

    while !remaining.is_empty() {
        let costs: Vec<f64> = remaining.iter().map(|c| position.cost_to(matrix, c)).collect();
        let all: Vec<usize> = (0..remaining.len()).collect();

        let feasible: Vec<usize> = if config.respect_time_windows {
            all.iter()
                .copied()
                .filter(|&k| {
                    let arrival = start_minute + elapsed_minutes + schedule.travel_minutes(costs[k]);
                    window_allows(windows[remaining[k].index], arrival)
                })
                .collect()
        } else {
            all.clone()
        };

        let pick = if feasible.is_empty() {
            window_fallbacks += 1;
            nearest(&all, &costs)
        } else {
            let tier_of = |k: usize| tiers[remaining[k].index];
            let pick = select_by_tier(&feasible, &costs, tier_of, config);
            if pick.is_some() && pick != nearest(&feasible, &costs) {
                priority_overrides += 1;
            }
            pick
        };

        let Some(pick) = pick else {
            break;
        };

        let chosen = remaining.remove(pick);
        let cost = costs[pick];
        elapsed_minutes += schedule.travel_minutes(cost) + schedule.stop_time_minutes();
        visits.push((chosen.index, cost));
        position = Position::at(&chosen);
    }

    debug!(
        "Constrained ordering: {} stops, {} priority overrides, {} window fallbacks",
        visits.len(),
        priority_overrides,
        window_fallbacks
    );

    Ok(assemble(points, &visits))
}

/// Highest tier with a candidate inside the detour bound; its closest candidate
fn select_by_tier<F>(pool: &[usize], costs: &[f64], tier_of: F, config: &ConstraintConfig) -> Option<usize>
where
    F: Fn(usize) -> Priority,
{
    let closest = nearest(pool, costs)?;
    let bound = config.detour_bound(costs[closest]);

    let within: Vec<usize> = pool.iter().copied().filter(|&k| costs[k] <= bound).collect();
    let best_tier = within.iter().map(|&k| tier_of(k)).max()?;
    let tier_pool: Vec<usize> = within.into_iter().filter(|&k| tier_of(k) == best_tier).collect();

    nearest(&tier_pool, costs)
}

/// No window, or arrival (minutes since the tour day's midnight) inside it
fn window_allows(window: Option<TimeWindow>, arrival_minute: f64) -> bool {
    window.map_or(true, |w| w.contains_minute(arrival_minute))
}
