//! Time projection for an ordered route.
//!
//! Walks the stops in order and stamps each one with its projected arrival.
//! Arrival reflects travel only; dwell is consumed after the arrival is
//! recorded. All arithmetic stays in fractional minutes and is rounded to
//! the minute only when formatted. Clock labels count from the start day's
//! midnight and do not wrap ("24:20" is 00:20 the next day).

use crate::types::time_format::{format_clock_after, format_duration_hhmm, format_hhmm};
use crate::types::{DeliveryPoint, ScheduleParams};

/// Route with arrivals filled in, plus its aggregate timing
#[derive(Debug, Clone, PartialEq)]
pub struct TimeProjection {
    /// Input stops in the same order, `estimated_time` set
    pub stops: Vec<DeliveryPoint>,
    /// Elapsed minutes from departure to end, full precision
    pub total_minutes: f64,
    /// Elapsed duration, "HH:MM"
    pub total_time: String,
    /// Clock time at the end of the tour, "HH:MM", unwrapped past midnight
    pub end_time: String,
    /// Return leg included in the totals, when returning to depot
    pub return_distance_km: Option<f64>,
}

/// Project arrival times along `route`.
///
/// `return_leg_km` is the distance from the last stop to the end depot; it is
/// driven (no dwell) only when the settings ask for a return to depot and the
/// route is not empty.
pub fn project_times(
    mut route: Vec<DeliveryPoint>,
    schedule: &ScheduleParams,
    return_leg_km: Option<f64>,
) -> TimeProjection {
    let start = schedule.start_time();

    if route.is_empty() {
        return TimeProjection {
            stops: route,
            total_minutes: 0.0,
            total_time: format_duration_hhmm(0.0),
            end_time: format_hhmm(start),
            return_distance_km: None,
        };
    }

    let mut elapsed_minutes = 0.0;
    for stop in route.iter_mut() {
        elapsed_minutes += schedule.travel_minutes(stop.distance);
        stop.estimated_time = Some(format_clock_after(start, elapsed_minutes));
        elapsed_minutes += schedule.stop_time_minutes();
    }

    let return_distance_km = match return_leg_km {
        Some(km) if schedule.return_to_depot() => {
            elapsed_minutes += schedule.travel_minutes(km);
            Some(km)
        }
        _ => None,
    };

    TimeProjection {
        stops: route,
        total_minutes: elapsed_minutes,
        total_time: format_duration_hhmm(elapsed_minutes),
        end_time: format_clock_after(start, elapsed_minutes),
        return_distance_km,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, Package, RouteSettings};
    use uuid::Uuid;

    /// Minutes since the start day's midnight for an unwrapped "HH:MM" label
    fn label_minutes(label: &str) -> u64 {
        let (h, m) = label.split_once(':').unwrap();
        h.parse::<u64>().unwrap() * 60 + m.parse::<u64>().unwrap()
    }

    fn params(start: &str, return_to_depot: bool) -> ScheduleParams {
        RouteSettings {
            stop_time_minutes: 5.0,
            start_time: start.to_string(),
            average_speed_kmh: 30.0,
            return_to_depot,
        }
        .validate()
        .unwrap()
    }

    fn stop(order: u32, distance: f64) -> DeliveryPoint {
        let address = Address::new("3", "Avenue de Chevêne", "74000", "Annecy", "France");
        DeliveryPoint {
            id: Uuid::new_v4(),
            address: address.clone(),
            packages: vec![Package::new(format!("pkg-{}", order), address)],
            order,
            distance,
            estimated_time: None,
        }
    }

    #[test]
    fn test_scenario_single_stop() {
        let projection = project_times(vec![stop(1, 3.0)], &params("08:00", false), None);

        assert_eq!(projection.stops[0].estimated_time.as_deref(), Some("08:06"));
        assert_eq!(projection.end_time, "08:11");
        assert_eq!(projection.total_time, "00:11");
        assert!(projection.return_distance_km.is_none());
    }

    #[test]
    fn test_return_leg_added_without_dwell() {
        let projection = project_times(vec![stop(1, 3.0)], &params("08:00", true), Some(2.0));

        // 6 travel + 5 dwell + 4 return
        assert_eq!(projection.end_time, "08:15");
        assert_eq!(projection.total_time, "00:15");
        assert_eq!(projection.return_distance_km, Some(2.0));
    }

    #[test]
    fn test_return_leg_ignored_when_not_returning() {
        let projection = project_times(vec![stop(1, 3.0)], &params("08:00", false), Some(2.0));
        assert_eq!(projection.end_time, "08:11");
        assert!(projection.return_distance_km.is_none());
    }

    #[test]
    fn test_empty_route() {
        let projection = project_times(vec![], &params("07:45", true), Some(3.0));
        assert!(projection.stops.is_empty());
        assert_eq!(projection.total_time, "00:00");
        assert_eq!(projection.end_time, "07:45");
        assert!(projection.return_distance_km.is_none());
    }

    #[test]
    fn test_arrivals_non_decreasing() {
        let route = vec![stop(1, 1.2), stop(2, 0.0), stop(3, 7.5), stop(4, 0.4)];
        let projection = project_times(route, &params("08:00", false), None);

        let times: Vec<u64> = projection
            .stops
            .iter()
            .map(|s| label_minutes(s.estimated_time.as_deref().unwrap()))
            .collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_keeps_precision_between_stops() {
        // 0.25 km at 30 km/h = 0.5 min per leg; rounding each leg would drift
        let route: Vec<DeliveryPoint> = (1..=4).map(|i| stop(i, 0.25)).collect();
        let settings = RouteSettings {
            stop_time_minutes: 0.0,
            start_time: "08:00".to_string(),
            average_speed_kmh: 30.0,
            return_to_depot: false,
        };
        let projection = project_times(route, &settings.validate().unwrap(), None);

        assert!((projection.total_minutes - 2.0).abs() < 1e-9);
        assert_eq!(projection.end_time, "08:02");
    }

    #[test]
    fn test_labels_keep_counting_past_midnight() {
        let route = vec![stop(1, 5.0), stop(2, 15.0), stop(3, 2.0)];
        let projection = project_times(route, &params("23:40", false), None);

        let labels: Vec<&str> = projection.stops.iter().map(|s| s.estimated_time.as_deref().unwrap()).collect();
        assert_eq!(labels, vec!["23:50", "24:25", "24:34"]);
        assert_eq!(projection.end_time, "24:39");
        assert_eq!(projection.total_time, "00:59");
    }

    #[test]
    fn test_extreme_distance_does_not_panic() {
        let projection = project_times(vec![stop(1, 1e300)], &params("08:00", true), Some(f64::MAX));
        assert!(projection.stops[0].estimated_time.is_some());
        assert!(!projection.end_time.is_empty());
    }
}
