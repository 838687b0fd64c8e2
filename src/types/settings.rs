//! Route settings and depot types

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::time_format::parse_hhmm;
use super::Coordinates;
use crate::defaults;
use crate::error::TourError;

/// Depot (fixed start/end point of every tour)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Depot {
    pub name: String,
    pub coordinates: Coordinates,
}

/// The two depots framing a tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Depots {
    pub start: Depot,
    pub end: Depot,
}

impl Default for Depots {
    fn default() -> Self {
        Self {
            start: defaults::start_depot(),
            end: defaults::end_depot(),
        }
    }
}

/// Per-driver route settings, as stored by the settings store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteSettings {
    /// Dwell time per stop
    pub stop_time_minutes: f64,
    /// Departure time from the start depot, "HH:MM"
    pub start_time: String,
    pub average_speed_kmh: f64,
    pub return_to_depot: bool,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            stop_time_minutes: defaults::DEFAULT_STOP_TIME_MINUTES,
            start_time: defaults::DEFAULT_START_TIME.to_string(),
            average_speed_kmh: defaults::DEFAULT_AVERAGE_SPEED_KMH,
            return_to_depot: true,
        }
    }
}

impl RouteSettings {
    /// Validate settings before any optimization starts
    pub fn validate(&self) -> Result<ScheduleParams, TourError> {
        if self.start_time.trim().is_empty() {
            return Err(TourError::InvalidSettings("start time is empty".to_string()));
        }
        let start_time = parse_hhmm(&self.start_time).ok_or_else(|| {
            TourError::InvalidSettings(format!("start time '{}' is not HH:MM", self.start_time))
        })?;

        if !self.average_speed_kmh.is_finite() || self.average_speed_kmh < defaults::MIN_AVERAGE_SPEED_KMH {
            return Err(TourError::InvalidSettings(format!(
                "average speed must be at least {} km/h (got {} km/h)",
                defaults::MIN_AVERAGE_SPEED_KMH,
                self.average_speed_kmh
            )));
        }

        if !self.stop_time_minutes.is_finite() || self.stop_time_minutes < 0.0 {
            return Err(TourError::InvalidSettings(format!(
                "stop time must be zero or more minutes (got {})",
                self.stop_time_minutes
            )));
        }

        Ok(ScheduleParams {
            start_time,
            stop_time_minutes: self.stop_time_minutes,
            average_speed_kmh: self.average_speed_kmh,
            return_to_depot: self.return_to_depot,
        })
    }
}

/// Validated scheduling parameters. Only obtainable through [`RouteSettings::validate`],
/// so the speed is finite and at least [`defaults::MIN_AVERAGE_SPEED_KMH`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleParams {
    start_time: NaiveTime,
    stop_time_minutes: f64,
    average_speed_kmh: f64,
    return_to_depot: bool,
}

impl ScheduleParams {
    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn stop_time_minutes(&self) -> f64 {
        self.stop_time_minutes
    }

    pub fn average_speed_kmh(&self) -> f64 {
        self.average_speed_kmh
    }

    pub fn return_to_depot(&self) -> bool {
        self.return_to_depot
    }

    /// Driving minutes for a distance at the configured speed
    pub fn travel_minutes(&self, distance_km: f64) -> f64 {
        distance_km / self.average_speed_kmh * 60.0
    }
}
