use chrono::NaiveTime;

use crate::types::{Coordinates, Depot};

pub const DEFAULT_STOP_TIME_MINUTES: f64 = 5.0;
pub const DEFAULT_START_TIME: &str = "08:00";
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;
/// Slowest accepted average speed
pub const MIN_AVERAGE_SPEED_KMH: f64 = 1.0;

/// A higher-tier stop may be chosen while its cost stays within
/// `factor * nearest + slack` kilometers.
pub const DEFAULT_PRIORITY_DETOUR_FACTOR: f64 = 5.0;
pub const DEFAULT_PRIORITY_DETOUR_SLACK_KM: f64 = 0.5;

pub const DEFAULT_GEOCODE_TIMEOUT_MS: u64 = 5000;

pub fn default_express_deadline() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).expect("valid static express deadline")
}

pub fn start_depot() -> Depot {
    Depot {
        name: "Dépôt Annecy Nord".to_string(),
        coordinates: Coordinates { lat: 45.9000, lng: 6.1500 },
    }
}

pub fn end_depot() -> Depot {
    Depot {
        name: "Dépôt Seynod".to_string(),
        coordinates: Coordinates { lat: 45.8850, lng: 6.1090 },
    }
}
