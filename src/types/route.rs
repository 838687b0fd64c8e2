//! Tour request/response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeliveryPoint, Package, RouteSettings};

/// Input of one optimization request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourRequest {
    pub packages: Vec<Package>,
    #[serde(default)]
    pub settings: RouteSettings,
}

/// A stop left out of the route because its address could not be located
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedStop {
    pub stop_id: Uuid,
    pub address: String,
    pub reason: String,
}

/// Aggregate figures of an optimized tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSummary {
    /// Elapsed duration, "HH:MM"
    pub total_time: String,
    /// Sum of the per-stop distances (km), return leg excluded
    pub total_distance_km: f64,
    /// "HH:MM" clock time; hours keep counting past midnight ("24:20")
    pub end_time: String,
    /// Last stop to end depot (km), when returning to depot
    pub return_distance_km: Option<f64>,
    pub stop_count: usize,
    pub package_count: usize,
}

/// Optimized, time-annotated tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourResult {
    pub stops: Vec<DeliveryPoint>,
    pub summary: TourSummary,
    pub skipped: Vec<SkippedStop>,
    /// Optimizer used ("none" when there was nothing to order)
    pub strategy: String,
}

impl TourResult {
    /// Result for a request without pending packages
    pub fn empty(start_time: &str) -> Self {
        Self {
            stops: vec![],
            summary: TourSummary {
                total_time: "00:00".to_string(),
                total_distance_km: 0.0,
                end_time: start_time.trim().to_string(),
                return_distance_km: None,
                stop_count: 0,
                package_count: 0,
            },
            skipped: vec![],
            strategy: "none".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let result = TourResult::empty("08:00");
        assert!(result.stops.is_empty());
        assert_eq!(result.summary.total_time, "00:00");
        assert_eq!(result.summary.end_time, "08:00");
        assert_eq!(result.strategy, "none");
    }

    #[test]
    fn test_request_defaults_settings() {
        let request: TourRequest = serde_json::from_str(r#"{"packages": []}"#).unwrap();
        assert!(request.packages.is_empty());
        assert_eq!(request.settings, RouteSettings::default());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let json = serde_json::to_value(TourResult::empty("07:30").summary).unwrap();
        assert_eq!(json["totalTime"], "00:00");
        assert_eq!(json["endTime"], "07:30");
        assert!(json["returnDistanceKm"].is_null());
    }
}
