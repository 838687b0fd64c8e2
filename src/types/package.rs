//! Package types

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::time_format::{format_hhmm, hhmm, minutes_of_day};
use super::Address;
use crate::error::TourError;

/// Recipient type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    Particulier,
    Entreprise,
}

/// Delivery urgency tier. Ordering is by urgency: `Standard < ExpressMidi < Premier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Standard,
    ExpressMidi,
    Premier,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Standard => "standard",
            Priority::ExpressMidi => "express_midi",
            Priority::Premier => "premier",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    #[default]
    Pending,
    Delivered,
    Failed,
}

/// Acceptable arrival interval for a package, within the tour's day.
///
/// `start <= end` always holds; inverted windows are rejected on construction
/// and when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    start: NaiveTime,
    #[serde(with = "hhmm")]
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    #[serde(with = "hhmm")]
    start: NaiveTime,
    #[serde(with = "hhmm")]
    end: NaiveTime,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = TourError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, TourError> {
        if start > end {
            return Err(TourError::InvalidTimeWindow {
                start: format_hhmm(start),
                end: format_hhmm(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Window ending at `end`, open since midnight
    pub fn until(end: NaiveTime) -> Self {
        Self { start: NaiveTime::MIN, end }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether an arrival `minute` minutes after the tour day's midnight falls
    /// inside the window. Arrivals past midnight (>= 1440) never match.
    pub fn contains_minute(&self, minute: f64) -> bool {
        minutes_of_day(self.start) <= minute && minute <= minutes_of_day(self.end)
    }

    /// Overlap of two windows. `None` when they are disjoint.
    pub fn intersect(&self, other: &TimeWindow) -> Option<TimeWindow> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(TimeWindow { start, end })
    }
}

/// A scanned package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub address: Address,
    /// Truck storage location label
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "type", default)]
    pub package_type: PackageType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: PackageStatus,
    #[serde(default)]
    pub delivery_status: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
}

impl Package {
    pub fn new(id: impl Into<String>, address: Address) -> Self {
        Self {
            id: id.into(),
            barcode: None,
            address,
            location: String::new(),
            notes: String::new(),
            package_type: PackageType::default(),
            priority: Priority::default(),
            status: PackageStatus::Pending,
            delivery_status: None,
            failure_reason: None,
            delivered_at: None,
            time_window: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == PackageStatus::Pending
    }

    pub fn mark_delivered(&mut self, at: DateTime<Utc>) {
        self.status = PackageStatus::Delivered;
        self.delivery_status = Some("delivered".to_string());
        self.failure_reason = None;
        self.delivered_at = Some(at);
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.status = PackageStatus::Failed;
        self.delivery_status = Some("failed".to_string());
        self.failure_reason = Some(reason.into());
        self.delivered_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn address() -> Address {
        Address::new("5", "Rue Sommeiller", "74000", "Annecy", "France")
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Premier > Priority::ExpressMidi);
        assert!(Priority::ExpressMidi > Priority::Standard);
    }

    #[test]
    fn test_priority_serde_names() {
        assert_eq!(serde_json::to_string(&Priority::ExpressMidi).unwrap(), "\"express_midi\"");
        let p: Priority = serde_json::from_str("\"premier\"").unwrap();
        assert_eq!(p, Priority::Premier);
    }

    #[test]
    fn test_package_deserializes_with_defaults() {
        let json = r#"{
            "id": "PKG-1",
            "address": {
                "streetNumber": "5", "streetName": "Rue Sommeiller", "postalCode": "74000",
                "city": "Annecy", "country": "France",
                "fullAddress": "5 Rue Sommeiller, 74000 Annecy, France"
            },
            "type": "entreprise",
            "timeWindow": { "start": "09:00", "end": "11:30" }
        }"#;
        let package: Package = serde_json::from_str(json).unwrap();
        assert_eq!(package.package_type, PackageType::Entreprise);
        assert_eq!(package.priority, Priority::Standard);
        assert_eq!(package.status, PackageStatus::Pending);
        assert_eq!(package.time_window, Some(TimeWindow::new(hm(9, 0), hm(11, 30)).unwrap()));
    }

    #[test]
    fn test_mark_delivered_then_failed() {
        let mut package = Package::new("PKG-2", address());
        let now = Utc::now();
        package.mark_delivered(now);
        assert_eq!(package.status, PackageStatus::Delivered);
        assert_eq!(package.delivered_at, Some(now));
        assert!(!package.is_pending());

        package.mark_failed("absent");
        assert_eq!(package.status, PackageStatus::Failed);
        assert_eq!(package.failure_reason.as_deref(), Some("absent"));
        assert!(package.delivered_at.is_none());
    }

    #[test]
    fn test_time_window_intersection() {
        let morning = TimeWindow::new(hm(8, 0), hm(12, 0)).unwrap();
        let late = TimeWindow::new(hm(10, 0), hm(14, 0)).unwrap();
        assert_eq!(morning.intersect(&late), TimeWindow::new(hm(10, 0), hm(12, 0)).ok());

        let afternoon = TimeWindow::new(hm(13, 0), hm(15, 0)).unwrap();
        assert_eq!(morning.intersect(&afternoon), None);
    }

    #[test]
    fn test_time_window_contains_minute() {
        let window = TimeWindow::new(hm(9, 0), hm(10, 0)).unwrap();
        assert!(window.contains_minute(540.0));
        assert!(window.contains_minute(600.0));
        assert!(!window.contains_minute(539.5));
        assert!(!window.contains_minute(600.5));

        let noon = TimeWindow::until(hm(12, 0));
        assert!(noon.contains_minute(0.0));
        // 09:00 on the following day
        assert!(!noon.contains_minute(1440.0 + 540.0));
    }

    #[test]
    fn test_inverted_time_window_rejected() {
        assert_eq!(
            TimeWindow::new(hm(14, 0), hm(9, 0)),
            Err(TourError::InvalidTimeWindow { start: "14:00".into(), end: "09:00".into() })
        );
        assert!(TimeWindow::new(hm(9, 0), hm(9, 0)).is_ok());

        let err = serde_json::from_str::<TimeWindow>(r#"{ "start": "14:00", "end": "09:00" }"#).unwrap_err();
        assert!(err.to_string().contains("14:00-09:00"), "got {}", err);
    }
}
