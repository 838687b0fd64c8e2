//! "HH:MM" wall-clock helpers shared by settings, windows and projections

use chrono::{NaiveTime, Timelike};

const HHMM: &str = "%H:%M";

/// Parse "HH:MM" (surrounding whitespace allowed)
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), HHMM).ok()
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format(HHMM).to_string()
}

/// Minutes since midnight
pub fn minutes_of_day(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64 / 60.0
}

/// Clock time `minutes` after `start`, rounded to the minute.
///
/// Not wrapped at midnight: 00:20 the next day reads "24:20".
pub fn format_clock_after(start: NaiveTime, minutes: f64) -> String {
    format_duration_hhmm(minutes_of_day(start) + minutes.max(0.0))
}

/// Format an elapsed duration as "HH:MM". Hours are not wrapped at 24.
pub fn format_duration_hhmm(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Serde adapter for `NaiveTime` as "HH:MM"
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("expected HH:MM, got '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("08:00"), NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(parse_hhmm(" 17:45 "), NaiveTime::from_hms_opt(17, 45, 0));
        assert_eq!(parse_hhmm(""), None);
        assert_eq!(parse_hhmm("25:00"), None);
        assert_eq!(parse_hhmm("8h00"), None);
    }

    #[test]
    fn test_format_duration_rounds_to_minute() {
        assert_eq!(format_duration_hhmm(0.0), "00:00");
        assert_eq!(format_duration_hhmm(11.4), "00:11");
        assert_eq!(format_duration_hhmm(89.6), "01:30");
        assert_eq!(format_duration_hhmm(25.0 * 60.0), "25:00");
    }

    #[test]
    fn test_format_clock_after_does_not_wrap() {
        let start = NaiveTime::from_hms_opt(23, 50, 0).unwrap();
        assert_eq!(format_clock_after(start, 0.0), "23:50");
        assert_eq!(format_clock_after(start, 29.6), "24:20");
        assert_eq!(minutes_of_day(start), 1430.0);
    }

    #[test]
    fn test_format_clock_after_huge_duration_saturates() {
        let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert!(!format_clock_after(start, 1e300).is_empty());
        assert!(!format_clock_after(start, f64::INFINITY).is_empty());
    }
}
