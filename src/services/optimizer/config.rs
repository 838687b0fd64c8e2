//! Constrained optimizer configuration

use chrono::NaiveTime;

use crate::config::Config;
use crate::defaults;

/// Tuning of the priority/time-window aware optimizer
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintConfig {
    /// A higher-tier stop overrides the nearest one only while its cost is
    /// within `detour_factor * nearest + detour_slack_km`
    pub detour_factor: f64,
    /// Absolute allowance (km), so an override stays possible when the nearest stop is next door
    pub detour_slack_km: f64,
    /// Latest arrival for `express_midi` packages
    pub express_deadline: NaiveTime,
    /// Exclude candidates whose projected arrival falls outside their window
    pub respect_time_windows: bool,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            detour_factor: defaults::DEFAULT_PRIORITY_DETOUR_FACTOR,
            detour_slack_km: defaults::DEFAULT_PRIORITY_DETOUR_SLACK_KM,
            express_deadline: defaults::default_express_deadline(),
            respect_time_windows: true,
        }
    }
}

impl ConstraintConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            detour_factor: config.priority_detour_factor,
            detour_slack_km: config.priority_detour_slack_km,
            ..Default::default()
        }
    }

    /// Priority only breaks exact distance ties
    pub fn geography_first() -> Self {
        Self {
            detour_factor: 1.0,
            detour_slack_km: 0.0,
            ..Default::default()
        }
    }

    /// Higher tiers always go first, whatever the detour
    pub fn priority_first() -> Self {
        Self {
            detour_factor: f64::INFINITY,
            detour_slack_km: 0.0,
            ..Default::default()
        }
    }

    /// Largest cost a higher-tier candidate may have to override the nearest one
    pub fn detour_bound(&self, nearest_cost: f64) -> f64 {
        if self.detour_factor.is_infinite() {
            return f64::INFINITY;
        }
        nearest_cost * self.detour_factor + self.detour_slack_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConstraintConfig::default();
        assert_eq!(config.detour_factor, 5.0);
        assert_eq!(config.detour_slack_km, 0.5);
        assert_eq!(config.express_deadline, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert!(config.respect_time_windows);
    }

    #[test]
    fn test_detour_bound() {
        let config = ConstraintConfig::default();
        assert!((config.detour_bound(0.5) - 3.0).abs() < 1e-9);
        assert!((config.detour_bound(0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ConstraintConfig::geography_first().detour_bound(2.0), 2.0);
        assert!(ConstraintConfig::priority_first().detour_bound(0.0).is_infinite());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.priority_detour_factor = 2.0;
        config.priority_detour_slack_km = 1.0;
        let constraints = ConstraintConfig::from_config(&config);
        assert_eq!(constraints.detour_bound(1.0), 3.0);
    }
}
