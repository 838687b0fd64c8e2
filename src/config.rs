//! Configuration management

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::defaults;
use crate::services::geocoding::{
    DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS, DEFAULT_CIRCUIT_BREAKER_THRESHOLD, DEFAULT_RATE_LIMIT_MS,
};
use crate::types::{Coordinates, Depot, Depots};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Nominatim API URL (for geocoding)
    pub nominatim_url: String,

    /// Valhalla routing engine URL (optional, falls back to haversine if unavailable)
    pub valhalla_url: Option<String>,

    /// "mock" or "nominatim"
    pub geocoder_backend: String,

    /// Upper bound for one geocoding lookup
    pub geocode_timeout: Duration,

    pub nominatim_rate_limit: Duration,
    pub nominatim_cb_threshold: u32,
    pub nominatim_cb_recovery: Duration,

    /// Priority override detour bound: `factor * nearest + slack_km`
    pub priority_detour_factor: f64,
    pub priority_detour_slack_km: f64,

    pub depots: Depots,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            valhalla_url: None,
            geocoder_backend: "mock".to_string(),
            geocode_timeout: Duration::from_millis(defaults::DEFAULT_GEOCODE_TIMEOUT_MS),
            nominatim_rate_limit: Duration::from_millis(DEFAULT_RATE_LIMIT_MS),
            nominatim_cb_threshold: DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
            nominatim_cb_recovery: Duration::from_secs(DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS),
            priority_detour_factor: defaults::DEFAULT_PRIORITY_DETOUR_FACTOR,
            priority_detour_slack_km: defaults::DEFAULT_PRIORITY_DETOUR_SLACK_KM,
            depots: Depots::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let nominatim_url = lookup("NOMINATIM_URL").unwrap_or(defaults.nominatim_url);
        let valhalla_url = lookup("VALHALLA_URL").filter(|url| !url.trim().is_empty());
        let geocoder_backend = lookup("GEOCODER_BACKEND").unwrap_or(defaults.geocoder_backend);

        let geocode_timeout_ms: u64 =
            parse_var(&lookup, "GEOCODE_TIMEOUT_MS", defaults::DEFAULT_GEOCODE_TIMEOUT_MS)?;
        if geocode_timeout_ms == 0 {
            anyhow::bail!("GEOCODE_TIMEOUT_MS must be greater than 0");
        }

        let rate_limit_ms: u64 = parse_var(&lookup, "NOMINATIM_RATE_LIMIT_MS", DEFAULT_RATE_LIMIT_MS)?;
        let cb_threshold: u32 =
            parse_var(&lookup, "NOMINATIM_CB_THRESHOLD", DEFAULT_CIRCUIT_BREAKER_THRESHOLD)?;
        let cb_recovery_secs: u64 = parse_var(
            &lookup,
            "NOMINATIM_CB_RECOVERY_SECS",
            DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS,
        )?;

        let priority_detour_factor: f64 =
            parse_var(&lookup, "PRIORITY_DETOUR_FACTOR", defaults.priority_detour_factor)?;
        if !priority_detour_factor.is_finite() || priority_detour_factor < 1.0 {
            anyhow::bail!("PRIORITY_DETOUR_FACTOR must be at least 1.0 (got {})", priority_detour_factor);
        }

        let priority_detour_slack_km: f64 =
            parse_var(&lookup, "PRIORITY_DETOUR_SLACK_KM", defaults.priority_detour_slack_km)?;
        if !priority_detour_slack_km.is_finite() || priority_detour_slack_km < 0.0 {
            anyhow::bail!("PRIORITY_DETOUR_SLACK_KM must not be negative (got {})", priority_detour_slack_km);
        }

        let depots = Depots {
            start: depot_from_vars(&lookup, "START_DEPOT", defaults.depots.start)?,
            end: depot_from_vars(&lookup, "END_DEPOT", defaults.depots.end)?,
        };

        Ok(Self {
            nominatim_url,
            valhalla_url,
            geocoder_backend,
            geocode_timeout: Duration::from_millis(geocode_timeout_ms),
            nominatim_rate_limit: Duration::from_millis(rate_limit_ms),
            nominatim_cb_threshold: cb_threshold,
            nominatim_cb_recovery: Duration::from_secs(cb_recovery_secs),
            priority_detour_factor,
            priority_detour_slack_km,
            depots,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Read `<PREFIX>_LAT`, `<PREFIX>_LNG` and `<PREFIX>_NAME`
fn depot_from_vars<F>(lookup: &F, prefix: &str, default: Depot) -> Result<Depot>
where
    F: Fn(&str) -> Option<String>,
{
    let lat = parse_var(lookup, &format!("{}_LAT", prefix), default.coordinates.lat)?;
    let lng = parse_var(lookup, &format!("{}_LNG", prefix), default.coordinates.lng)?;
    let name = lookup(&format!("{}_NAME", prefix)).unwrap_or(default.name);

    let coordinates = Coordinates::new(lat, lng)
        .with_context(|| format!("{} coordinates are out of range", prefix))?;

    Ok(Depot { name, coordinates })
}
