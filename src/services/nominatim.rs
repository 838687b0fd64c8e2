//! Nominatim geocoding client

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::Coordinates;

/// Nominatim API response
#[derive(Debug, Deserialize)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

/// Nominatim geocoding client
pub struct NominatimClient {
    base_url: String,
    client: reqwest::Client,
}

impl NominatimClient {
    /// Create a new client. `timeout` bounds every request.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("TourOptimizer/0.2 (last-mile delivery)")
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn search_url(&self, full_address: &str) -> String {
        format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(full_address)
        )
    }

    /// Geocode a free-text address to coordinates
    pub async fn geocode(&self, full_address: &str) -> Result<Option<(Coordinates, String)>> {
        let response = self.client
            .get(self.search_url(full_address))
            .send()
            .await
            .context("Failed to send geocoding request")?;

        ensure_success(response.status())?;

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        match results.into_iter().next() {
            Some(result) => {
                let lat: f64 = result.lat.parse().context("Invalid latitude")?;
                let lng: f64 = result.lon.parse().context("Invalid longitude")?;
                Ok(Some((Coordinates { lat, lng }, result.display_name)))
            }
            None => Ok(None),
        }
    }
}

/// Non-2xx answers (429, 5xx, ...) are service failures, not "no result"
fn ensure_success(status: reqwest::StatusCode) -> Result<()> {
    if !status.is_success() {
        anyhow::bail!("Nominatim returned HTTP {}", status);
    }
    Ok(())
}
