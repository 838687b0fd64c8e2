//! Valhalla routing engine client
//!
//! Valhalla API documentation:
//! https://valhalla.github.io/valhalla/api/matrix/api-reference/

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::RoutingService;
use crate::services::matrix::DistanceMatrix;
use crate::types::Coordinates;

/// Valhalla client configuration
#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    /// Base URL of Valhalla server (e.g., "http://localhost:8002")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Costing model ("auto" for delivery vans)
    pub costing: String,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_seconds: 30,
            costing: "auto".to_string(),
        }
    }
}

impl ValhallaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Valhalla routing client
pub struct ValhallaClient {
    client: Client,
    config: ValhallaConfig,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Build the sources_to_targets request
    fn build_matrix_request(&self, locations: &[Coordinates]) -> MatrixRequest {
        let locs: Vec<ValhallaLocation> = locations
            .iter()
            .map(|c| ValhallaLocation {
                lat: c.lat,
                lon: c.lng,
                // Geocoded building centroids can sit well off the road edge
                radius: Some(500),
            })
            .collect();

        MatrixRequest {
            sources: locs.clone(),
            targets: locs,
            costing: self.config.costing.clone(),
            units: "kilometers".to_string(),
        }
    }
}

/// Convert a sources_to_targets response into a km matrix.
/// Cells Valhalla could not route stay unavailable (infinite).
fn matrix_from_response(response: &MatrixResponse, n: usize) -> Result<DistanceMatrix> {
    if response.sources_to_targets.len() != n {
        anyhow::bail!(
            "Valhalla returned {} rows for {} locations",
            response.sources_to_targets.len(),
            n
        );
    }

    let mut costs = vec![vec![0.0; n]; n];
    for (i, row) in response.sources_to_targets.iter().enumerate() {
        if row.len() != n {
            anyhow::bail!("Valhalla row {} has {} cells, expected {}", i, row.len(), n);
        }
        for (j, cell) in row.iter().enumerate() {
            costs[i][j] = cell.distance.unwrap_or_else(|| {
                warn!("No distance for route {} -> {}", i, j);
                f64::INFINITY
            });
        }
    }

    Ok(DistanceMatrix::from_rows(costs)?)
}

#[async_trait]
impl RoutingService for ValhallaClient {
    async fn get_matrix(&self, locations: &[Coordinates]) -> Result<DistanceMatrix> {
        let n = locations.len();
        if n == 0 {
            return Ok(DistanceMatrix::from_rows(vec![])?);
        }

        let request = self.build_matrix_request(locations);
        let url = format!("{}/sources_to_targets", self.config.base_url);

        debug!("Requesting distance matrix from Valhalla for {} locations", n);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Valhalla")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Valhalla returned error {}: {}", status, body);
        }

        let matrix_response: MatrixResponse = response
            .json()
            .await
            .context("Failed to parse Valhalla response")?;

        let matrix = matrix_from_response(&matrix_response, n)?;
        debug!("Received distance matrix from Valhalla: {}x{}", n, n);

        Ok(matrix)
    }

    fn name(&self) -> &str {
        "Valhalla"
    }
}

// Valhalla API types

#[derive(Debug, Serialize)]
struct MatrixRequest {
    sources: Vec<ValhallaLocation>,
    targets: Vec<ValhallaLocation>,
    costing: String,
    units: String,
}

#[derive(Debug, Serialize, Clone)]
struct ValhallaLocation {
    lat: f64,
    lon: f64,
    /// Radius in meters for snapping to roads
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    sources_to_targets: Vec<Vec<MatrixCell>>,
}

#[derive(Debug, Deserialize)]
struct MatrixCell {
    /// Distance in kilometers (when units="kilometers")
    distance: Option<f64>,
}
