//! Routing service for distance matrix calculations
//!
//! Uses Valhalla when configured, great-circle distances otherwise.

mod valhalla;

pub use valhalla::{ValhallaClient, ValhallaConfig};

use anyhow::Result;
use async_trait::async_trait;

use crate::services::matrix::{build_matrix, DistanceMatrix};
use crate::types::Coordinates;

/// Routing service trait for abstraction (Valhalla, haversine, etc.)
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Get the distance matrix (km) for a list of locations.
    /// Locations follow the matrix index convention: start depot, stops, end depot.
    async fn get_matrix(&self, locations: &[Coordinates]) -> Result<DistanceMatrix>;

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Great-circle routing. Always available, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineRoutingService;

impl HaversineRoutingService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RoutingService for HaversineRoutingService {
    async fn get_matrix(&self, locations: &[Coordinates]) -> Result<DistanceMatrix> {
        Ok(build_matrix(locations)?)
    }

    fn name(&self) -> &str {
        "Haversine"
    }
}

/// Create routing service with automatic Valhalla detection and fallback
///
/// Tries to connect to Valhalla if URL is provided. Falls back to haversine
/// routing if Valhalla is unavailable or URL is not configured.
pub async fn create_routing_service_with_fallback(
    valhalla_url: Option<String>,
) -> Box<dyn RoutingService> {
    use tracing::{info, warn};

    if let Some(url) = valhalla_url {
        let config = ValhallaConfig::new(&url);
        let client = ValhallaClient::new(config);

        match check_valhalla_health(&url).await {
            Ok(()) => {
                info!("Valhalla routing service available at {}", url);
                return Box::new(client);
            }
            Err(e) => {
                warn!("Valhalla not available at {}: {}. Falling back to haversine routing.", url, e);
            }
        }
    }

    info!("Using haversine routing service (Valhalla not configured or unavailable)");
    Box::new(HaversineRoutingService::new())
}

/// Check if Valhalla is healthy by making a simple status request
async fn check_valhalla_health(base_url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;

    let url = format!("{}/status", base_url);
    let response = client.get(&url).send().await?;

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("Valhalla returned status {}", response.status())
    }
}
