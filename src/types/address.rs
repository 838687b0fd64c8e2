//! Address and coordinate types

use serde::{Deserialize, Serialize};

use crate::error::TourError;

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting values outside the WGS84 range
    pub fn new(lat: f64, lng: f64) -> Result<Self, TourError> {
        let coords = Self { lat, lng };
        if coords.is_valid() {
            Ok(coords)
        } else {
            Err(TourError::InvalidCoordinates { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Postal address of a delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street_number: String,
    pub street_name: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    /// Precomputed display string
    pub full_address: String,
    /// Coordinates (from geocoding), absent until resolved
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl Address {
    /// Build an address and its display string
    pub fn new(
        street_number: impl Into<String>,
        street_name: impl Into<String>,
        postal_code: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        let mut address = Self {
            street_number: street_number.into(),
            street_name: street_name.into(),
            postal_code: postal_code.into(),
            city: city.into(),
            country: country.into(),
            full_address: String::new(),
            coordinates: None,
        };
        address.full_address = crate::services::address::format_address(&address);
        address
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Coordinates usable for optimization (present and in range)
    pub fn located(&self) -> Option<Coordinates> {
        self.coordinates.filter(Coordinates::is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_range() {
        assert!(Coordinates::new(45.90, 6.15).is_ok());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_coordinates_out_of_range() {
        assert_eq!(
            Coordinates::new(91.0, 6.0),
            Err(TourError::InvalidCoordinates { lat: 91.0, lng: 6.0 })
        );
        assert!(Coordinates::new(45.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_address_new_builds_full_address() {
        let address = Address::new("12", "Rue Royale", "74000", "Annecy", "France");
        assert_eq!(address.full_address, "12 Rue Royale, 74000 Annecy, France");
        assert!(address.located().is_none());
    }

    #[test]
    fn test_located_ignores_invalid_coordinates() {
        let address = Address::new("1", "Quai", "74000", "Annecy", "France")
            .with_coordinates(Coordinates { lat: 120.0, lng: 6.0 });
        assert!(address.located().is_none());
    }

    #[test]
    fn test_address_deserializes_without_coordinates() {
        let json = r#"{
            "streetNumber": "3",
            "streetName": "Avenue de Genève",
            "postalCode": "74000",
            "city": "Annecy",
            "country": "France",
            "fullAddress": "3 Avenue de Genève, 74000 Annecy, France"
        }"#;
        let address: Address = serde_json::from_str(json).unwrap();
        assert!(address.coordinates.is_none());
        assert_eq!(address.street_name, "Avenue de Genève");
    }
}
