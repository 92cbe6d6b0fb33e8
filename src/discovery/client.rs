//! Capability interface for paginated places discovery.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::TransportError;
use crate::models::{Candidate, Point};

/// Nearby search around a location.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacesQuery {
    pub location: Point,
    pub radius_m: f64,
    pub category: String,
}

/// One page of results as returned by the service. The status is left
/// uninterpreted here; the pagination driver decides what it means.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlacesPage {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<PlaceRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceRecord {
    pub place_id: String,
    pub name: Option<String>,
    pub vicinity: Option<String>,
    pub formatted_address: Option<String>,
    pub geometry: PlaceGeometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlaceGeometry {
    pub location: PlaceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlaceLocation {
    pub lat: f64,
    pub lng: f64,
}

impl PlaceRecord {
    /// Address prefers `vicinity` (nearby search) over `formatted_address`.
    pub fn into_candidate(self) -> Candidate {
        let address = self
            .vicinity
            .or(self.formatted_address)
            .unwrap_or_default();
        let location = Point::new(self.geometry.location.lng, self.geometry.location.lat);
        Candidate::new(
            self.place_id,
            self.name.unwrap_or_default(),
            address,
            location,
        )
    }
}

#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Fetch the first page (`page_token == None`) or a continuation page.
    async fn nearby(
        &self,
        query: &PlacesQuery,
        page_token: Option<&str>,
    ) -> Result<PlacesPage, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_to_candidate() {
        let json = r#"{
            "place_id": "ChIJ123",
            "name": "Hospital Central",
            "vicinity": "Cra 7 #1",
            "formatted_address": "Cra 7 #1, Bogota, Colombia",
            "geometry": {"location": {"lat": 4.6, "lng": -74.08}},
            "types": ["hospital", "health"]
        }"#;
        let place: PlaceRecord = serde_json::from_str(json).unwrap();
        let candidate = place.into_candidate();
        assert_eq!(candidate.id, "ChIJ123");
        assert_eq!(candidate.address, "Cra 7 #1");
        assert_eq!(candidate.lat, 4.6);
        assert_eq!(candidate.lon, -74.08);
    }

    #[test]
    fn test_address_fallback() {
        let json = r#"{
            "place_id": "x",
            "formatted_address": "Somewhere",
            "geometry": {"location": {"lat": 1.0, "lng": 2.0}}
        }"#;
        let candidate = serde_json::from_str::<PlaceRecord>(json)
            .unwrap()
            .into_candidate();
        assert_eq!(candidate.address, "Somewhere");
        assert_eq!(candidate.name, "");
    }
}
