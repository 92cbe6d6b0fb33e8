//! Facilities eligible to be matched to a sample point.

use serde::{Deserialize, Serialize};

use super::Point;

/// A hospital (or other facility) loaded for one run.
///
/// Serialized with the column names of the candidates CSV
/// (`place_id,name,address,lat,lng`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "place_id")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    #[serde(rename = "lng")]
    pub lon: f64,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        location: Point,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            lat: location.lat,
            lon: location.lon,
        }
    }

    pub fn location(&self) -> Point {
        Point::new(self.lon, self.lat)
    }
}
