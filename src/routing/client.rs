//! Capability interface for distance-matrix routing services.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::Point;

/// Destination limit per request imposed by the routing service.
pub const MAX_DESTINATIONS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelMode {
    #[default]
    Driving,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
        }
    }
}

/// WGS84 coordinate as sent over the wire. Only constructible from the
/// geographic half of a [`Point`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// `lat,lng` as expected by the service query string.
    pub fn to_param(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl From<&Point> for LatLng {
    fn from(p: &Point) -> Self {
        Self {
            lat: p.lat,
            lng: p.lon,
        }
    }
}

/// One origin to many destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRequest {
    pub origin: LatLng,
    pub destinations: Vec<LatLng>,
    pub mode: TravelMode,
}

/// Per-destination status reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementStatus {
    NotFound,
    ZeroResults,
    MaxRouteLengthExceeded,
    Other(String),
}

impl ElementStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "NOT_FOUND" => ElementStatus::NotFound,
            "ZERO_RESULTS" => ElementStatus::ZeroResults,
            "MAX_ROUTE_LENGTH_EXCEEDED" => ElementStatus::MaxRouteLengthExceeded,
            other => ElementStatus::Other(other.to_string()),
        }
    }
}

/// Outcome for a single destination. Destinations fail independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixElement {
    Route {
        duration_seconds: u64,
        distance_meters: u64,
    },
    Failed(ElementStatus),
}

/// Elements are in destination order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatrixResponse {
    pub elements: Vec<MatrixElement>,
}

#[async_trait]
pub trait RoutingClient: Send + Sync {
    /// Issue one batched query. Per-destination failures are reported in the
    /// response; only whole-call failures are errors.
    async fn distance_matrix(
        &self,
        request: &MatrixRequest,
    ) -> Result<MatrixResponse, TransportError>;
}
