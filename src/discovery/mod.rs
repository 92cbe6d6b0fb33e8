//! Candidate discovery through a paginated places service.

mod client;
mod google;
mod paginate;

pub use client::{
    DiscoveryClient, PlaceGeometry, PlaceLocation, PlaceRecord, PlacesPage, PlacesQuery,
};
pub use google::GooglePlacesClient;
pub use paginate::{discover_candidates, DiscoveryOptions};
