//! Route resolution against an external distance-matrix service.

mod client;
mod google;
mod resolver;

pub use client::{
    ElementStatus, LatLng, MatrixElement, MatrixRequest, MatrixResponse, RoutingClient,
    TravelMode, MAX_DESTINATIONS,
};
pub use google::GoogleDistanceMatrixClient;
pub use resolver::RouteResolver;
