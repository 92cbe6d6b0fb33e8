//! Nearest-candidate lookup.
//!
//! Candidates are projected into a planar frame and stored in an R-tree;
//! queries rank by Euclidean distance in that frame, never by raw lat/lng.

mod area;
mod index;
mod projection;

pub use area::{SearchArea, MAX_SEARCH_RADIUS_M};
pub use index::CandidateIndex;
pub use projection::{Projection, WebMercator, MAX_MERCATOR_LAT};
