//! Core data models for the accessibility pipeline.

pub mod candidate;
pub mod point;
pub mod record;

pub use candidate::Candidate;
pub use point::Point;
pub use record::{OutcomeStatus, OutputRow, ResultRecord, RouteResult, SampleOutcome, SampleRecord};
