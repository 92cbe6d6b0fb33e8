//! Accessmap - travel-time accessibility to the nearest facilities
//!
//! This library provides the shared index, routing and orchestration layers
//! for the travel-times and discover binaries.

pub mod config;
pub mod discovery;
pub mod error;
pub mod geometry;
pub mod io;
pub mod models;
pub mod orchestrator;
pub mod routing;
pub mod testing;

pub use error::{AbortReason, ConfigError, DiscoveryError, RunError, TransportError};
pub use geometry::CandidateIndex;
pub use models::{Candidate, Point, ResultRecord, RouteResult, SampleOutcome, SampleRecord};
pub use orchestrator::{run_batch, BatchOrchestrator, RunOptions, RunReport};
pub use routing::RouteResolver;
