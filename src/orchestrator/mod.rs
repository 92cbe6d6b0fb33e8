//! Batch orchestration: bounded-concurrency resolution of all samples with a
//! shared request budget, partial-failure recording and cancellation.

mod rate_limit;
mod run;

pub use rate_limit::RateLimiter;
pub use run::{run_batch, BatchOrchestrator, CancelHandle, RunOptions, RunReport, RunSummary};
