//! Batch resolution of every sample in a run.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{error, info, warn};

use super::RateLimiter;
use crate::error::{AbortReason, RunError, TransportError};
use crate::geometry::CandidateIndex;
use crate::models::{Candidate, ResultRecord, RouteResult, SampleOutcome, SampleRecord};
use crate::routing::{RouteResolver, RoutingClient, MAX_DESTINATIONS};

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Nearest candidates sent to the routing service per sample.
    pub k: usize,
    /// Samples resolved concurrently.
    pub concurrency: usize,
    /// Minimum spacing between routing calls across all workers.
    pub min_request_interval: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Consecutive errored samples that cancel the run.
    pub max_consecutive_failures: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            k: 10,
            concurrency: 4,
            min_request_interval: Duration::from_millis(100),
            max_attempts: 2,
            retry_delay: Duration::from_secs(2),
            max_consecutive_failures: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub resolved: usize,
    pub unresolved: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.outcome {
                SampleOutcome::Resolved { .. } => summary.resolved += 1,
                SampleOutcome::Unresolved => summary.unresolved += 1,
                SampleOutcome::Errored { .. } => summary.errored += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.resolved + self.unresolved + self.errored
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples: {} resolved, {} unresolved, {} errored",
            self.total(),
            self.resolved,
            self.unresolved,
            self.errored
        )
    }
}

/// Records in input order plus their summary.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: Vec<ResultRecord>,
    pub summary: RunSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Cooperative cancellation for a run. Samples already in flight finish;
/// no new routing calls are started. Once cancelled, stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolves samples against a fixed candidate set with bounded concurrency
/// and a shared request budget.
pub struct BatchOrchestrator {
    index: Arc<CandidateIndex>,
    resolver: RouteResolver,
    limiter: Arc<RateLimiter>,
    options: RunOptions,
    cancel: CancelHandle,
    progress: Option<ProgressBar>,
}

impl BatchOrchestrator {
    pub fn new(
        candidates: Vec<Candidate>,
        client: Arc<dyn RoutingClient>,
        options: RunOptions,
    ) -> Self {
        Self::with_index(Arc::new(CandidateIndex::build(candidates)), client, options)
    }

    pub fn with_index(
        index: Arc<CandidateIndex>,
        client: Arc<dyn RoutingClient>,
        options: RunOptions,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(options.min_request_interval));
        Self {
            index,
            resolver: RouteResolver::new(client),
            limiter,
            options,
            cancel: CancelHandle::default(),
            progress: None,
        }
    }

    /// Advance `progress` by one per finished sample.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn index(&self) -> &CandidateIndex {
        &self.index
    }

    /// Resolve every sample. Output order always matches `samples`.
    ///
    /// Transport failures are recorded against their sample. The run is
    /// aborted only when `max_consecutive_failures` samples in a row error
    /// out, or when cancelled; the error then carries the records produced
    /// so far.
    pub async fn run(&self, samples: &[SampleRecord]) -> Result<RunReport, RunError> {
        let started_at = Utc::now();
        let total = samples.len();
        let k = self.options.k.clamp(1, MAX_DESTINATIONS);
        let concurrency = self.options.concurrency.max(1);

        info!(
            "Resolving {} samples against {} candidates (k={}, concurrency={})",
            total,
            self.index.len(),
            k,
            concurrency
        );

        let consecutive_failures = AtomicUsize::new(0);
        let escalated = AtomicBool::new(false);

        let mut slots: Vec<Option<ResultRecord>> = vec![None; total];

        let mut outcomes = stream::iter(samples.iter().enumerate())
            .map(|(position, sample)| {
                let consecutive_failures = &consecutive_failures;
                let escalated = &escalated;
                async move {
                    if self.cancel.is_cancelled() {
                        return (position, None);
                    }

                    let outcome = match self.resolve_sample(sample, k).await {
                        Some(outcome) => outcome,
                        None => return (position, None),
                    };

                    if let SampleOutcome::Errored { .. } = outcome {
                        let failures = consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                        if failures >= self.options.max_consecutive_failures
                            && !escalated.swap(true, Ordering::SeqCst)
                        {
                            error!(
                                "{} consecutive transport failures, cancelling run",
                                failures
                            );
                            self.cancel.cancel();
                        }
                    } else {
                        consecutive_failures.store(0, Ordering::SeqCst);
                    }

                    if let Some(pb) = &self.progress {
                        pb.inc(1);
                    }

                    (
                        position,
                        Some(ResultRecord {
                            sample: *sample,
                            outcome,
                        }),
                    )
                }
            })
            .buffer_unordered(concurrency);

        while let Some((position, record)) = outcomes.next().await {
            slots[position] = record;
        }

        let records: Vec<ResultRecord> = slots.into_iter().flatten().collect();
        let summary = RunSummary::from_records(&records);
        let report = RunReport {
            records,
            summary,
            started_at,
            finished_at: Utc::now(),
        };

        info!("Run finished: {}", summary);

        if report.records.len() < total {
            let reason = if escalated.load(Ordering::SeqCst) {
                AbortReason::ConsecutiveFailures(self.options.max_consecutive_failures)
            } else {
                AbortReason::Cancelled
            };
            return Err(RunError::Aborted {
                reason,
                total,
                report: Box::new(report),
            });
        }

        Ok(report)
    }

    /// `None` when the run was cancelled before this sample's routing call
    /// went out.
    async fn resolve_sample(&self, sample: &SampleRecord, k: usize) -> Option<SampleOutcome> {
        let nearest = self.index.nearest(&sample.point, k);
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if !nearest.is_empty() {
                self.limiter.acquire().await;
                // cancellation may have fired while queued on the limiter
                if self.cancel.is_cancelled() {
                    return None;
                }
            }

            match self.resolver.resolve(&sample.point, &nearest).await {
                Ok(RouteResult::Resolved {
                    candidate_id,
                    candidate_position,
                    distance_meters,
                    duration_seconds,
                }) => {
                    let outcome = match nearest.get(candidate_position) {
                        Some(candidate) => SampleOutcome::Resolved {
                            candidate: Arc::clone(candidate),
                            distance_meters,
                            duration_seconds,
                        },
                        None => SampleOutcome::Errored {
                            message: format!("route to unknown candidate {}", candidate_id),
                        },
                    };
                    return Some(outcome);
                }
                Ok(RouteResult::Unresolved) => return Some(SampleOutcome::Unresolved),
                Err(e) if self.should_retry(&e, attempt, max_attempts) => {
                    warn!(
                        "Sample {} failed (attempt {}/{}): {}",
                        sample.index, attempt, max_attempts, e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.options.retry_delay).await;
                }
                Err(e) => {
                    warn!("Sample {} errored: {}", sample.index, e);
                    return Some(SampleOutcome::Errored {
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    fn should_retry(&self, error: &TransportError, attempt: u32, max_attempts: u32) -> bool {
        attempt < max_attempts && error.is_retryable() && !self.cancel.is_cancelled()
    }
}

/// One-shot convenience: build the index and resolve `samples`.
pub async fn run_batch(
    samples: &[SampleRecord],
    candidates: Vec<Candidate>,
    client: Arc<dyn RoutingClient>,
    options: RunOptions,
) -> Result<RunReport, RunError> {
    BatchOrchestrator::new(candidates, client, options)
        .run(samples)
        .await
}
