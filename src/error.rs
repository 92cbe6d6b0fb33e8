//! Error taxonomy for the accessibility pipeline.
//!
//! Configuration problems are fatal and surface before any processing.
//! Transport problems are per-sample and only the orchestrator may turn them
//! into a recorded outcome. "No route" is not an error at all, see
//! [`crate::models::RouteResult::Unresolved`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::orchestrator::RunReport;

/// Fatal configuration or input problems, raised before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API credential: set ${0}")]
    MissingCredential(String),
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {details}", .path.display())]
    Parse { path: PathBuf, details: String },
    #[error("k must be between 1 and {max}, got {k}")]
    InvalidK { k: usize, max: usize },
    #[error("invalid option '{name}': {reason}")]
    InvalidOption { name: &'static str, reason: String },
    #[error("sample index {0} appears more than once")]
    DuplicateSampleIndex(u64),
}

/// Failure of a call to an external service as a whole.
///
/// Per-destination failures are not transport errors; they are reported as
/// element statuses inside a successful response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service answered with HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("service rejected the batch with status {status}{}", suffix(.message))]
    BatchStatus {
        status: String,
        message: Option<String>,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("batch of {len} destinations exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },
}

impl TransportError {
    /// Whether a second attempt of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::BatchTooLarge { .. } => false,
            TransportError::BatchStatus { status, .. } => {
                !matches!(
                    status.as_str(),
                    "INVALID_REQUEST"
                        | "REQUEST_DENIED"
                        | "MAX_ELEMENTS_EXCEEDED"
                        | "MAX_DIMENSIONS_EXCEEDED"
                )
            }
            TransportError::Status(code) => {
                code.is_server_error() || *code == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            TransportError::Http(_) | TransportError::Malformed(_) => true,
        }
    }
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

/// Errors from the paginated places-discovery step.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("places service returned unrecognized status {status}")]
    Protocol { status: String },
}

/// Why a run stopped before every sample was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Too many samples in a row failed at the transport level.
    ConsecutiveFailures(usize),
    /// The run was cancelled through its [`crate::orchestrator::CancelHandle`].
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::ConsecutiveFailures(n) => {
                write!(f, "{} consecutive transport failures", n)
            }
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A run that did not complete. The report holds every record produced
/// before the stop, still in input order.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("run aborted after {} of {total} samples: {reason}", .report.records.len())]
    Aborted {
        reason: AbortReason,
        total: usize,
        report: Box<RunReport>,
    },
}
