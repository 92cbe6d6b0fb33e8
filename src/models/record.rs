//! Per-sample inputs and outcomes.

use std::sync::Arc;

use serde::Serialize;

use super::{Candidate, Point};

/// One input location. `index` is the join key for downstream data and is
/// unique within a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub index: u64,
    pub point: Point,
}

impl SampleRecord {
    pub fn new(index: u64, point: Point) -> Self {
        Self { index, point }
    }
}

/// Result of resolving one sample against its nearest candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult {
    Resolved {
        candidate_id: String,
        /// Position of the chosen candidate in the list that was resolved.
        candidate_position: usize,
        distance_meters: u64,
        duration_seconds: u64,
    },
    /// No candidate produced a usable route.
    Unresolved,
}

impl RouteResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, RouteResult::Resolved { .. })
    }
}

/// What happened to a sample, joined with the matched candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Resolved {
        candidate: Arc<Candidate>,
        distance_meters: u64,
        duration_seconds: u64,
    },
    Unresolved,
    /// The routing call failed at the transport level after all retries.
    Errored { message: String },
}

impl SampleOutcome {
    pub fn status(&self) -> OutcomeStatus {
        match self {
            SampleOutcome::Resolved { .. } => OutcomeStatus::Resolved,
            SampleOutcome::Unresolved => OutcomeStatus::Unresolved,
            SampleOutcome::Errored { .. } => OutcomeStatus::Errored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Resolved,
    Unresolved,
    Errored,
}

/// A sample joined with its outcome. Written once to the output dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub sample: SampleRecord,
    pub outcome: SampleOutcome,
}

impl ResultRecord {
    pub fn to_row(&self) -> OutputRow<'_> {
        let mut row = OutputRow {
            sample_idx: self.sample.index,
            sample_lat: self.sample.point.lat,
            sample_lng: self.sample.point.lon,
            status: self.outcome.status(),
            place_id: None,
            hosp_name: None,
            hosp_addr: None,
            hosp_lat: None,
            hosp_lng: None,
            dist_m: None,
            dur_s: None,
            error: None,
        };

        match &self.outcome {
            SampleOutcome::Resolved {
                candidate,
                distance_meters,
                duration_seconds,
            } => {
                row.place_id = Some(&candidate.id);
                row.hosp_name = Some(&candidate.name);
                row.hosp_addr = Some(&candidate.address);
                row.hosp_lat = Some(candidate.lat);
                row.hosp_lng = Some(candidate.lon);
                row.dist_m = Some(*distance_meters);
                row.dur_s = Some(*duration_seconds);
            }
            SampleOutcome::Unresolved => {}
            SampleOutcome::Errored { message } => row.error = Some(message),
        }

        row
    }
}

/// Flat CSV row. Empty cells mean "not applicable", never zero.
#[derive(Debug, Serialize)]
pub struct OutputRow<'a> {
    pub sample_idx: u64,
    pub sample_lat: f64,
    pub sample_lng: f64,
    pub status: OutcomeStatus,
    pub place_id: Option<&'a str>,
    pub hosp_name: Option<&'a str>,
    pub hosp_addr: Option<&'a str>,
    pub hosp_lat: Option<f64>,
    pub hosp_lng: Option<f64>,
    pub dist_m: Option<u64>,
    pub dur_s: Option<u64>,
    pub error: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SampleRecord {
        SampleRecord::new(7, Point::new(-74.1, 4.6))
    }

    #[test]
    fn test_resolved_row_carries_candidate() {
        let candidate = Arc::new(Candidate::new(
            "p1",
            "Hospital San Jose",
            "Calle 10",
            Point::new(-74.05, 4.62),
        ));
        let record = ResultRecord {
            sample: sample(),
            outcome: SampleOutcome::Resolved {
                candidate,
                distance_meters: 0,
                duration_seconds: 0,
            },
        };

        let row = record.to_row();
        assert_eq!(row.status, OutcomeStatus::Resolved);
        assert_eq!(row.place_id, Some("p1"));
        // zero-length routes stay distinguishable from missing ones
        assert_eq!(row.dur_s, Some(0));
        assert!(row.error.is_none());
    }

    #[test]
    fn test_unresolved_and_errored_rows_are_empty() {
        let unresolved = ResultRecord {
            sample: sample(),
            outcome: SampleOutcome::Unresolved,
        };
        let row = unresolved.to_row();
        assert_eq!(row.status, OutcomeStatus::Unresolved);
        assert!(row.place_id.is_none() && row.dur_s.is_none() && row.error.is_none());

        let errored = ResultRecord {
            sample: sample(),
            outcome: SampleOutcome::Errored {
                message: "timeout".into(),
            },
        };
        let row = errored.to_row();
        assert_eq!(row.status, OutcomeStatus::Errored);
        assert!(row.place_id.is_none());
        assert_eq!(row.error, Some("timeout"));
    }
}
