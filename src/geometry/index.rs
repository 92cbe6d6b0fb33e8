//! Spatial index for nearest-candidate lookups.

use std::sync::Arc;

use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::{info, warn};

use super::{Projection, WebMercator};
use crate::models::{Candidate, Point};

/// Projected candidate position tagged with its load order.
type IndexedCandidate = GeomWithData<[f64; 2], usize>;

/// Immutable set of candidates with an R-tree over their projected
/// coordinates.
pub struct CandidateIndex {
    candidates: Vec<Arc<Candidate>>,
    tree: RTree<IndexedCandidate>,
    projection: Arc<dyn Projection>,
}

impl CandidateIndex {
    /// Build the index using Web Mercator.
    pub fn build(candidates: Vec<Candidate>) -> Self {
        Self::build_with_projection(candidates, Arc::new(WebMercator))
    }

    pub fn build_with_projection(
        candidates: Vec<Candidate>,
        projection: Arc<dyn Projection>,
    ) -> Self {
        info!("Building spatial index for {} candidates...", candidates.len());

        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.location().is_valid() {
                kept.push(Arc::new(candidate));
            } else {
                warn!(
                    "Skipping candidate {} with invalid coordinates ({}, {})",
                    candidate.id, candidate.lat, candidate.lon
                );
            }
        }

        let indexed: Vec<IndexedCandidate> = kept
            .iter()
            .enumerate()
            .map(|(order, c)| GeomWithData::new(projection.project(c.lon, c.lat), order))
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} entries", tree.size());

        Self {
            candidates: kept,
            tree,
            projection,
        }
    }

    /// The `k` candidates closest to `point` in the projected plane, nearest
    /// first. Equidistant candidates keep their load order.
    pub fn nearest(&self, point: &Point, k: usize) -> Vec<Arc<Candidate>> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }
        if !point.is_valid() {
            warn!("Nearest query with invalid point ({}, {})", point.lat, point.lon);
            return Vec::new();
        }

        let query = self.project(point);

        // Keep pulling past k while distances tie with the k-th hit, so the
        // final cut does not depend on tree traversal order.
        let mut hits: Vec<(f64, usize)> = Vec::with_capacity(k);
        for (item, distance_2) in self.tree.nearest_neighbor_iter_with_distance_2(&query) {
            if hits.len() >= k && distance_2 > hits[k - 1].0 {
                break;
            }
            hits.push((distance_2, item.data));
        }

        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.truncate(k);

        hits.into_iter()
            .map(|(_, order)| Arc::clone(&self.candidates[order]))
            .collect()
    }

    /// Planar coordinates for `point`, reusing an attached projected copy.
    pub fn project(&self, point: &Point) -> [f64; 2] {
        point
            .projected()
            .unwrap_or_else(|| self.projection.project(point.lon, point.lat))
    }

    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    pub fn candidates(&self) -> &[Arc<Candidate>] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
