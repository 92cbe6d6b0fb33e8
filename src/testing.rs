//! Scripted service doubles for exercising the pipeline without network
//! access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::discovery::{
    DiscoveryClient, PlaceGeometry, PlaceLocation, PlaceRecord, PlacesPage, PlacesQuery,
};
use crate::error::TransportError;
use crate::routing::{MatrixElement, MatrixRequest, MatrixResponse, RoutingClient};

type Script = Box<dyn Fn(&MatrixRequest) -> Result<MatrixResponse, TransportError> + Send + Sync>;

/// Routing client answering every request through a closure.
pub struct ScriptedRoutingClient {
    script: Script,
    latency: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedRoutingClient {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&MatrixRequest) -> Result<MatrixResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            latency: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Same elements for every request.
    pub fn fixed(elements: Vec<MatrixElement>) -> Self {
        Self::new(move |_| {
            Ok(MatrixResponse {
                elements: elements.clone(),
            })
        })
    }

    /// Delay every answer, simulating a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of requests observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingClient for ScriptedRoutingClient {
    async fn distance_matrix(
        &self,
        request: &MatrixRequest,
    ) -> Result<MatrixResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let result = (self.script)(request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Discovery client replaying a fixed list of pages, recording the token and
/// time of every fetch.
pub struct ScriptedDiscoveryClient {
    pages: Vec<PlacesPage>,
    fetches: Mutex<Vec<(Option<String>, tokio::time::Instant)>>,
}

impl ScriptedDiscoveryClient {
    pub fn new(pages: Vec<PlacesPage>) -> Self {
        Self {
            pages,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.lock().iter().map(|(token, _)| token.clone()).collect()
    }

    pub fn fetch_times(&self) -> Vec<tokio::time::Instant> {
        self.lock().iter().map(|(_, at)| *at).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Option<String>, tokio::time::Instant)>> {
        self.fetches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DiscoveryClient for ScriptedDiscoveryClient {
    async fn nearby(
        &self,
        _query: &PlacesQuery,
        page_token: Option<&str>,
    ) -> Result<PlacesPage, TransportError> {
        let index = {
            let mut fetches = self.lock();
            fetches.push((page_token.map(String::from), tokio::time::Instant::now()));
            fetches.len() - 1
        };

        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| TransportError::Malformed(format!("no scripted page {}", index + 1)))
    }
}

/// Minimal place record at (lat, lng).
pub fn place(id: &str, lat: f64, lng: f64) -> PlaceRecord {
    PlaceRecord {
        place_id: id.to_string(),
        name: Some(format!("Hospital {}", id)),
        vicinity: Some(format!("Street {}", id)),
        formatted_address: None,
        geometry: PlaceGeometry {
            location: PlaceLocation { lat, lng },
        },
    }
}
