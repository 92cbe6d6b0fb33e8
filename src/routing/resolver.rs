//! Reduce a distance matrix to the best route for one sample.

use std::sync::Arc;

use tracing::debug;

use super::{LatLng, MatrixElement, MatrixRequest, RoutingClient, TravelMode, MAX_DESTINATIONS};
use crate::error::TransportError;
use crate::models::{Candidate, Point, RouteResult};

/// Picks the fastest usable route from an origin to a set of candidates.
pub struct RouteResolver {
    client: Arc<dyn RoutingClient>,
    mode: TravelMode,
}

impl RouteResolver {
    pub fn new(client: Arc<dyn RoutingClient>) -> Self {
        Self {
            client,
            mode: TravelMode::Driving,
        }
    }

    /// Resolve `origin` against `candidates` with a single batched call.
    ///
    /// Destinations the service could not route are skipped; if none are
    /// usable the result is [`RouteResult::Unresolved`]. Among usable routes
    /// the minimum duration wins, ties going to the earlier candidate.
    /// Failures of the call itself are returned as errors, never folded into
    /// `Unresolved`.
    pub async fn resolve(
        &self,
        origin: &Point,
        candidates: &[Arc<Candidate>],
    ) -> Result<RouteResult, TransportError> {
        if candidates.is_empty() {
            return Ok(RouteResult::Unresolved);
        }
        if candidates.len() > MAX_DESTINATIONS {
            return Err(TransportError::BatchTooLarge {
                len: candidates.len(),
                max: MAX_DESTINATIONS,
            });
        }

        let request = MatrixRequest {
            origin: LatLng::from(origin),
            destinations: candidates
                .iter()
                .map(|c| LatLng::from(&c.location()))
                .collect(),
            mode: self.mode,
        };

        let response = self.client.distance_matrix(&request).await?;

        if response.elements.len() != candidates.len() {
            return Err(TransportError::Malformed(format!(
                "expected {} elements, got {}",
                candidates.len(),
                response.elements.len()
            )));
        }

        let best = response
            .elements
            .iter()
            .enumerate()
            .filter_map(|(i, element)| match element {
                MatrixElement::Route {
                    duration_seconds,
                    distance_meters,
                } => Some((*duration_seconds, i, *distance_meters)),
                MatrixElement::Failed(status) => {
                    debug!("No route to {}: {:?}", candidates[i].id, status);
                    None
                }
            })
            .min_by_key(|(duration, i, _)| (*duration, *i));

        Ok(match best {
            Some((duration_seconds, i, distance_meters)) => RouteResult::Resolved {
                candidate_id: candidates[i].id.clone(),
                candidate_position: i,
                distance_meters,
                duration_seconds,
            },
            None => RouteResult::Unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ElementStatus;
    use crate::testing::ScriptedRoutingClient;

    fn candidates(n: usize) -> Vec<Arc<Candidate>> {
        (0..n)
            .map(|i| {
                Arc::new(Candidate::new(
                    format!("h{}", i),
                    format!("Hospital {}", i),
                    "",
                    Point::new(-74.0 + i as f64 * 0.01, 4.6),
                ))
            })
            .collect()
    }

    fn not_found() -> MatrixElement {
        MatrixElement::Failed(ElementStatus::NotFound)
    }

    fn route(duration_seconds: u64, distance_meters: u64) -> MatrixElement {
        MatrixElement::Route {
            duration_seconds,
            distance_meters,
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_make_no_call() {
        let client = Arc::new(ScriptedRoutingClient::fixed(vec![]));
        let resolver = RouteResolver::new(client.clone());

        let result = resolver.resolve(&Point::new(0.0, 0.0), &[]).await.unwrap();
        assert_eq!(result, RouteResult::Unresolved);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_usable_destination() {
        let client = Arc::new(ScriptedRoutingClient::fixed(vec![
            not_found(),
            route(400, 5200),
            not_found(),
        ]));
        let resolver = RouteResolver::new(client.clone());

        let result = resolver
            .resolve(&Point::new(-74.1, 4.6), &candidates(3))
            .await
            .unwrap();
        assert_eq!(
            result,
            RouteResult::Resolved {
                candidate_id: "h1".to_string(),
                candidate_position: 1,
                distance_meters: 5200,
                duration_seconds: 400,
            }
        );
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_not_found_is_unresolved() {
        let client = Arc::new(ScriptedRoutingClient::fixed(vec![not_found(); 3]));
        let resolver = RouteResolver::new(client);

        let result = resolver
            .resolve(&Point::new(-74.1, 4.6), &candidates(3))
            .await
            .unwrap();
        assert_eq!(result, RouteResult::Unresolved);
    }

    #[tokio::test]
    async fn test_minimum_duration_not_distance() {
        let client = Arc::new(ScriptedRoutingClient::fixed(vec![
            route(900, 1000),
            route(300, 8000),
            route(300, 7000),
        ]));
        let resolver = RouteResolver::new(client);

        let result = resolver
            .resolve(&Point::new(-74.1, 4.6), &candidates(3))
            .await
            .unwrap();
        // tie on duration goes to the earlier (nearer) candidate
        assert_eq!(
            result,
            RouteResult::Resolved {
                candidate_id: "h1".to_string(),
                candidate_position: 1,
                distance_meters: 8000,
                duration_seconds: 300,
            }
        );
    }

    #[tokio::test]
    async fn test_zero_duration_is_resolved() {
        let client = Arc::new(ScriptedRoutingClient::fixed(vec![route(0, 0)]));
        let resolver = RouteResolver::new(client);

        let result = resolver
            .resolve(&Point::new(-74.0, 4.6), &candidates(1))
            .await
            .unwrap();
        assert!(result.is_resolved());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = Arc::new(ScriptedRoutingClient::new(|_| {
            Err(TransportError::BatchStatus {
                status: "OVER_QUERY_LIMIT".to_string(),
                message: None,
            })
        }));
        let resolver = RouteResolver::new(client);

        let err = resolver
            .resolve(&Point::new(-74.1, 4.6), &candidates(2))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::BatchStatus { .. }));
    }

    #[tokio::test]
    async fn test_short_response_is_malformed() {
        let client = Arc::new(ScriptedRoutingClient::fixed(vec![route(10, 10)]));
        let resolver = RouteResolver::new(client);

        let err = resolver
            .resolve(&Point::new(-74.1, 4.6), &candidates(2))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected_before_calling() {
        let client = Arc::new(ScriptedRoutingClient::fixed(vec![]));
        let resolver = RouteResolver::new(client.clone());

        let err = resolver
            .resolve(&Point::new(-74.1, 4.6), &candidates(MAX_DESTINATIONS + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::BatchTooLarge { len: 26, max: 25 }));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_request_uses_geographic_coordinates() {
        let client = Arc::new(ScriptedRoutingClient::new(|request| {
            assert_eq!(request.mode, TravelMode::Driving);
            assert_eq!(request.origin, LatLng { lat: 4.6, lng: -74.1 });
            assert_eq!(request.destinations.len(), 2);
            assert!((request.destinations[1].lng + 73.99).abs() < 1e-9);
            Ok(crate::routing::MatrixResponse {
                elements: vec![
                    MatrixElement::Failed(ElementStatus::NotFound),
                    MatrixElement::Failed(ElementStatus::NotFound),
                ],
            })
        }));
        let resolver = RouteResolver::new(client);

        // a projected copy on the origin must not leak into the request
        let origin = Point::new(-74.1, 4.6).with_projected([1.0e6, 5.0e5]);
        resolver.resolve(&origin, &candidates(2)).await.unwrap();
    }
}
