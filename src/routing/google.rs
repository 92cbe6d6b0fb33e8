//! Google Distance Matrix client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{ElementStatus, MatrixElement, MatrixRequest, MatrixResponse, RoutingClient};
use crate::config::{ApiKey, ServiceConfig};
use crate::error::TransportError;

/// Production [`RoutingClient`] backed by the Distance Matrix JSON API.
pub struct GoogleDistanceMatrixClient {
    client: Client,
    endpoint: Url,
    api_key: ApiKey,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixBody {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixRow {
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixElement {
    status: String,
    duration: Option<ValueField>,
    distance: Option<ValueField>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: u64,
}

impl GoogleDistanceMatrixClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        let endpoint = config
            .base_url
            .join("distancematrix/json")
            .map_err(|e| TransportError::Malformed(format!("bad endpoint: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl RoutingClient for GoogleDistanceMatrixClient {
    async fn distance_matrix(
        &self,
        request: &MatrixRequest,
    ) -> Result<MatrixResponse, TransportError> {
        let destinations = request
            .destinations
            .iter()
            .map(|d| d.to_param())
            .collect::<Vec<_>>()
            .join("|");

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("origins", &request.origin.to_param())
            .append_pair("destinations", &destinations)
            .append_pair("mode", request.mode.as_str())
            .append_pair("key", self.api_key.expose());

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        let text = response.text().await?;
        let body: DistanceMatrixBody = serde_json::from_str(&text)
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        debug!(
            "Distance matrix for {} destinations: {}",
            request.destinations.len(),
            body.status
        );

        parse_body(body, request.destinations.len())
    }
}

fn parse_body(body: DistanceMatrixBody, expected: usize) -> Result<MatrixResponse, TransportError> {
    if body.status != "OK" {
        return Err(TransportError::BatchStatus {
            status: body.status,
            message: body.error_message,
        });
    }

    let mut rows = body.rows.into_iter();
    let row = match (rows.next(), rows.next()) {
        (Some(row), None) => row,
        _ => {
            return Err(TransportError::Malformed(
                "expected exactly one row for a single origin".to_string(),
            ))
        }
    };

    if row.elements.len() != expected {
        return Err(TransportError::Malformed(format!(
            "expected {} elements, got {}",
            expected,
            row.elements.len()
        )));
    }

    let elements = row
        .elements
        .into_iter()
        .map(|el| {
            if el.status != "OK" {
                return Ok(MatrixElement::Failed(ElementStatus::parse(&el.status)));
            }
            match (el.duration, el.distance) {
                (Some(duration), Some(distance)) => Ok(MatrixElement::Route {
                    duration_seconds: duration.value,
                    distance_meters: distance.value,
                }),
                _ => Err(TransportError::Malformed(
                    "OK element without duration or distance".to_string(),
                )),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MatrixResponse { elements })
}
