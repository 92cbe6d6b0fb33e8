//! Google Places Nearby Search client.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{DiscoveryClient, PlacesPage, PlacesQuery};
use crate::config::{ApiKey, ServiceConfig};
use crate::error::TransportError;

pub struct GooglePlacesClient {
    client: Client,
    endpoint: Url,
    api_key: ApiKey,
}

impl GooglePlacesClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        let endpoint = config
            .base_url
            .join("place/nearbysearch/json")
            .map_err(|e| TransportError::Malformed(format!("bad endpoint: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    fn page_url(&self, query: &PlacesQuery, page_token: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            match page_token {
                // a continuation token replaces the first-page search parameters
                Some(token) => {
                    pairs.append_pair("pagetoken", token);
                }
                None => {
                    pairs
                        .append_pair(
                            "location",
                            &format!("{},{}", query.location.lat, query.location.lon),
                        )
                        .append_pair("radius", &format!("{:.0}", query.radius_m))
                        .append_pair("type", &query.category);
                }
            }
            pairs.append_pair("key", self.api_key.expose());
        }
        url
    }
}

#[async_trait]
impl DiscoveryClient for GooglePlacesClient {
    async fn nearby(
        &self,
        query: &PlacesQuery,
        page_token: Option<&str>,
    ) -> Result<PlacesPage, TransportError> {
        let url = self.page_url(query, page_token);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        let text = response.text().await?;
        let page: PlacesPage =
            serde_json::from_str(&text).map_err(|e| TransportError::Malformed(e.to_string()))?;

        debug!(
            "Places page: status {}, {} results, continuation {}",
            page.status,
            page.results.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServiceSettings, API_KEY_VAR};
    use crate::models::Point;

    fn client() -> GooglePlacesClient {
        let config = ServiceConfig::from_lookup(&ServiceSettings::default(), |var| {
            (var == API_KEY_VAR).then(|| "k".to_string())
        })
        .unwrap();
        GooglePlacesClient::new(&config).unwrap()
    }

    fn query() -> PlacesQuery {
        PlacesQuery {
            location: Point::new(-74.08, 4.61),
            radius_m: 12345.6,
            category: "hospital".to_string(),
        }
    }

    #[test]
    fn test_first_page_url() {
        let url = client().page_url(&query(), None);
        assert_eq!(url.path(), "/maps/api/place/nearbysearch/json");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("location".into(), "4.61,-74.08".into())));
        assert!(pairs.contains(&("radius".into(), "12346".into())));
        assert!(pairs.contains(&("type".into(), "hospital".into())));
        assert!(pairs.contains(&("key".into(), "k".into())));
    }

    #[test]
    fn test_continuation_url() {
        let url = client().page_url(&query(), Some("TOKEN"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("pagetoken".to_string(), "TOKEN".to_string()),
                ("key".to_string(), "k".to_string())
            ]
        );
    }
}
