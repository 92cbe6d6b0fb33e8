//! Pagination driver for places discovery.

use std::time::Duration;

use tracing::{info, warn};

use super::{DiscoveryClient, PlacesQuery};
use crate::error::DiscoveryError;
use crate::geometry::SearchArea;
use crate::models::Candidate;

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOptions {
    pub category: String,
    /// Minimum wait before a continuation token is used.
    pub page_delay: Duration,
    /// Hard stop for services that keep handing out tokens.
    pub max_pages: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            category: "hospital".to_string(),
            page_delay: Duration::from_secs(2),
            max_pages: 3,
        }
    }
}

/// Collect every candidate the service lists for `area`.
///
/// Pages are fetched sequentially, waiting `page_delay` before each
/// continuation. Stops when no token is returned or after `max_pages`
/// fetches. `OK` and `ZERO_RESULTS` are the only accepted statuses.
pub async fn discover_candidates(
    client: &dyn DiscoveryClient,
    area: &SearchArea,
    options: &DiscoveryOptions,
) -> Result<Vec<Candidate>, DiscoveryError> {
    let query = PlacesQuery {
        location: area.center,
        radius_m: area.radius_m,
        category: options.category.clone(),
    };

    info!(
        "Querying '{}' around ({:.5}, {:.5}) radius {:.0}m",
        query.category, query.location.lat, query.location.lon, query.radius_m
    );

    let mut places = Vec::new();
    let mut token: Option<String> = None;

    for page_number in 1..=options.max_pages {
        if token.is_some() {
            tokio::time::sleep(options.page_delay).await;
        }

        let page = client.nearby(&query, token.as_deref()).await?;

        match page.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            _ => {
                if let Some(message) = &page.error_message {
                    warn!("Places service error on page {}: {}", page_number, message);
                }
                return Err(DiscoveryError::Protocol {
                    status: page.status,
                });
            }
        }

        info!("Page {}: {} places", page_number, page.results.len());
        places.extend(page.results);

        token = page.next_page_token.filter(|t| !t.is_empty());
        if token.is_none() {
            break;
        }
        if page_number == options.max_pages {
            warn!(
                "Stopping after {} pages with a continuation token outstanding",
                options.max_pages
            );
        }
    }

    info!("Retrieved {} places", places.len());
    Ok(places.into_iter().map(|p| p.into_candidate()).collect())
}
