//! TomTom POI search client
//!
//! Implements [`QueryClient`] on top of the TomTom Search API
//! (`/search/2/poiSearch/{query}.json`) restricted to a bounding box via
//! `topLeft` / `btmRight`. The API returns at most 100 results per call and
//! reports the full match count in `summary.totalResults`.

use std::time::{Duration, Instant};

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::{debug, warn};

use crate::SweepError;
use crate::config::ApiConfig;
use crate::error::QueryError;
use crate::models::{BoundingBox, QueryResult, SearchFilter};
use crate::search::QueryClient;

/// TomTom search API client
pub struct TomTomClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    query: String,
}

impl TomTomClient {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, config: &ApiConfig) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("poi-sweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SweepError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            query: config.query.clone(),
        })
    }

    /// Full request URL for one region, API key included
    #[must_use]
    pub fn request_url(&self, bbox: &BoundingBox, filter: &SearchFilter) -> String {
        let (north, west) = bbox.top_left();
        let (south, east) = bbox.bottom_right();
        format!(
            "{}/search/2/poiSearch/{}.json?countrySet={}&topLeft={},{}&btmRight={},{}&categorySet={}&key={}&limit={}&minPowerKW={}",
            self.base_url,
            urlencoding::encode(&self.query),
            urlencoding::encode(&filter.country),
            north,
            west,
            south,
            east,
            filter.category,
            urlencoding::encode(&self.api_key),
            filter.limit,
            filter.min_power_kw,
        )
    }

    /// `url` with the API key masked, for logging
    fn redacted(&self, url: &str) -> String {
        if self.api_key.is_empty() {
            return url.to_string();
        }
        let encoded = urlencoding::encode(&self.api_key);
        url.replace(&*encoded, "***")
    }
}

/// Map a non-success status to the matching query error
#[must_use]
pub fn classify_status(status: u16, body: String) -> QueryError {
    match status {
        401 | 403 => QueryError::Authentication(format!(
            "TomTom rejected the API key (HTTP {status}): {body}"
        )),
        429 => QueryError::RateLimited(format!("TomTom rate limit exceeded: {body}")),
        _ => QueryError::Api { status, body },
    }
}

impl QueryClient for TomTomClient {
    async fn query(
        &self,
        bbox: &BoundingBox,
        filter: &SearchFilter,
    ) -> Result<QueryResult, QueryError> {
        let url = self.request_url(bbox, filter);
        debug!("TomTom request: {}", self.redacted(&url));
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                QueryError::Network(format!(
                    "API request failed: {}",
                    self.redacted(&e.to_string())
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("TomTom returned HTTP {} for region {bbox}", status.as_u16());
            return Err(classify_status(status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| {
                QueryError::Network(format!(
                    "Failed to read response body: {}",
                    self.redacted(&e.to_string())
                ))
            })?;

        let result: QueryResult = serde_json::from_slice(&bytes)
            .map_err(|e| QueryError::Parse(format!("Failed to parse TomTom response: {e}")))?;

        debug!(
            "Region {bbox}: {}/{} results in {:.3}s",
            result.summary.num_results,
            result.summary.total_results,
            start_time.elapsed().as_secs_f64()
        );

        Ok(result)
    }
}
