//! HTTP fetch of the site catalog document.
//!
//! The catalog is one static JSON array, so there is a single request per
//! load. Connection errors and 5xx responses are retried with exponential
//! backoff; 4xx responses fail immediately.

use std::time::{Duration, Instant};

use log::{info, warn};
use reqwest::{Client, StatusCode};

use crate::catalog::{load_failure_notice, Catalog};
use crate::error::{PlannerError, Result};
use crate::Notice;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;

/// Fetches and parses catalog documents.
pub struct CatalogFetcher {
    client: Client,
    max_retries: u32,
}

impl CatalogFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlannerError::Http {
                message: format!("Failed to create HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Override the retry count (0 disables retries).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Download and parse the catalog at `url`.
    pub async fn fetch(&self, url: &str) -> Result<Catalog> {
        let start = Instant::now();
        let body = self.fetch_body(url).await?;
        let catalog = Catalog::from_json_str(&body)?;

        info!(
            "[CatalogFetcher] Loaded {} sites from {} in {:.2}s",
            catalog.len(),
            url,
            start.elapsed().as_secs_f64()
        );
        Ok(catalog)
    }

    async fn fetch_body(&self, url: &str) -> Result<String> {
        let mut retries = 0;

        loop {
            let failure = match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.text().await.map_err(|e| PlannerError::Http {
                            message: format!("Failed to read body: {}", e),
                            status_code: Some(status.as_u16()),
                        });
                    }
                    let error = PlannerError::Http {
                        message: format!("{} returned {}", url, status),
                        status_code: Some(status.as_u16()),
                    };
                    if !is_retryable(status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) => PlannerError::Http {
                    message: format!("Request error: {}", e),
                    status_code: None,
                },
            };

            retries += 1;
            if retries > self.max_retries {
                return Err(failure);
            }

            // Exponential backoff: 500ms, 1s, 2s...
            let backoff = Duration::from_millis(250 * (1 << retries.min(5)));
            warn!(
                "[CatalogFetcher] {}, retry {} after {:?}",
                failure, retries, backoff
            );
            tokio::time::sleep(backoff).await;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Synchronous wrapper: runs the fetch on a fresh tokio runtime.
pub fn fetch_catalog_blocking(url: &str) -> Result<Catalog> {
    use tokio::runtime::Runtime;

    let rt = Runtime::new()?;
    let fetcher = CatalogFetcher::new()?;
    rt.block_on(fetcher.fetch(url))
}

/// Fetch a catalog, falling back to an empty one with an error notice.
pub fn fetch_or_empty(url: &str) -> (Catalog, Notice) {
    match fetch_catalog_blocking(url) {
        Ok(catalog) => (catalog, Notice::success("Site data loaded.")),
        Err(e) => {
            warn!("[CatalogFetcher] Failed to load {}: {}", url, e);
            (Catalog::empty(), load_failure_notice())
        }
    }
}
