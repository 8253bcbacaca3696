//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the persistent HTTP client shared by every session
//! - Serving repeated requests from the on-disk response cache
//! - Counting every attempt, failed or not
//! - Mapping transport failures to a fatal [`FetchError`]

use crate::cache::{CachedResponse, ResponseCache};
use crate::config::HttpConfig;
use crate::output::{CounterHandle, LogSink};
use crate::{ConfigError, FetchError};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Page body, decoded as UTF-8
    pub body: String,

    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Whether the response came from the on-disk cache
    pub from_cache: bool,
}

/// Builds the HTTP client used for every session
///
/// The client keeps its connection pool between requests and sessions.
///
/// # Example
///
/// ```no_run
/// use catalogue_scraper::config::HttpConfig;
/// use catalogue_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.timeout_ms))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the response cache described by the configuration, if enabled
///
/// # Errors
///
/// * `ConfigError::Validation` - The cache TTL is out of range
pub fn build_response_cache(config: &HttpConfig) -> Result<Option<ResponseCache>, ConfigError> {
    if !config.cache_enabled {
        return Ok(None);
    }

    let ttl = config.cache_ttl()?;
    Ok(Some(ResponseCache::new(&config.cache_dir, ttl)))
}

/// Issues GET requests through the cache and records their outcome
pub struct Fetcher {
    client: Client,
    cache: Option<ResponseCache>,
    counters: CounterHandle,
    log: Arc<dyn LogSink>,
}

impl Fetcher {
    pub fn new(
        client: Client,
        cache: Option<ResponseCache>,
        counters: CounterHandle,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            client,
            cache,
            counters,
            log,
        }
    }

    /// Fetches a URL, from cache when possible
    ///
    /// # Request Flow
    ///
    /// 1. Count the attempt (requests sent and responses received together)
    /// 2. Serve a fresh cache entry if there is one
    /// 3. Otherwise GET over the network; store 2xx responses in the cache
    /// 4. Count the status code and log the attempt
    ///
    /// # Errors
    ///
    /// Connection failures, timeouts, and body read failures all map to
    /// [`FetchError::NetworkUnavailable`]. Nothing is retried. HTTP error
    /// statuses are not errors here; the page is returned as served.
    pub async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.counters.update(|c| c.record_attempt());

        let response = match self.from_cache(url).await {
            Some(response) => response,
            None => self.from_network(url).await?,
        };

        self.counters.update(|c| c.record_status(response.status_code));
        self.log.info(&format!(
            "Request url: {} | From cache: {} | Status code: {}",
            response.final_url, response.from_cache, response.status_code
        ));

        Ok(response)
    }

    async fn from_cache(&self, url: &Url) -> Option<FetchResponse> {
        let cache = self.cache.as_ref()?;
        let entry = cache.get(url.as_str()).await?;

        let final_url = match Url::parse(&entry.final_url) {
            Ok(final_url) => final_url,
            Err(_) => url.clone(),
        };

        Some(FetchResponse {
            body: entry.body,
            final_url,
            status_code: entry.status_code,
            from_cache: true,
        })
    }

    async fn from_network(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let network_error = |source: reqwest::Error| FetchError::NetworkUnavailable {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(network_error)?;

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();

        // Catalogue pages are UTF-8 whatever the response headers claim
        let bytes = response.bytes().await.map_err(network_error)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        if let Some(cache) = &self.cache {
            if ResponseCache::is_cacheable(status_code) {
                let entry =
                    CachedResponse::new(url.as_str(), final_url.as_str(), status_code, body.clone());
                if let Err(e) = cache.put(&entry).await {
                    self.log.warn(&format!(
                        "Failed to cache response for {} in {}: {}",
                        url,
                        cache.dir().display(),
                        e
                    ));
                }
            }
        }

        Ok(FetchResponse {
            body,
            final_url,
            status_code,
            from_cache: false,
        })
    }
}
