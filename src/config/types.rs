use crate::ConfigError;
use serde::Deserialize;

/// Main configuration structure for Catalogue-Scraper
///
/// Every section is optional; missing sections fall back to the
/// books.toscrape.com fantasy catalogue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// First listing page of the crawl
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Base that relative detail-page links resolve against
    #[serde(rename = "catalogue-base")]
    pub catalogue_base: String,

    /// Base that relative asset links (images) resolve against
    #[serde(rename = "asset-base")]
    pub asset_base: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            start_url: "https://books.toscrape.com/catalogue/category/books/fantasy_19/page-1.html"
                .to_string(),
            catalogue_base: "https://books.toscrape.com/catalogue/".to_string(),
            asset_base: "https://books.toscrape.com/".to_string(),
        }
    }
}

/// HTTP client and response cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whether responses are cached on disk
    #[serde(rename = "cache-enabled")]
    pub cache_enabled: bool,

    /// Directory holding cached responses
    #[serde(rename = "cache-dir")]
    pub cache_dir: String,

    /// Maximum age of a cached response; absent means entries never expire
    #[serde(rename = "cache-ttl-hours")]
    pub cache_ttl_hours: Option<u64>,
}

impl HttpConfig {
    /// Maximum cache entry age, `None` when entries never expire
    ///
    /// # Errors
    ///
    /// * `ConfigError::Validation` - `cache-ttl-hours` does not fit in a duration
    pub fn cache_ttl(&self) -> Result<Option<chrono::Duration>, ConfigError> {
        let Some(hours) = self.cache_ttl_hours else {
            return Ok(None);
        };

        i64::try_from(hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .map(Some)
            .ok_or_else(|| {
                ConfigError::Validation(format!("cache-ttl-hours ({}) is too large", hours))
            })
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3500,
            user_agent: format!("catalogue-scraper/{}", env!("CARGO_PKG_VERSION")),
            cache_enabled: true,
            cache_dir: "./.webcache".to_string(),
            cache_ttl_hours: None,
        }
    }
}

/// Delay applied before every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            max_delay_ms: 3000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory where timestamped export files are created
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
