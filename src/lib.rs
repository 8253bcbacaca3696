//! Catalogue-Scraper: a paced single-site catalogue scraper
//!
//! This crate walks a paginated listing of item links, follows each link to
//! extract a structured record, and exports the collected records once the
//! crawl completes. The crawl runs on its own background task and can be
//! paused, resumed, or cancelled from a controller while it runs.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Catalogue-Scraper operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("A crawl session is already running")]
    SessionActive,

    #[error("Crawl task terminated abnormally: {0}")]
    Task(String),
}

/// Transport-level failures; every variant is fatal to the session
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network unavailable while requesting {url}: {source}")]
    NetworkUnavailable { url: String, source: reqwest::Error },
}

impl FetchError {
    /// Returns the URL whose request failed
    pub fn url(&self) -> &str {
        match self {
            Self::NetworkUnavailable { url, .. } => url,
        }
    }
}

/// Page-level extraction failures; missing optional fields are never errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed page at {url}: {reason}")]
    MalformedPage { url: String, reason: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Base URL must end with '/': {0}")]
    NotADirectory(String),
}

/// Result type alias for Catalogue-Scraper operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Controller, CrawlOutcome, ExtractedRecord};
pub use output::{Counters, JsonFileSink, LogSink};
pub use state::SessionStatus;
pub use url::SiteLayout;
