//! URL handling module for Catalogue-Scraper
//!
//! Catalogue sites link detail pages and assets with relative paths that
//! climb out of the current directory (`../../some-book_12/index.html`).
//! This module turns those into absolute URLs against a [`SiteLayout`].

mod normalize;

use crate::config::SiteConfig;
use crate::UrlResult;
use ::url::Url;

// Re-export main functions
pub use normalize::{parse_http_url, resolve_relative, strip_parent_segments};

/// The two bases a catalogue site resolves relative links against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    /// Base for detail pages (anything ending in `html`)
    pub catalogue_base: Url,

    /// Base for everything else (images and other assets)
    pub asset_base: Url,
}

impl SiteLayout {
    /// Creates a layout from two already-parsed base URLs
    pub fn new(catalogue_base: Url, asset_base: Url) -> Self {
        Self {
            catalogue_base,
            asset_base,
        }
    }

    /// Builds a layout from the site configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use catalogue_scraper::config::SiteConfig;
    /// use catalogue_scraper::url::SiteLayout;
    ///
    /// let layout = SiteLayout::from_config(&SiteConfig::default()).unwrap();
    /// assert_eq!(layout.catalogue_base.as_str(), "https://books.toscrape.com/catalogue/");
    /// ```
    pub fn from_config(config: &SiteConfig) -> UrlResult<Self> {
        Ok(Self {
            catalogue_base: parse_http_url(&config.catalogue_base)?,
            asset_base: parse_http_url(&config.asset_base)?,
        })
    }

    /// Resolves a link found on a page into an absolute URL
    pub fn resolve(&self, href: &str) -> Option<Url> {
        resolve_relative(href, self)
    }
}
