use crate::url::SiteLayout;
use crate::UrlError;
use url::Url;

/// Parses an absolute URL, accepting only HTTP and HTTPS
///
/// # Examples
///
/// ```
/// use catalogue_scraper::url::parse_http_url;
///
/// assert!(parse_http_url("https://books.toscrape.com/").is_ok());
/// assert!(parse_http_url("ftp://books.toscrape.com/").is_err());
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}

/// Removes every `../` occurrence from a relative link
///
/// Catalogue pages nest at varying depths, so the parent hops carry no
/// information once the link is re-anchored on a fixed base.
pub fn strip_parent_segments(href: &str) -> String {
    href.trim().replace("../", "")
}

/// Resolves a link against the site layout
///
/// # Resolution Rules
///
/// 1. Strip all `../` segments
/// 2. Links ending in `html` are detail pages and resolve against the catalogue base
/// 3. Everything else is an asset and resolves against the asset base
///
/// Absolute links keep their own host. Returns `None` for empty links and
/// links that resolve to a non-HTTP(S) URL.
///
/// # Examples
///
/// ```
/// use catalogue_scraper::url::{resolve_relative, SiteLayout};
/// use url::Url;
///
/// let layout = SiteLayout::new(
///     Url::parse("https://books.toscrape.com/catalogue/").unwrap(),
///     Url::parse("https://books.toscrape.com/").unwrap(),
/// );
///
/// let image = resolve_relative("../../media/cache/ab/cd/abcd.jpg", &layout).unwrap();
/// assert_eq!(image.as_str(), "https://books.toscrape.com/media/cache/ab/cd/abcd.jpg");
/// ```
pub fn resolve_relative(href: &str, layout: &SiteLayout) -> Option<Url> {
    let cleaned = strip_parent_segments(href);
    if cleaned.is_empty() {
        return None;
    }

    let base = if cleaned.ends_with("html") {
        &layout.catalogue_base
    } else {
        &layout.asset_base
    };

    let resolved = base.join(&cleaned).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
