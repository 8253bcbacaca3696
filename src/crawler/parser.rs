//! HTML parser for listing and detail pages
//!
//! Listing pages yield detail-page links and an optional next-page link.
//! Detail pages yield one [`ExtractedRecord`]. Missing optional values
//! resolve to defaults; only a page without its content container is an error.

use crate::crawler::record::ExtractedRecord;
use crate::url::SiteLayout;
use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Links extracted from one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Detail-page URLs in document order
    pub detail_links: Vec<Url>,

    /// Absolute URL of the next listing page, `None` on the last page
    pub next_page: Option<Url>,
}

/// Parses a listing page into its detail links and next-page link
///
/// Both extractions read the same parsed document. The document is dropped
/// before returning, so the result can be held across `.await` points.
pub fn parse_listing(html: &str, listing_url: &Url, layout: &SiteLayout) -> ListingPage {
    let document = Html::parse_document(html);

    ListingPage {
        detail_links: extract_detail_links(&document, layout).collect(),
        next_page: extract_next_page_url(&document, listing_url),
    }
}

/// Lazily yields the absolute detail-page URL of every `h3 > a` link
///
/// The iterator borrows the document and makes a single pass over it.
pub fn extract_detail_links<'a>(
    document: &'a Html,
    layout: &'a SiteLayout,
) -> impl Iterator<Item = Url> + 'a {
    let selector = Selector::parse("h3 > a[href]").ok();

    selector
        .into_iter()
        .flat_map(move |selector| {
            document
                .select(&selector)
                .filter_map(|element| element.value().attr("href"))
                .collect::<Vec<_>>()
        })
        .filter_map(move |href| layout.resolve(href))
}

/// Finds the `li.next > a` link, resolved against the listing page's URL
///
/// Returns `None` when the page has no next link; that is how pagination ends.
pub fn extract_next_page_url(document: &Html, listing_url: &Url) -> Option<Url> {
    let selector = Selector::parse("li.next > a[href]").ok()?;

    let href = document.select(&selector).next()?.value().attr("href")?;
    listing_url.join(href.trim()).ok()
}

/// Extracts the record of a detail page
///
/// # Arguments
///
/// * `html` - The detail page body
/// * `resolved_url` - Final URL of the page, stored as the record's `url`
/// * `layout` - Site layout used to make the image URL absolute
///
/// # Returns
///
/// * `Ok(ExtractedRecord)` - Every field resolved to a value or its default
/// * `Err(ParseError::MalformedPage)` - No `article > div.row` content container
pub fn extract_detail_record(
    html: &str,
    resolved_url: &Url,
    layout: &SiteLayout,
) -> Result<ExtractedRecord, ParseError> {
    let document = Html::parse_document(html);

    let contents = select_first(document.root_element(), "article > div.row").ok_or_else(|| {
        ParseError::MalformedPage {
            url: resolved_url.to_string(),
            reason: "missing product content container".to_string(),
        }
    })?;

    let table = ProductTable::from_document(&document);

    let title = select_first(contents, "h1")
        .map(element_text)
        .unwrap_or_default();

    let star_rating = select_first(contents, "div.product_main p.star-rating")
        .and_then(|element| {
            element
                .value()
                .classes()
                .find(|class| *class != "star-rating")
                .map(star_rating_from_label)
        })
        .unwrap_or(0);

    let image_url = select_first(contents, "div.item > img")
        .and_then(|element| element.value().attr("src"))
        .and_then(|src| layout.resolve(src))
        .map(|url| url.to_string())
        .unwrap_or_default();

    Ok(ExtractedRecord {
        url: resolved_url.to_string(),
        title,
        price: table.value_for("excl").unwrap_or_default(),
        star_rating,
        review_count: table
            .value_for("reviews")
            .and_then(|text| text.parse().ok())
            .unwrap_or(0),
        stock_count: table
            .value_for("Availability")
            .map(|text| parse_stock(&text))
            .unwrap_or(0),
        product_code: table.value_for("UPC").unwrap_or_default(),
        image_url,
    })
}

/// Maps a rating label to stars: `One`..`Five` become 1..5, anything else 0
pub fn star_rating_from_label(label: &str) -> u8 {
    match label.trim() {
        "One" => 1,
        "Two" => 2,
        "Three" => 3,
        "Four" => 4,
        "Five" => 5,
        _ => 0,
    }
}

/// Parses availability text of the form `In stock (N available)`
///
/// Anything else, including `Out of stock` and unparseable counts, yields 0.
pub fn parse_stock(text: &str) -> u32 {
    text.trim()
        .strip_prefix("In stock (")
        .and_then(|rest| rest.strip_suffix(" available)"))
        .and_then(|count| count.trim().parse().ok())
        .unwrap_or(0)
}

/// Header/value rows of the product information table
struct ProductTable {
    rows: Vec<(String, String)>,
}

impl ProductTable {
    fn from_document(document: &Html) -> Self {
        let mut rows = Vec::new();

        if let (Ok(row_selector), Ok(th), Ok(td)) = (
            Selector::parse("table tr"),
            Selector::parse("th"),
            Selector::parse("td"),
        ) {
            for row in document.select(&row_selector) {
                let header = row.select(&th).next().map(element_text);
                let value = row.select(&td).next().map(element_text);
                if let (Some(header), Some(value)) = (header, value) {
                    rows.push((header, value));
                }
            }
        }

        Self { rows }
    }

    /// Value of the first row whose header contains `needle`
    fn value_for(&self, needle: &str) -> Option<String> {
        self.rows
            .iter()
            .find(|(header, _)| header.contains(needle))
            .map(|(_, value)| value.clone())
    }
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
