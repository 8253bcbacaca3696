use serde::{Deserialize, Serialize};

/// Structured data extracted from one detail page
///
/// Serialized with the keys used by the export file (`star`, `reviews`,
/// `stock`, `upc`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Final URL of the detail page
    pub url: String,

    pub title: String,

    /// Price text as shown on the page, currency symbol included
    pub price: String,

    /// 1 to 5, or 0 when the rating label is missing or unknown
    #[serde(rename = "star")]
    pub star_rating: u8,

    #[serde(rename = "reviews")]
    pub review_count: u32,

    /// Units in stock, 0 when out of stock or unparseable
    #[serde(rename = "stock")]
    pub stock_count: u32,

    #[serde(rename = "upc")]
    pub product_code: String,

    /// Absolute image URL, empty when the page has no image
    pub image_url: String,
}

impl ExtractedRecord {
    /// Number of data points in a record; each record adds this to the
    /// scraped-field counter
    pub const FIELD_COUNT: usize = 8;

    /// Field names and display values, in export order
    pub fn fields(&self) -> [(&'static str, String); Self::FIELD_COUNT] {
        [
            ("url", self.url.clone()),
            ("title", self.title.clone()),
            ("price", self.price.clone()),
            ("star", self.star_rating.to_string()),
            ("reviews", self.review_count.to_string()),
            ("stock", self.stock_count.to_string()),
            ("upc", self.product_code.clone()),
            ("image_url", self.image_url.clone()),
        ]
    }
}
