//! Crawl engine for paginated catalogues
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching through the response cache
//! - Listing and detail page parsing
//! - Randomized request pacing
//! - The session state machine and its controller

mod controller;
mod coordinator;
mod fetcher;
mod pacing;
mod parser;
mod record;

pub use controller::Controller;
pub use coordinator::{Coordinator, CrawlOutcome, SessionContext};
pub use fetcher::{build_http_client, build_response_cache, FetchResponse, Fetcher};
pub use pacing::Pacer;
pub use parser::{
    extract_detail_links, extract_detail_record, extract_next_page_url, parse_listing,
    parse_stock, star_rating_from_label, ListingPage,
};
pub use record::ExtractedRecord;
