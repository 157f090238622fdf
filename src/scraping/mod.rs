//! Marketplace scraping: fetching, field extraction and listing crawling.

pub mod extract;
pub mod fetch;
pub mod listing;
pub mod price;
pub mod site;

pub use extract::{ExtractOptions, ExtractionError, extract_product};
pub use fetch::{FetchError, FetchedPage, HttpFetcher, PageFetcher};
