pub mod client;
pub mod extract;

pub use client::{save_to_json, validate_http_url, ScrapeResult, WebScraper};
pub use extract::{extract_links, extract_text};
