//! Application layer module
//!
//! The run controller that ties the challenge client, the page extractor and
//! the ledger together.

pub mod scraper;

pub use scraper::{JobScraper, RunError, ScraperSettings};
