//! HTML parsing infrastructure for job listing pages
//!
//! Trait-based parsing so the run controller can be exercised with a stub
//! extractor, with the site-specific `JobListParser` as the real implementation.

pub mod config;
pub mod error;
pub mod job_list_parser;
pub mod normalize;

// Re-export public types
pub use config::{FieldLocator, JobListSelectors};
pub use error::{ParsingError, ParsingResult};
pub use job_list_parser::JobListParser;

use crate::domain::PageExtraction;

/// Extracts job records from one page of listing markup.
pub trait PageExtractor: Send + Sync {
    /// Deterministic and side-effect free: the same markup always yields the
    /// same extraction.
    fn scrape_page(&self, markup: &str) -> PageExtraction;
}

impl PageExtractor for JobListParser {
    fn scrape_page(&self, markup: &str) -> PageExtraction {
        Self::scrape_page(self, markup)
    }
}
