//! job-scraper - paginated job listing scraper
//!
//! Requests a manifest of job ids from the challenge service, scrapes every
//! listing page in parallel, submits each page's records as a batch and signals
//! completion once every manifest id has been confirmed.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;

pub use application::{JobScraper, RunError, ScraperSettings};
pub use domain::{RunOutcome, RunReport};
