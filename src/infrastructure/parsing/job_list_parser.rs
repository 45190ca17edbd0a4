//! Job list parser
//!
//! Turns one listing page into validated `JobRecord`s plus the page-local ids
//! of listings that failed the five-field rule. Pure: no I/O, no shared state.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::{FieldLocator, JobListSelectors};
use super::normalize::{strip_label, to_iso_date};
use super::{ParsingError, ParsingResult};
use crate::domain::{JobRecord, PageExtraction};

/// Compiled field selector with its label-stripping rule
struct FieldExtractor {
    selector: Selector,
    separator: char,
    segment: usize,
}

impl FieldExtractor {
    fn compile(locator: &FieldLocator) -> ParsingResult<Self> {
        Ok(Self {
            selector: compile_selector(&locator.selector)?,
            separator: locator.separator,
            segment: locator.segment,
        })
    }

    /// Concatenated text of every match inside `scope`, label stripped.
    fn extract(&self, scope: &ElementRef) -> String {
        let text: String = scope
            .select(&self.selector)
            .flat_map(|element| element.text())
            .collect();
        strip_label(&text, self.separator, self.segment)
    }
}

/// Parser for extracting job postings from listing pages
pub struct JobListParser {
    link_selector: Selector,
    link_pattern: Regex,
    job_number: FieldExtractor,
    brand: FieldExtractor,
    title: FieldExtractor,
    date_posted: FieldExtractor,
    location: FieldExtractor,
}

fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| {
        warn!("Failed to compile selector '{}': {}", selector, e);
        ParsingError::invalid_selector(selector, e)
    })
}

impl JobListParser {
    /// Create a new job list parser with the site's selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&JobListSelectors::default())
    }

    /// Create parser with custom selector configuration
    pub fn with_config(selectors: &JobListSelectors) -> ParsingResult<Self> {
        let link_pattern = Regex::new(&selectors.job_link_pattern).map_err(|e| {
            ParsingError::InvalidLinkPattern {
                pattern: selectors.job_link_pattern.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            link_selector: compile_selector(&selectors.job_link)?,
            link_pattern,
            job_number: FieldExtractor::compile(&selectors.job_number)?,
            brand: FieldExtractor::compile(&selectors.brand)?,
            title: FieldExtractor::compile(&selectors.title)?,
            date_posted: FieldExtractor::compile(&selectors.date_posted)?,
            location: FieldExtractor::compile(&selectors.location)?,
        })
    }

    /// Extract every listing on the page.
    ///
    /// Links whose `href` does not match `/jobs/{digits}` are ignored. A matching
    /// link with any empty field contributes its id to `failed_ids` instead of a
    /// record.
    pub fn scrape_page(&self, markup: &str) -> PageExtraction {
        let document = Html::parse_document(markup);
        let mut extraction = PageExtraction::default();

        for link in document.select(&self.link_selector) {
            let Some(local_id) = self.local_id(&link) else {
                continue;
            };

            match self.extract_job(&link) {
                Some(record) => extraction.records.push(record),
                None => {
                    debug!("Rejected listing /jobs/{}: a required field is empty", local_id);
                    extraction.failed_ids.push(local_id);
                }
            }
        }

        debug!(
            "Extracted {} jobs, {} rejected",
            extraction.records.len(),
            extraction.failed_ids.len()
        );
        extraction
    }

    /// Page-local id captured from a listing link's `href`
    fn local_id(&self, link: &ElementRef) -> Option<String> {
        let href = link.value().attr("href")?;
        self.link_pattern
            .captures(href)
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_string())
    }

    fn extract_job(&self, link: &ElementRef) -> Option<JobRecord> {
        JobRecord::from_fields(
            self.job_number.extract(link),
            self.brand.extract(link),
            self.title.extract(link),
            to_iso_date(&self.date_posted.extract(link)),
            self.location.extract(link),
        )
    }
}
