//! Selector configuration for job listing extraction
//!
//! Field locations and separators are fixed by the listing site's markup.

use crate::domain::constants::site;

/// How one labeled field is located and stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocator {
    /// CSS selector evaluated inside the listing link
    pub selector: String,
    /// Separator between label and value
    pub separator: char,
    /// Segment kept after splitting on `separator`
    pub segment: usize,
}

impl FieldLocator {
    fn labeled(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            separator: ':',
            segment: 1,
        }
    }
}

/// CSS selectors for job list pages
#[derive(Debug, Clone)]
pub struct JobListSelectors {
    /// Elements whose `href` identifies a listing
    pub job_link: String,
    /// Regex applied to `href`; group 1 is the page-local id
    pub job_link_pattern: String,
    pub job_number: FieldLocator,
    pub brand: FieldLocator,
    /// `"{title} - {brand}"`, so the value sits before the separator
    pub title: FieldLocator,
    pub date_posted: FieldLocator,
    pub location: FieldLocator,
}

impl Default for JobListSelectors {
    fn default() -> Self {
        Self {
            job_link: "a".to_string(),
            job_link_pattern: site::JOB_LINK_PATTERN.to_string(),
            job_number: FieldLocator::labeled(".job-number"),
            brand: FieldLocator::labeled(".job-brand"),
            title: FieldLocator {
                selector: ".job-title".to_string(),
                separator: '-',
                segment: 0,
            },
            date_posted: FieldLocator::labeled(".job-date-posted"),
            location: FieldLocator::labeled(".job-location"),
        }
    }
}
