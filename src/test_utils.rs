//! Test utilities for job-scraper
//!
//! A scripted in-memory challenge client and markup builders, so controller
//! scenarios run without a network.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::{JobRecord, ManifestGrant};
use crate::infrastructure::challenge_client::{ChallengeClient, ClientError};

/// Calls observed by `MockChallengeClient`
#[derive(Debug, Default, Clone)]
pub struct CallLog {
    pub manifest_requests: u32,
    /// Page number of every fetch attempt, in call order
    pub fetches: Vec<u32>,
    /// `(page, employer_job_ids)` of every submitted batch
    pub submissions: Vec<(u32, Vec<String>)>,
    pub completions: u32,
}

impl CallLog {
    pub fn fetch_attempts(&self, page: u32) -> usize {
        self.fetches.iter().filter(|p| **p == page).count()
    }

    /// Distinct pages fetched, sorted
    pub fn pages_fetched(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.fetches.iter().copied().collect::<HashSet<_>>().into_iter().collect();
        pages.sort_unstable();
        pages
    }
}

/// Scripted challenge client
pub struct MockChallengeClient {
    manifest: Option<Vec<String>>,
    pages: HashMap<u32, String>,
    /// Remaining scripted fetch failures per page
    fetch_failures: Mutex<HashMap<u32, u32>>,
    batch_ack: bool,
    batch_error: bool,
    completion_ack: bool,
    calls: Mutex<CallLog>,
}

impl MockChallengeClient {
    pub fn new(manifest: &[&str]) -> Self {
        Self {
            manifest: Some(manifest.iter().map(|id| (*id).to_string()).collect()),
            pages: HashMap::new(),
            fetch_failures: Mutex::new(HashMap::new()),
            batch_ack: true,
            batch_error: false,
            completion_ack: true,
            calls: Mutex::new(CallLog::default()),
        }
    }

    /// Manifest request fails
    pub fn without_manifest() -> Self {
        Self {
            manifest: None,
            ..Self::new(&[])
        }
    }

    /// Serve `markup` for `page`; unscripted pages serve an empty document
    pub fn with_page(mut self, page: u32, markup: impl Into<String>) -> Self {
        self.pages.insert(page, markup.into());
        self
    }

    /// First `count` fetches of `page` fail
    pub fn failing_fetches(self, page: u32, count: u32) -> Self {
        if let Ok(mut failures) = self.fetch_failures.lock() {
            failures.insert(page, count);
        }
        self
    }

    pub fn rejecting_batches(mut self) -> Self {
        self.batch_ack = false;
        self
    }

    pub fn erroring_batches(mut self) -> Self {
        self.batch_error = true;
        self
    }

    pub fn refusing_completion(mut self) -> Self {
        self.completion_ack = false;
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn rejected(endpoint: &str) -> ClientError {
        ClientError::Rejected {
            endpoint: endpoint.to_string(),
            body: "scripted failure".to_string(),
        }
    }
}

#[async_trait]
impl ChallengeClient for MockChallengeClient {
    async fn request_manifest(&self) -> Result<ManifestGrant, ClientError> {
        if let Ok(mut log) = self.calls.lock() {
            log.manifest_requests += 1;
        }

        self.manifest
            .clone()
            .map(|job_ids| ManifestGrant {
                auth_token: "mock-token".to_string(),
                job_ids,
            })
            .ok_or_else(|| Self::rejected("challenges"))
    }

    async fn fetch_page(&self, page: u32) -> Result<String, ClientError> {
        if let Ok(mut log) = self.calls.lock() {
            log.fetches.push(page);
        }

        let should_fail = self
            .fetch_failures
            .lock()
            .ok()
            .and_then(|mut failures| {
                failures.get_mut(&page).filter(|left| **left > 0).map(|left| {
                    *left -= 1;
                })
            })
            .is_some();

        if should_fail {
            return Err(Self::rejected("jobs"));
        }

        Ok(self
            .pages
            .get(&page)
            .cloned()
            .unwrap_or_else(|| "<html></html>".to_string()))
    }

    async fn submit_batch(&self, records: &[JobRecord], page: u32) -> Result<bool, ClientError> {
        if let Ok(mut log) = self.calls.lock() {
            let ids = records.iter().map(|r| r.employer_job_id.clone()).collect();
            log.submissions.push((page, ids));
        }

        if self.batch_error {
            return Err(Self::rejected("jobs/batch"));
        }
        Ok(self.batch_ack)
    }

    async fn complete_challenge(&self) -> Result<bool, ClientError> {
        if let Ok(mut log) = self.calls.lock() {
            log.completions += 1;
        }
        Ok(self.completion_ack)
    }
}

/// Markup for one valid listing whose job number is `job_id`.
pub fn valid_listing(local_id: &str, job_id: &str) -> String {
    format!(
        r#"<li><a href="/jobs/{local_id}">
            <span class="job-date-posted"><strong>Posted on:</strong> Feb 03, 2017</span>
            <span class="job-title">Brand Associate - Old Navy</span>
            <span class="job-number"><strong>Job#:</strong> {job_id}</span>
            <span class="job-location"><strong>Primary Location:</strong> Moen Stream</br> Haleyberg, PW 19505-6761</span>
            <span class="job-brand"><strong>Brand:</strong> Old Navy</span>
        </a></li>"#
    )
}

/// Markup for one listing that fails extraction (no title separator).
pub fn invalid_listing(local_id: &str, job_id: &str) -> String {
    format!(
        r#"<li><a href="/jobs/{local_id}">
            <span class="job-date-posted"><strong>Posted on:</strong> Feb 03, 2017</span>
            <span class="job-title">Brand Associate : Old Navy</span>
            <span class="job-number"><strong>Job#:</strong> {job_id}</span>
            <span class="job-location"><strong>Primary Location:</strong> Moen Stream</span>
            <span class="job-brand"><strong>Brand:</strong> Old Navy</span>
        </a></li>"#
    )
}

/// Wrap listings in a page document.
pub fn listing_page(listings: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><body><section id=\"search-results-list\"><ul>{}</ul></section></body></html>",
        listings.concat()
    )
}
