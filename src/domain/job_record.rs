use serde::{Deserialize, Serialize};

/// One normalized job posting, as submitted to the challenge ledger.
///
/// Every field is non-empty; candidates with an empty field are rejected by the
/// extractor and never become a `JobRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub employer_job_id: String,
    pub employer_name: String,
    pub title: String,
    /// ISO-8601 timestamp at UTC, e.g. `2017-02-03T00:00:00.000Z`
    pub posted_at: String,
    pub location: String,
}

impl JobRecord {
    /// Build a record from normalized fields, or `None` if any field is empty.
    pub fn from_fields(
        employer_job_id: String,
        employer_name: String,
        title: String,
        posted_at: String,
        location: String,
    ) -> Option<Self> {
        let fields = [&employer_job_id, &employer_name, &title, &posted_at, &location];
        if fields.iter().any(|field| field.is_empty()) {
            return None;
        }

        Some(Self {
            employer_job_id,
            employer_name,
            title,
            posted_at,
            location,
        })
    }
}

/// Identifiers assigned to one run, plus the session token that came with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestGrant {
    pub auth_token: String,
    pub job_ids: Vec<String>,
}

impl ManifestGrant {
    /// Number of listing pages needed to cover the manifest.
    ///
    /// `page_size` must be non-zero; config validation guarantees it.
    pub fn page_count(&self, page_size: usize) -> u32 {
        page_count(self.job_ids.len(), page_size)
    }
}

/// `ceil(job_count / page_size)`, saturating at `u32::MAX`.
pub fn page_count(job_count: usize, page_size: usize) -> u32 {
    u32::try_from(job_count.div_ceil(page_size)).unwrap_or(u32::MAX)
}

/// Records and rejected page-local ids extracted from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    pub records: Vec<JobRecord>,
    /// Link ids (`/jobs/{id}`) whose candidate failed the five-field rule
    pub failed_ids: Vec<String>,
}

impl PageExtraction {
    /// `employer_job_id`s of the extracted records, in page order.
    pub fn job_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.employer_job_id.clone())
            .collect()
    }
}
