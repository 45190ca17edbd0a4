//! Run outcome and diagnostic report types

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// How a single page task settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    /// Batch acknowledged and its ids confirmed against the ledger
    Confirmed { confirmed: usize },
    /// Batch submitted but the service did not acknowledge it
    Rejected,
    /// Batch submission failed at transport level
    SubmissionFailed { reason: String },
    /// Every fetch attempt failed
    TransportFailed { reason: String },
    /// Run was cancelled before the page settled
    Cancelled,
    /// The page task panicked
    Aborted { reason: String },
}

/// Per-page diagnostics collected by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOutcome {
    pub page: u32,
    pub fetch_attempts: u32,
    pub records_extracted: usize,
    pub failed_ids: Vec<String>,
    /// Confirmed ids that were not outstanding (another page or unknown)
    pub unexpected_ids: Vec<String>,
    #[serde(flatten)]
    pub status: PageStatus,
}

impl PageOutcome {
    pub const fn new(page: u32, status: PageStatus) -> Self {
        Self {
            page,
            fetch_attempts: 0,
            records_extracted: 0,
            failed_ids: Vec::new(),
            unexpected_ids: Vec::new(),
            status,
        }
    }
}

/// Diagnostic report for a run whose ledger never emptied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub pages: u32,
    /// Manifest ids never confirmed, sorted
    pub remaining_ids: Vec<String>,
    /// Page-local ids rejected by the extractor, in page order
    pub failed_ids: Vec<String>,
    /// Pages whose fetch exhausted its retry budget
    pub transport_failures: Vec<u32>,
    /// Manifest ids listed more than once
    pub duplicate_manifest_ids: Vec<String>,
    /// Confirmed ids that were not outstanding at confirmation time
    pub unexpected_ids: Vec<String>,
    pub cancelled: bool,
    pub page_outcomes: Vec<PageOutcome>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Failed to scrape jobs (run {}, {} pages).", self.run_id, self.pages)?;
        writeln!(f, "remainingIds={}", self.remaining_ids.join(","))?;
        write!(f, "failedIds={}", self.failed_ids.join(","))?;
        if !self.transport_failures.is_empty() {
            let pages: Vec<String> = self.transport_failures.iter().map(u32::to_string).collect();
            write!(f, "\ntransportFailedPages={}", pages.join(","))?;
        }
        if !self.duplicate_manifest_ids.is_empty() {
            write!(f, "\nduplicateManifestIds={}", self.duplicate_manifest_ids.join(","))?;
        }
        if !self.unexpected_ids.is_empty() {
            write!(f, "\nunexpectedIds={}", self.unexpected_ids.join(","))?;
        }
        if self.cancelled {
            write!(f, "\ncancelled=true")?;
        }
        Ok(())
    }
}

/// Terminal outcome of a run that got past the manifest request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Ledger emptied and the completion call answered
    Completed { run_id: Uuid, acknowledged: bool },
    /// Ledger still held ids after every page settled; completion never sent
    Incomplete(RunReport),
}

impl RunOutcome {
    /// True only when the service acknowledged completion.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { acknowledged: true, .. })
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Completed { .. } => None,
            Self::Incomplete(report) => Some(report),
        }
    }
}
