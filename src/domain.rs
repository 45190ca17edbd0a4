//! Domain module - Core business types
//!
//! Job records, the manifest grant, the completion ledger and the run report.
//! Nothing in here performs I/O.

pub mod constants;
pub mod job_record;
pub mod ledger;
pub mod report;

// Re-export commonly used items for convenience
pub use job_record::{JobRecord, ManifestGrant, PageExtraction, page_count};
pub use ledger::{Confirmation, JobLedger};
pub use report::{PageOutcome, PageStatus, RunOutcome, RunReport};
