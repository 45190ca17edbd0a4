//! Completion ledger for one scraping run
//!
//! The ledger holds the manifest ids that have not yet been confirmed as
//! submitted. Page tasks run on the multi-threaded runtime, so the set sits
//! behind a mutex even though pages normally confirm disjoint ids.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Result of a `confirm` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Confirmation {
    /// Ids that were outstanding and are now removed
    pub removed: Vec<String>,
    /// Ids that were not outstanding (unknown, or already confirmed)
    pub unknown: Vec<String>,
}

/// Remove-only set of outstanding job ids, shared by all page tasks.
#[derive(Debug, Clone, Default)]
pub struct JobLedger {
    outstanding: Arc<Mutex<BTreeSet<String>>>,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the outstanding set from the manifest.
    ///
    /// Returns the ids that appeared more than once in `ids`.
    pub async fn seed<I>(&self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut outstanding = self.outstanding.lock().await;
        if !outstanding.is_empty() {
            warn!("Ledger re-seeded with {} ids still outstanding", outstanding.len());
            outstanding.clear();
        }

        let mut duplicates = Vec::new();
        for id in ids {
            if !outstanding.insert(id.clone()) {
                duplicates.push(id);
            }
        }

        debug!("Ledger seeded with {} outstanding ids", outstanding.len());
        duplicates
    }

    /// Remove `ids` from the outstanding set. Absent ids are a no-op.
    pub async fn confirm<'a, I>(&self, ids: I) -> Confirmation
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut outstanding = self.outstanding.lock().await;
        let mut confirmation = Confirmation::default();

        for id in ids {
            if outstanding.remove(id) {
                confirmation.removed.push(id.to_string());
            } else {
                confirmation.unknown.push(id.to_string());
            }
        }

        confirmation
    }

    pub async fn is_complete(&self) -> bool {
        self.outstanding.lock().await.is_empty()
    }

    /// Snapshot of the outstanding ids, sorted.
    pub async fn remaining(&self) -> Vec<String> {
        self.outstanding.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.outstanding.lock().await.len()
    }
}
