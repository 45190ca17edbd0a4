//! Run controller - manifest, page fan-out, ledger verdict
//!
//! One run requests the manifest, seeds the ledger, spawns one independent task
//! per listing page and waits for every task to settle. The ledger alone decides
//! the verdict: empty means the completion call is sent, anything left over
//! becomes a `RunReport`.

use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::domain::constants::site;
use crate::domain::{JobLedger, PageOutcome, PageStatus, RunOutcome, RunReport};
use crate::infrastructure::challenge_client::{ChallengeClient, ClientError};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::parsing::{JobListParser, PageExtractor, ParsingError};
use crate::infrastructure::retry_policy::{Retried, RetryError, RetryPolicy};

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to obtain the job manifest: {0}")]
    Manifest(#[source] ClientError),

    #[error("Completion call failed: {0}")]
    Completion(#[source] ClientError),
}

/// Controller settings, usually taken from `AppConfig`
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub page_size: usize,
    pub max_concurrent_pages: Option<usize>,
    pub retry: RetryPolicy,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            page_size: site::JOBS_PER_PAGE,
            max_concurrent_pages: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&AppConfig> for ScraperSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.scraping.page_size,
            max_concurrent_pages: config.scraping.max_concurrent_pages,
            retry: config.retry.clone(),
        }
    }
}

/// Drives one scraping run against a challenge service.
pub struct JobScraper {
    client: Arc<dyn ChallengeClient>,
    extractor: Arc<dyn PageExtractor>,
    settings: ScraperSettings,
    cancellation_token: CancellationToken,
}

impl JobScraper {
    /// Controller using the site's `JobListParser`.
    pub fn new(client: Arc<dyn ChallengeClient>, settings: ScraperSettings) -> Result<Self, ParsingError> {
        let parser = JobListParser::new()?;
        Ok(Self::with_extractor(client, Arc::new(parser), settings))
    }

    pub fn with_extractor(
        client: Arc<dyn ChallengeClient>,
        extractor: Arc<dyn PageExtractor>,
        settings: ScraperSettings,
    ) -> Self {
        Self {
            client,
            extractor,
            settings,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Token that cancels every in-flight page task of this controller.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Execute one run.
    ///
    /// Only a failed manifest request or a failed completion call is an `Err`;
    /// every per-page failure ends up in the ledger state and the report.
    pub async fn run(&self) -> Result<RunOutcome, RunError> {
        let run_id = Uuid::new_v4();
        self.execute(run_id)
            .instrument(info_span!("scrape_run", %run_id))
            .await
    }

    async fn execute(&self, run_id: Uuid) -> Result<RunOutcome, RunError> {
        info!("🚀 Requesting job manifest");
        let grant = self
            .client
            .request_manifest()
            .await
            .map_err(|e| {
                error!("❌ Manifest request failed, aborting run: {}", e);
                RunError::Manifest(e)
            })?;

        let ledger = JobLedger::new();
        let duplicate_manifest_ids = ledger.seed(grant.job_ids.iter().cloned()).await;
        if !duplicate_manifest_ids.is_empty() {
            warn!("⚠️ Manifest lists {} ids more than once: {:?}", duplicate_manifest_ids.len(), duplicate_manifest_ids);
        }

        let pages = grant.page_count(self.settings.page_size.max(1));
        let semaphore = self
            .settings
            .max_concurrent_pages
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        info!(
            "📋 Manifest holds {} ids, launching {} page tasks (cap: {:?})",
            grant.job_ids.len(),
            pages,
            self.settings.max_concurrent_pages
        );

        let page_numbers = site::PAGE_NUMBERING_BASE..site::PAGE_NUMBERING_BASE.saturating_add(pages);
        let tasks: Vec<_> = page_numbers
            .clone()
            .map(|page| {
                let task = PageTask {
                    page,
                    client: Arc::clone(&self.client),
                    extractor: Arc::clone(&self.extractor),
                    ledger: ledger.clone(),
                    retry: self.settings.retry.clone(),
                    cancel: self.cancellation_token.clone(),
                    semaphore: semaphore.clone(),
                };
                tokio::spawn(task.run().instrument(info_span!("page_task", page)))
            })
            .collect();

        let page_outcomes: Vec<PageOutcome> = page_numbers
            .zip(join_all(tasks).await)
            .map(|(page, joined)| {
                joined.unwrap_or_else(|e| {
                    error!("💥 Page {} task aborted: {}", page, e);
                    PageOutcome::new(page, PageStatus::Aborted { reason: e.to_string() })
                })
            })
            .collect();

        let failed_ids: Vec<String> = page_outcomes
            .iter()
            .flat_map(|outcome| outcome.failed_ids.iter().cloned())
            .collect();

        if ledger.is_complete().await {
            if !failed_ids.is_empty() {
                warn!("⚠️ Ledger emptied despite {} rejected listings: {:?}", failed_ids.len(), failed_ids);
            }

            info!("🏁 All manifest ids confirmed, signalling completion");
            let acknowledged = self.client.complete_challenge().await.map_err(|e| {
                error!("❌ Completion call failed: {}", e);
                RunError::Completion(e)
            })?;

            if acknowledged {
                info!("✅ Completion acknowledged");
            } else {
                warn!("❌ Completion was not acknowledged");
            }
            return Ok(RunOutcome::Completed { run_id, acknowledged });
        }

        let report = RunReport {
            run_id,
            pages,
            remaining_ids: ledger.remaining().await,
            failed_ids,
            transport_failures: page_outcomes
                .iter()
                .filter(|outcome| matches!(outcome.status, PageStatus::TransportFailed { .. }))
                .map(|outcome| outcome.page)
                .collect(),
            duplicate_manifest_ids,
            unexpected_ids: page_outcomes
                .iter()
                .flat_map(|outcome| outcome.unexpected_ids.iter().cloned())
                .collect(),
            cancelled: self.cancellation_token.is_cancelled()
                || page_outcomes.iter().any(|outcome| outcome.status == PageStatus::Cancelled),
            page_outcomes,
        };

        warn!(
            "❌ Run incomplete: {} ids outstanding, {} listings rejected, {} pages unreachable",
            report.remaining_ids.len(),
            report.failed_ids.len(),
            report.transport_failures.len()
        );
        Ok(RunOutcome::Incomplete(report))
    }
}

/// fetch → extract → submit → confirm for one page
struct PageTask {
    page: u32,
    client: Arc<dyn ChallengeClient>,
    extractor: Arc<dyn PageExtractor>,
    ledger: JobLedger,
    retry: RetryPolicy,
    cancel: CancellationToken,
    semaphore: Option<Arc<Semaphore>>,
}

impl PageTask {
    async fn run(self) -> PageOutcome {
        let page = self.page;

        let _permit = match &self.semaphore {
            Some(semaphore) => tokio::select! {
                biased;
                () = self.cancel.cancelled() => return PageOutcome::new(page, PageStatus::Cancelled),
                permit = Arc::clone(semaphore).acquire_owned() => match permit {
                    Ok(permit) => Some(permit),
                    Err(e) => return PageOutcome::new(page, PageStatus::Aborted { reason: e.to_string() }),
                },
            },
            None => None,
        };

        let client = &self.client;
        let fetched = self
            .retry
            .run(&self.cancel, move |attempt| {
                debug!("📄 Fetching page {} (attempt {})", page, attempt);
                client.fetch_page(page)
            })
            .await;

        let (markup, fetch_attempts) = match fetched {
            Ok(Retried { value, attempts }) => (value, attempts),
            Err(RetryError::Exhausted { attempts, last_error }) => {
                error!("❌ Page {} unreachable after {} attempts: {}", page, attempts, last_error);
                return PageOutcome {
                    fetch_attempts: attempts,
                    ..PageOutcome::new(page, PageStatus::TransportFailed { reason: last_error.to_string() })
                };
            }
            Err(RetryError::Cancelled { attempts }) => {
                warn!("🛑 Page {} cancelled during fetch", page);
                return PageOutcome {
                    fetch_attempts: attempts,
                    ..PageOutcome::new(page, PageStatus::Cancelled)
                };
            }
        };

        let extraction = self.extractor.scrape_page(&markup);
        if !extraction.failed_ids.is_empty() {
            warn!("⚠️ Page {} rejected listings {:?}", page, extraction.failed_ids);
        }
        debug!("Page {} yielded {} records", page, extraction.records.len());

        let mut outcome = PageOutcome {
            fetch_attempts,
            records_extracted: extraction.records.len(),
            failed_ids: extraction.failed_ids.clone(),
            ..PageOutcome::new(page, PageStatus::Rejected)
        };

        let submitted = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                warn!("🛑 Page {} cancelled before submission settled", page);
                outcome.status = PageStatus::Cancelled;
                return outcome;
            }
            submitted = client.submit_batch(&extraction.records, page) => submitted,
        };

        outcome.status = match submitted {
            Ok(true) => {
                let confirmation = self
                    .ledger
                    .confirm(extraction.records.iter().map(|record| record.employer_job_id.as_str()))
                    .await;
                if !confirmation.unknown.is_empty() {
                    warn!(
                        "⚠️ Page {} confirmed ids that were not outstanding: {:?}",
                        page, confirmation.unknown
                    );
                }
                info!("✅ Page {} confirmed {} ids", page, confirmation.removed.len());
                outcome.unexpected_ids = confirmation.unknown;
                PageStatus::Confirmed {
                    confirmed: confirmation.removed.len(),
                }
            }
            Ok(false) => {
                warn!("❌ Batch for page {} was not acknowledged", page);
                PageStatus::Rejected
            }
            Err(e) => {
                warn!("❌ Batch for page {} failed: {}", page, e);
                PageStatus::SubmissionFailed { reason: e.to_string() }
            }
        };

        outcome
    }
}
