pub mod certfr;
pub mod common;
pub mod nvd;

use crate::catalog::Catalog;
use common::{FetchError, SourceAdapter, Target};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use vigil_module_ingestor::{graph::RecordSet, service::IngestorService};

/// Options controlling one fetch run.
#[derive(Clone, Debug)]
pub struct RunnerOptions {
    /// Concurrent in-flight fetches.
    pub concurrency: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self { concurrency: 5 }
    }
}

/// Outcome of one run: what was fetched, skipped and failed.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Targets fetched successfully.
    pub fetched: usize,
    /// Targets satisfied by the catalog, not fetched.
    pub skipped: Vec<Target>,
    /// Malformed records dropped during ingestion.
    pub dropped: usize,
    /// Per-target failures; the run continued past every one of them.
    pub errors: Vec<(Target, FetchError)>,
    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
}

impl RunReport {
    pub fn merge(&mut self, other: RunReport) {
        self.fetched += other.fetched;
        self.skipped.extend(other.skipped);
        self.dropped += other.dropped;
        self.errors.extend(other.errors);
        self.cancelled |= other.cancelled;
    }
}

/// Drives a set of targets through a source adapter and merges the
/// results into a shared [`RecordSet`].
pub struct Runner {
    options: RunnerOptions,
    token: CancellationToken,
}

impl Runner {
    pub fn new(options: RunnerOptions) -> Self {
        Self {
            options,
            token: CancellationToken::new(),
        }
    }

    /// Token for cancelling the run from outside. Cancellation is
    /// cooperative: it takes effect between target fetches.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Fetch every target and merge the results.
    ///
    /// Fetches run concurrently up to the configured limit; merges into
    /// the record set are serialized behind the lock. A failing target is
    /// recorded and skipped, it never aborts the run. Targets already
    /// satisfied by the catalog are not fetched at all.
    #[instrument(skip_all, fields(targets = targets.len()))]
    pub async fn run<A: SourceAdapter>(
        &self,
        adapter: &A,
        catalog: &Catalog,
        targets: Vec<Target>,
        records: &Mutex<RecordSet>,
    ) -> RunReport {
        let ingestor = IngestorService::new();
        let mut report = RunReport::default();

        let (skipped, live): (Vec<_>, Vec<_>) =
            targets.into_iter().partition(|target| match target {
                Target::Vulnerability(id) => catalog.contains(id),
                Target::Advisory(_) => false,
            });
        report.skipped = skipped;

        let mut outcomes = stream::iter(live.into_iter().map(|target| async move {
            let outcome = adapter.fetch(&target).await;
            (target, outcome)
        }))
        .buffer_unordered(self.options.concurrency.max(1));

        while let Some((target, outcome)) = outcomes.next().await {
            match outcome {
                Ok(batch) => {
                    report.fetched += 1;
                    let mut records = records.lock();
                    report.dropped += ingestor.ingest(&mut records, batch);
                }
                Err(err) => {
                    log::warn!("skipping {target}: {err}");
                    report.errors.push((target, err));
                }
            }

            // cooperative cancellation between targets; fetches already
            // in flight complete or fail on their own
            if self.token.is_cancelled() {
                report.cancelled = true;
                break;
            }
        }

        report
    }
}
