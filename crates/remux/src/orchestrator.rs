//! Concurrent execution of download jobs.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use raiplay_parser::Descriptor;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::RemuxConfig;
use crate::error::DownloadError;
use crate::events::StatusReporter;
use crate::job::DownloadJob;
use crate::outcome::{JobOutcome, Termination};

/// Runs download jobs, one at a time or on a bounded pool.
#[derive(Debug, Clone)]
pub struct DownloadOrchestrator {
    config: RemuxConfig,
    reporter: StatusReporter,
    cancel: CancellationToken,
}

impl DownloadOrchestrator {
    pub fn new(config: RemuxConfig) -> Self {
        Self {
            config,
            reporter: StatusReporter::log_only(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: StatusReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &RemuxConfig {
        &self.config
    }

    /// Number of hardware threads, used when no parallelism is given.
    pub fn default_parallelism() -> usize {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Kills running remux processes and keeps queued jobs from starting.
    ///
    /// Cancellation is permanent and shared by every clone: jobs submitted
    /// afterwards finish as cancelled without launching. Build a new
    /// orchestrator to download again.
    pub fn cancel(&self) {
        info!("cancelling downloads");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs exactly one job and waits for its outcome.
    pub async fn submit_one(&self, descriptor: Descriptor, output_dir: &Path) -> JobOutcome {
        let job = DownloadJob::new(descriptor, output_dir, &self.config);
        self.reporter.submitted(job.descriptor());
        let (descriptor, output_path) = fallback_identity(&job);

        let task = tokio::spawn(execute(job, self.reporter.clone(), self.cancel.clone()));
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => self.lost(descriptor, output_path, &e),
        }
    }

    /// Runs one job per descriptor with at most `parallelism` at a time.
    ///
    /// `None` uses [`default_parallelism`](Self::default_parallelism); zero is
    /// rejected before anything is launched. Returns once every job is
    /// terminal, in completion order. Jobs never affect one another.
    pub async fn submit_all(
        &self,
        descriptors: Vec<Descriptor>,
        output_dir: &Path,
        parallelism: Option<usize>,
    ) -> Result<Vec<JobOutcome>, DownloadError> {
        let parallelism = parallelism.unwrap_or_else(Self::default_parallelism);
        if parallelism == 0 {
            return Err(DownloadError::invalid_argument(
                "parallelism must be a positive integer",
            ));
        }

        let total = descriptors.len();
        info!(jobs = total, parallelism, output_dir = %output_dir.display(), "submitting downloads");

        let permits = Arc::new(Semaphore::new(parallelism.min(Semaphore::MAX_PERMITS)));
        let mut tasks = JoinSet::new();
        let mut identities = HashMap::with_capacity(total);

        for descriptor in descriptors {
            let job = DownloadJob::new(descriptor, output_dir, &self.config);
            self.reporter.submitted(job.descriptor());
            let identity = fallback_identity(&job);

            let permits = permits.clone();
            let reporter = self.reporter.clone();
            let cancel = self.cancel.clone();
            let handle = tasks.spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = permits.acquire_owned().await.ok();
                execute(job, reporter, cancel).await
            });
            identities.insert(handle.id(), identity);
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    identities.remove(&id);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    if let Some((descriptor, output_path)) = identities.remove(&e.id()) {
                        outcomes.push(self.lost(descriptor, output_path, &e));
                    }
                }
            }
        }

        let summary = OrchestratorSummary::from_outcomes(&outcomes);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "all downloads finished"
        );
        Ok(outcomes)
    }

    /// Outcome for a job whose task panicked or was aborted.
    fn lost(
        &self,
        descriptor: Descriptor,
        output_path: PathBuf,
        err: &tokio::task::JoinError,
    ) -> JobOutcome {
        error!(title = descriptor.title(), error = %err, "download task did not complete");
        let outcome = JobOutcome::new(
            descriptor,
            output_path,
            Termination::Errored {
                cause: format!("download task did not complete: {err}"),
            },
        );
        self.reporter.finished(&outcome);
        outcome
    }
}

fn fallback_identity(job: &DownloadJob) -> (Descriptor, PathBuf) {
    (
        job.descriptor().clone(),
        job.command().output_path().to_path_buf(),
    )
}

/// Runs a job and folds launch or wait errors into its outcome.
async fn execute(
    job: DownloadJob,
    reporter: StatusReporter,
    cancel: CancellationToken,
) -> JobOutcome {
    let (descriptor, output_path) = fallback_identity(&job);
    match job.run_until_cancelled(&reporter, &cancel).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(title = descriptor.title(), error = %err, "download job failed");
            JobOutcome::errored(descriptor, output_path, &err)
        }
    }
}

/// Tally of a batch of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl OrchestratorSummary {
    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, outcome| {
            acc.total += 1;
            if outcome.succeeded() {
                acc.succeeded += 1;
            } else if outcome.is_cancelled() {
                acc.cancelled += 1;
            } else {
                acc.failed += 1;
            }
            acc
        })
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}
