use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::scanner::WorkUnit;

/// Final state of one work unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Nothing to do: no eligible tracks, or the file already carries
    /// target-format subtitles
    Skipped,
    /// Remux performed and temporaries removed
    Completed,
    /// An unrecoverable error aborted this file only
    Failed(String),
}

/// Per-outcome counts for one batch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed => self.completed += 1,
            JobOutcome::Skipped => self.skipped += 1,
            JobOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

/// Processes one work unit to completion. Implementations report errors
/// through the returned outcome instead of propagating them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnitProcessor: Send + Sync {
    async fn process(&self, unit: &WorkUnit) -> JobOutcome;
}

/// Bounded job scheduler: admits at most `max_concurrency` units at a time
/// and waits for every launched unit before returning.
///
/// The permit gate is owned by the scheduler instance; independent
/// schedulers carry independent ceilings.
pub struct JobScheduler {
    permits: Arc<Semaphore>,
}

impl JobScheduler {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Launch one task per unit and block until all of them have settled.
    ///
    /// Every task is spawned immediately but performs no file I/O or
    /// subprocess work before it holds a permit; the permit is released
    /// when the task finishes, whatever the outcome. A panicking processor
    /// is absorbed at the join point and counted as a failure.
    pub async fn run_all(
        &self,
        units: Vec<WorkUnit>,
        processor: Arc<dyn UnitProcessor>,
    ) -> BatchSummary {
        let mut jobs = JoinSet::new();

        for unit in units {
            let permits = Arc::clone(&self.permits);
            let processor = Arc::clone(&processor);
            jobs.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return JobOutcome::Failed(
                            "scheduler gate closed before admission".to_string(),
                        )
                    }
                };

                info!("Starting job for {}", unit.path.display());
                let outcome = processor.process(&unit).await;
                match &outcome {
                    JobOutcome::Completed => info!("Completed job for {}", unit.path.display()),
                    JobOutcome::Skipped => info!("Skipped {}", unit.path.display()),
                    JobOutcome::Failed(reason) => {
                        error!("Job for {} failed: {}", unit.path.display(), reason)
                    }
                }
                outcome
            });
        }

        let mut summary = BatchSummary::default();
        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("Job task aborted: {}", e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
