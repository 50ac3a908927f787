// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Worker loop.
//!
//! Pulls jobs from a [`JobSource`] and runs each one on its own task, with at
//! most `max_concurrent_jobs` running at once. A failed job never stops the
//! loop. The loop ends when the source is exhausted or fails, or when
//! shutdown is signalled; in the latter case running jobs are aborted.

use std::sync::Arc;

use tokio::sync::{Notify, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::source::JobSource;
use crate::workflow::{JobExecution, JobRunner};

/// Outcome counts for one worker run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    /// Jobs that reached `Completed`
    pub completed: usize,
    /// Jobs that reached `Failed` (or whose task panicked)
    pub failed: usize,
    /// Messages from the source that could not be decoded
    pub rejected: usize,
    /// Jobs aborted by shutdown
    pub cancelled: usize,
}

impl WorkerSummary {
    fn record(&mut self, result: Result<JobExecution, JoinError>) {
        match result {
            Ok(execution) if execution.is_completed() => self.completed += 1,
            Ok(_) => self.failed += 1,
            Err(e) if e.is_cancelled() => self.cancelled += 1,
            Err(e) => {
                error!(error = %e, "Job task panicked");
                self.failed += 1;
            }
        }
    }
}

/// Runs jobs from a source with bounded concurrency.
pub struct Worker {
    runner: Arc<JobRunner>,
    max_concurrent_jobs: usize,
    shutdown: Arc<Notify>,
}

impl Worker {
    /// `max_concurrent_jobs` is clamped to at least 1.
    pub fn new(runner: Arc<JobRunner>, max_concurrent_jobs: usize) -> Self {
        Self {
            runner,
            max_concurrent_jobs: max_concurrent_jobs.max(1),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs
    }

    /// Run until the source ends or shutdown is signalled.
    pub async fn run<S: JobSource>(&self, mut source: S) -> WorkerSummary {
        info!(
            max_concurrent_jobs = self.max_concurrent_jobs,
            jobs_root = %self.runner.jobs_root().display(),
            "Worker started"
        );

        let permits = Arc::new(Semaphore::new(self.max_concurrent_jobs));
        let mut jobs: JoinSet<JobExecution> = JoinSet::new();
        let mut summary = WorkerSummary::default();

        let shutdown = self.shutdown.notified();
        tokio::pin!(shutdown);

        loop {
            while let Some(result) = jobs.try_join_next() {
                summary.record(result);
            }

            let permit = tokio::select! {
                _ = &mut shutdown => {
                    info!(running = jobs.len(), "Worker shutting down");
                    jobs.abort_all();
                    break;
                }
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let next = tokio::select! {
                _ = &mut shutdown => {
                    info!(running = jobs.len(), "Worker shutting down");
                    jobs.abort_all();
                    break;
                }
                next = source.next_job() => next,
            };

            match next {
                Ok(Some(job)) => {
                    let runner = self.runner.clone();
                    jobs.spawn(async move {
                        let _permit = permit;
                        runner.run(job).await
                    });
                }
                Ok(None) => {
                    info!("Job source exhausted");
                    break;
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Job source failed, no further jobs will be accepted");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Rejected job message");
                    summary.rejected += 1;
                }
            }
        }

        while let Some(result) = jobs.join_next().await {
            summary.record(result);
        }

        info!(
            completed = summary.completed,
            failed = summary.failed,
            rejected = summary.rejected,
            cancelled = summary.cancelled,
            "Worker stopped"
        );
        summary
    }
}
