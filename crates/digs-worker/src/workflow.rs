// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Job execution workflow.
//!
//! Turns one [`PerformBwaJob`] into a populated workspace. Every step runs in
//! a fixed order; there is no parallelism inside a job.
//!
//! ```text
//! Accepted → ResolvingReads → ResolvingReference → WorkspaceReady
//!          → FetchingReads → FetchingReference → Completed
//!
//! any non-terminal state ──failure──► Failed
//! ```
//!
//! A failure is terminal for the job. Files already written to the workspace
//! are left in place.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use digs_protocol::{ChunkRange, PerformBwaJob, SEARCH_BY_FILE_ID};
use tracing::{debug, error, field, info, instrument, warn};

use crate::error::JobError;
use crate::retry::RetryPolicy;
use crate::traits::{AlignmentHandoff, ChunkFetcher, LocationResolver, LogHandoff};
use crate::workspace::{JobId, JobWorkspace};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Accepted,
    ResolvingReads,
    ResolvingReference,
    WorkspaceReady,
    FetchingReads,
    FetchingReference,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::ResolvingReads => "resolving_reads",
            Self::ResolvingReference => "resolving_reference",
            Self::WorkspaceReady => "workspace_ready",
            Self::FetchingReads => "fetching_reads",
            Self::FetchingReference => "fetching_reference",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` may follow this state.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;

        match (*self, next) {
            (Completed | Failed, _) => false,
            (_, Failed) => true,
            (Accepted, ResolvingReads)
            | (ResolvingReads, ResolvingReference)
            | (ResolvingReference, WorkspaceReady)
            | (WorkspaceReady, FetchingReads)
            | (FetchingReads, FetchingReference)
            | (FetchingReference, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one job's run through the workflow.
#[derive(Debug)]
pub struct JobExecution {
    job: PerformBwaJob,
    job_id: Option<JobId>,
    workspace: Option<JobWorkspace>,
    state: JobState,
    history: Vec<JobState>,
    failure: Option<JobError>,
    failed_during: Option<JobState>,
    reads_bytes: Option<u64>,
    reference_bytes: Option<u64>,
    accepted_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl JobExecution {
    fn accepted(job: PerformBwaJob) -> Self {
        Self {
            job,
            job_id: None,
            workspace: None,
            state: JobState::Accepted,
            history: vec![JobState::Accepted],
            failure: None,
            failed_during: None,
            reads_bytes: None,
            reference_bytes: None,
            accepted_at: Utc::now(),
            finished_at: None,
        }
    }

    fn advance(&mut self, next: JobState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "Ignoring invalid job state transition");
            return;
        }
        debug!(from = %self.state, to = %next, "Job state transition");
        self.state = next;
        self.history.push(next);
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }

    fn fail(&mut self, err: JobError) {
        self.failed_during = Some(self.state);
        self.failure = Some(err);
        self.advance(JobState::Failed);
    }

    /// The job description as received.
    pub fn job(&self) -> &PerformBwaJob {
        &self.job
    }

    /// Assigned once the workspace is created.
    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    pub fn workspace(&self) -> Option<&JobWorkspace> {
        self.workspace.as_ref()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Every state visited, in order, starting with `Accepted`.
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    pub fn failure(&self) -> Option<&JobError> {
        self.failure.as_ref()
    }

    /// State the job was in when it failed.
    pub fn failed_during(&self) -> Option<JobState> {
        self.failed_during
    }

    pub fn reads_bytes(&self) -> Option<u64> {
        self.reads_bytes
    }

    pub fn reference_bytes(&self) -> Option<u64> {
        self.reference_bytes
    }

    pub fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_completed(&self) -> bool {
        self.state == JobState::Completed
    }
}

/// Executes jobs against a resolver, a fetcher, and a jobs directory.
pub struct JobRunner {
    resolver: Arc<dyn LocationResolver>,
    fetcher: Arc<dyn ChunkFetcher>,
    handoff: Arc<dyn AlignmentHandoff>,
    jobs_root: PathBuf,
    retry: RetryPolicy,
}

impl JobRunner {
    /// Create a runner that logs completed workspaces and never retries.
    pub fn new(
        resolver: Arc<dyn LocationResolver>,
        fetcher: Arc<dyn ChunkFetcher>,
        jobs_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            handoff: Arc::new(LogHandoff),
            jobs_root: jobs_root.into(),
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_handoff(mut self, handoff: Arc<dyn AlignmentHandoff>) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn jobs_root(&self) -> &Path {
        &self.jobs_root
    }

    /// Run one job to `Completed` or `Failed`.
    ///
    /// Never panics on job errors; the outcome is in the returned execution.
    #[instrument(
        skip(self, job),
        fields(
            reads_data = %job.reads_data,
            reference_genome = %job.reference_genome,
            job_id = field::Empty,
        )
    )]
    pub async fn run(&self, job: PerformBwaJob) -> JobExecution {
        debug!(?job, "Accepting job");
        let mut execution = JobExecution::accepted(job.clone());

        match self.execute(&job, &mut execution).await {
            Ok(()) => {
                info!(
                    reads_bytes = execution.reads_bytes,
                    reference_bytes = execution.reference_bytes,
                    "Job completed"
                );
            }
            Err(e) => {
                error!(
                    state = %execution.state,
                    error_code = e.error_code(),
                    error = %e,
                    "Job failed"
                );
                execution.fail(e);
            }
        }

        execution
    }

    async fn execute(
        &self,
        job: &PerformBwaJob,
        execution: &mut JobExecution,
    ) -> Result<(), JobError> {
        let reads_range = job
            .range()
            .map_err(|e| JobError::InvalidJob(e.to_string()))?;
        let resolver = &*self.resolver;
        let fetcher = &*self.fetcher;

        execution.advance(JobState::ResolvingReads);
        let reads_data = job.reads_data.as_str();
        let reads_location = self
            .retry
            .run("resolve reads data", move || {
                resolver.resolve(SEARCH_BY_FILE_ID, reads_data)
            })
            .await?;
        info!(
            address = %reads_location.address,
            path = %reads_location.path,
            "Reads data node located"
        );

        execution.advance(JobState::ResolvingReference);
        let reference_genome = job.reference_genome.as_str();
        let reference_location = self
            .retry
            .run("resolve reference genome", move || {
                resolver.resolve(SEARCH_BY_FILE_ID, reference_genome)
            })
            .await?;
        info!(
            address = %reference_location.address,
            path = %reference_location.path,
            "Reference genome node located"
        );

        let job_id = JobId::new();
        tracing::Span::current().record("job_id", field::display(job_id));
        let workspace = JobWorkspace::create(&self.jobs_root, job_id).await?;
        execution.job_id = Some(job_id);
        execution.workspace = Some(workspace.clone());
        execution.advance(JobState::WorkspaceReady);
        debug!(workspace = %workspace.dir().display(), "Workspace created");

        execution.advance(JobState::FetchingReads);
        let location = &reads_location;
        let reads_path = workspace.reads_path();
        let dest = reads_path.as_path();
        let reads_bytes = self
            .retry
            .run("fetch reads chunk", move || {
                fetcher.fetch_into(location, reads_range, dest)
            })
            .await?;
        execution.reads_bytes = Some(reads_bytes);

        execution.advance(JobState::FetchingReference);
        let location = &reference_location;
        let reference_path = workspace.reference_path();
        let dest = reference_path.as_path();
        let reference_bytes = self
            .retry
            .run("fetch reference genome", move || {
                fetcher.fetch_into(location, ChunkRange::whole(), dest)
            })
            .await?;
        execution.reference_bytes = Some(reference_bytes);

        execution.advance(JobState::Completed);
        self.handoff.hand_off(job, &workspace).await;
        Ok(())
    }
}
