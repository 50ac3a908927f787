// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! On-disk job workspaces.
//!
//! Layout under the jobs root:
//!
//! ```text
//! <jobs_root>/<job-id>/reads.fastq
//! <jobs_root>/<job-id>/reference.fasta
//! ```
//!
//! Workspaces are never deleted here; a failed job leaves whatever was
//! written so far.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File name of the downloaded reads chunk
pub const READS_FILE_NAME: &str = "reads.fastq";

/// File name of the downloaded reference genome
pub const REFERENCE_FILE_NAME: &str = "reference.fasta";

/// Unique identifier of one job execution (random 128-bit UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Directory holding one job's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobWorkspace {
    job_id: JobId,
    dir: PathBuf,
}

impl JobWorkspace {
    /// Create `<root>/<job_id>/`, including missing parents.
    ///
    /// Calling this again for the same job is a no-op.
    pub async fn create(root: impl AsRef<Path>, job_id: JobId) -> std::io::Result<Self> {
        let dir = root.as_ref().join(job_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { job_id, dir })
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination of the reads chunk.
    pub fn reads_path(&self) -> PathBuf {
        self.dir.join(READS_FILE_NAME)
    }

    /// Destination of the reference genome.
    pub fn reference_path(&self) -> PathBuf {
        self.dir.join(REFERENCE_FILE_NAME)
    }
}
