// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Seams between the job workflow and its collaborators.
//!
//! The workflow only sees these traits, so tests can drive it without
//! directory servers or data nodes.

use std::path::Path;

use async_trait::async_trait;
use digs_protocol::{
    ChunkRange, ClientError, DataLocation, DirectoryClient, PerformBwaJob, TransferClient,
};
use tracing::info;

use crate::workspace::JobWorkspace;

/// Resolves logical file ids to data node locations.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, search_by: &str, term: &str) -> Result<DataLocation, ClientError>;
}

/// Fetches a byte range of a remote file into a local file.
#[async_trait]
pub trait ChunkFetcher: Send + Sync {
    /// Write `range` of the file at `location` to `dest`, truncating `dest`
    /// first. Returns the number of bytes written.
    async fn fetch_into(
        &self,
        location: &DataLocation,
        range: ChunkRange,
        dest: &Path,
    ) -> Result<u64, ClientError>;
}

/// Receives a populated workspace once a job completes.
///
/// The alignment run itself happens outside this crate.
#[async_trait]
pub trait AlignmentHandoff: Send + Sync {
    async fn hand_off(&self, job: &PerformBwaJob, workspace: &JobWorkspace);
}

#[async_trait]
impl LocationResolver for DirectoryClient {
    async fn resolve(&self, search_by: &str, term: &str) -> Result<DataLocation, ClientError> {
        DirectoryClient::resolve(self, search_by, term).await
    }
}

#[async_trait]
impl ChunkFetcher for TransferClient {
    async fn fetch_into(
        &self,
        location: &DataLocation,
        range: ChunkRange,
        dest: &Path,
    ) -> Result<u64, ClientError> {
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(ClientError::Sink)?;
        self.fetch(location, range, &mut file).await
    }
}

/// Hand-off that only logs the ready workspace.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHandoff;

#[async_trait]
impl AlignmentHandoff for LogHandoff {
    async fn hand_off(&self, job: &PerformBwaJob, workspace: &JobWorkspace) {
        info!(
            job_id = %workspace.job_id(),
            reads_data = %job.reads_data,
            reference_genome = %job.reference_genome,
            workspace = %workspace.dir().display(),
            "Workspace ready for alignment"
        );
    }
}
