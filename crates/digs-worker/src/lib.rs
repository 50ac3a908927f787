// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! DIGS Worker - Alignment Job Preparation
//!
//! A worker node receives `perform_bwa_job` requests, locates the input files
//! through the central directory, downloads them from data nodes, and leaves a
//! populated workspace ready for the alignment run.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐  perform_bwa_job   ┌─────────────────────────────┐
//!  │  Job source  │───────────────────►│          Worker             │
//!  │ (stdin/chan) │                    │  N concurrent JobRunner runs│
//!  └──────────────┘                    └──────────────┬──────────────┘
//!                                                     │
//!                       ┌─────────────────────────────┼──────────────────┐
//!                       │ locate_data                 │ get_data_chunk   │
//!                       ▼                             ▼                  ▼
//!            ┌─────────────────────┐        ┌────────────────┐  ┌──────────────────┐
//!            │ Central directory   │        │ Data node :5001│  │ <jobs>/<job-id>/ │
//!            │ (random of N)       │        │ raw byte stream│─►│ reads.fastq      │
//!            └─────────────────────┘        └────────────────┘  │ reference.fasta  │
//!                                                               └──────────────────┘
//! ```
//!
//! # Job Lifecycle
//!
//! ```text
//! Accepted → ResolvingReads → ResolvingReference → WorkspaceReady
//!          → FetchingReads → FetchingReference → Completed
//! ```
//!
//! Any step can move the job to `Failed`. A failed job is logged with its
//! error code and the worker moves on to the next one.
//!
//! | Error code | Cause |
//! |------------|-------|
//! | `PROTOCOL_ERROR` | Directory answered with an unexpected tag |
//! | `PARSE_ERROR` | Response body was malformed |
//! | `TRANSPORT_ERROR` | Connect, read, or timeout failure |
//! | `TRUNCATED_TRANSFER` | Bounded chunk ended early |
//! | `INVALID_JOB` | Chunk range is unusable |
//! | `WORKSPACE_ERROR` | Local filesystem failure |
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `DIGS_CENTRAL_SERVERS` | Yes | - | Comma-separated `host:port` directory servers |
//! | `DIGS_DATA_PORT` | No | `5001` | Port data nodes serve chunks on |
//! | `DIGS_JOBS_DIR` | No | `jobs` | Root of job workspaces |
//! | `DIGS_MAX_CONCURRENT_JOBS` | No | `4` | Jobs run in parallel |
//! | `DIGS_CONNECT_TIMEOUT_MS` | No | `10000` | TCP connect timeout |
//! | `DIGS_IO_TIMEOUT_MS` | No | `60000` | Per-read/write timeout |
//! | `DIGS_TRANSPORT_RETRIES` | No | `0` | Retries for transport failures |
//! | `DIGS_RETRY_BACKOFF_MS` | No | `500` | First retry delay, doubled each time |
//!
//! # Modules
//!
//! - [`config`]: Worker configuration from environment variables
//! - [`error`]: Job error types with error code mapping
//! - [`retry`]: Transport retry policy
//! - [`source`]: Job sources (channel, line reader)
//! - [`traits`]: Resolver, fetcher, and hand-off seams
//! - [`worker`]: Concurrent worker loop
//! - [`workflow`]: Per-job state machine and runner
//! - [`workspace`]: On-disk job workspaces

/// Worker configuration loaded from environment variables.
pub mod config;

/// Error types for job execution with error code mapping.
pub mod error;

/// Retry policy for transport failures.
pub mod retry;

/// Sources of incoming jobs.
pub mod source;

/// Traits decoupling the workflow from network clients.
pub mod traits;

/// Worker loop with bounded concurrency.
pub mod worker;

/// Job state machine and runner.
pub mod workflow;

/// Job workspace directories.
pub mod workspace;

pub use config::{Config, ConfigError};
pub use error::JobError;
pub use retry::RetryPolicy;
pub use source::{ChannelJobSource, JobSource, LineJobSource, SourceError};
pub use traits::{AlignmentHandoff, ChunkFetcher, LocationResolver, LogHandoff};
pub use worker::{Worker, WorkerSummary};
pub use workflow::{JobExecution, JobRunner, JobState};
pub use workspace::{JobId, JobWorkspace};
