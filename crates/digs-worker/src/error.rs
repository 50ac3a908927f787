// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for job execution.
//!
//! Every failure while executing a job is classified into one [`JobError`]
//! variant. A `JobError` ends that job only; the worker keeps running.

use digs_protocol::ClientError;
use thiserror::Error;

/// Result type using JobError
pub type Result<T> = std::result::Result<T, JobError>;

/// Reasons a job can fail.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JobError {
    /// The directory service answered with an unexpected tag.
    #[error("Protocol error: expected '{expected}', got '{received}'")]
    Protocol {
        /// Tag the worker was waiting for.
        expected: &'static str,
        /// Tag actually received.
        received: String,
    },

    /// A response body was not well-formed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A connection to a directory server or data node failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A bounded transfer ended before the declared size.
    #[error("Truncated transfer: received {received} of {expected} bytes")]
    TruncatedTransfer {
        /// Bytes written before the stream ended.
        received: u64,
        /// Bytes the chunk range declared.
        expected: u64,
    },

    /// The job description itself is unusable (e.g. an inverted chunk range).
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// Creating or writing the local workspace failed.
    #[error("Workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}

impl JobError {
    /// Stable code for logs and summaries.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol { .. } => "PROTOCOL_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::TruncatedTransfer { .. } => "TRUNCATED_TRANSFER",
            Self::InvalidJob(_) => "INVALID_JOB",
            Self::Workspace(_) => "WORKSPACE_ERROR",
        }
    }
}

impl From<ClientError> for JobError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Protocol { expected, received } => Self::Protocol { expected, received },
            ClientError::Parse(details) => Self::Parse(details),
            ClientError::Truncated { received, expected } => {
                Self::TruncatedTransfer { received, expected }
            }
            ClientError::InvalidRange { start, end } => {
                Self::InvalidJob(format!("invalid chunk range {}..{}", start, end))
            }
            ClientError::Sink(e) => Self::Workspace(e),
            err @ (ClientError::Transport(_)
            | ClientError::ConnectionClosed
            | ClientError::Timeout(_)
            | ClientError::NoDirectoryServers) => Self::Transport(err.to_string()),
        }
    }
}
