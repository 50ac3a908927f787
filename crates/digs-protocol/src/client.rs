// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared TCP client plumbing: configuration, errors, and timed connects.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;

use crate::codec::CodecError;

/// Errors that can occur while talking to a directory server or data node
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("connection closed before a response was received")]
    ConnectionClosed,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("protocol error: expected '{expected}', got '{received}'")]
    Protocol {
        expected: &'static str,
        received: String,
    },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("truncated transfer: received {received} of {expected} bytes")]
    Truncated { received: u64, expected: u64 },

    #[error("invalid chunk range: start={start}, end={end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("sink write failed: {0}")]
    Sink(#[source] std::io::Error),

    #[error("no directory servers configured")]
    NoDirectoryServers,
}

impl ClientError {
    /// Connection-level failures; the only class worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ConnectionClosed | Self::Timeout(_)
        )
    }
}

impl From<CodecError> for ClientError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => Self::Transport(e),
            CodecError::ConnectionClosed => Self::ConnectionClosed,
            CodecError::UnexpectedTag { expected, received } => {
                Self::Protocol { expected, received }
            }
            CodecError::InvalidRange { start, end } => Self::InvalidRange { start, end },
            err @ (CodecError::Parse(_)
            | CodecError::EmptyLine
            | CodecError::LineTooLong(_)
            | CodecError::InvalidUtf8(_)) => Self::Parse(err.to_string()),
        }
    }
}

/// Configuration shared by the directory and transfer clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on establishing a TCP connection
    pub connect_timeout: Duration,
    /// Upper bound on any single read or write (a stalled peer fails instead of hanging)
    pub io_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(60),
        }
    }
}

/// Open a TCP connection within `config.connect_timeout`
pub(crate) async fn connect(addr: &str, config: &ClientConfig) -> Result<TcpStream, ClientError> {
    debug!(addr, "connecting");
    let stream = with_timeout(config.connect_timeout, async {
        TcpStream::connect(addr).await.map_err(ClientError::from)
    })
    .await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Run `fut`, failing with [`ClientError::Timeout`] if it does not finish in time
pub(crate) async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ClientError::Timeout(limit))?
}
