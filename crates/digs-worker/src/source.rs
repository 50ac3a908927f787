// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Where jobs come from.
//!
//! The worker pulls [`PerformBwaJob`] messages from a [`JobSource`]. Two
//! sources are provided: an in-process channel and a reader of
//! `perform_bwa_job <json>` lines (stdin or a file).

use async_trait::async_trait;
use digs_protocol::codec::read_line;
use digs_protocol::{CodecError, PerformBwaJob, decode_line};
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;

/// Errors produced while pulling the next job.
#[derive(Debug, Error)]
pub enum SourceError {
    /// One message could not be decoded; the source is still usable.
    #[error("Malformed job message: {0}")]
    Malformed(#[from] CodecError),

    /// The underlying stream failed; no further jobs can be read.
    #[error("Job source IO error: {0}")]
    Io(#[source] std::io::Error),
}

impl SourceError {
    /// Whether the source must be abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Stream of incoming jobs.
#[async_trait]
pub trait JobSource: Send {
    /// Next job, or `None` once the source is exhausted.
    async fn next_job(&mut self) -> Result<Option<PerformBwaJob>, SourceError>;
}

/// Jobs pushed through a tokio channel.
pub struct ChannelJobSource {
    rx: mpsc::Receiver<PerformBwaJob>,
}

impl ChannelJobSource {
    pub fn new(rx: mpsc::Receiver<PerformBwaJob>) -> Self {
        Self { rx }
    }

    /// Create a bounded channel and the source reading from it.
    pub fn channel(buffer: usize) -> (mpsc::Sender<PerformBwaJob>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl JobSource for ChannelJobSource {
    async fn next_job(&mut self) -> Result<Option<PerformBwaJob>, SourceError> {
        Ok(self.rx.recv().await)
    }
}

/// Jobs read as tagged lines from any buffered reader.
///
/// Blank lines are skipped. End of input ends the source.
pub struct LineJobSource<R> {
    reader: R,
}

impl<R> LineJobSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R> JobSource for LineJobSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_job(&mut self) -> Result<Option<PerformBwaJob>, SourceError> {
        loop {
            let line = match read_line(&mut self.reader).await {
                Ok(line) => line,
                Err(CodecError::ConnectionClosed) => return Ok(None),
                Err(CodecError::Io(e)) => return Err(SourceError::Io(e)),
                Err(e) => return Err(SourceError::Malformed(e)),
            };

            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(decode_line::<PerformBwaJob>(&line)?));
        }
    }
}
