// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Chunked data transfer from data nodes.
//!
//! A data node answers a `get_data_chunk` line with the raw bytes of the
//! requested range and nothing else. Two termination modes exist:
//!
//! - **Bounded** (`chunk_end != -1`): exactly `chunk_end - chunk_start` bytes
//!   are read. If the peer closes early the transfer fails with
//!   [`ClientError::Truncated`].
//! - **To end of file** (`chunk_end == -1`): bytes are copied until the peer
//!   closes the connection. There is no declared size, so a peer that dies
//!   mid-stream is indistinguishable from a complete transfer. This path is
//!   weaker than the bounded one and is used for reference genomes, which are
//!   trusted to terminate correctly.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::client::{ClientConfig, ClientError, connect, with_timeout};
use crate::codec::write_message;
use crate::messages::{ChunkRange, DataLocation, GetDataChunk};

/// Port data nodes listen on for chunk requests
pub const DEFAULT_DATA_PORT: u16 = 5001;

/// Size of each individual socket read
pub const READ_BUFFER_SIZE: usize = 4096;

/// Client for fetching byte ranges from data nodes
#[derive(Debug, Clone)]
pub struct TransferClient {
    data_port: u16,
    config: ClientConfig,
}

impl TransferClient {
    pub fn new(data_port: u16, config: ClientConfig) -> Self {
        Self { data_port, config }
    }

    pub fn data_port(&self) -> u16 {
        self.data_port
    }

    /// Fetch `range` of the file at `location` into `sink`.
    ///
    /// Returns the number of bytes written. The connection is owned by this
    /// call and closed on every return path.
    #[instrument(skip(self, sink), fields(address = %location.address, path = %location.path))]
    pub async fn fetch<W>(
        &self,
        location: &DataLocation,
        range: ChunkRange,
        sink: &mut W,
    ) -> Result<u64, ClientError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let addr = format!("{}:{}", location.address, self.data_port);
        let mut stream = connect(&addr, &self.config).await?;

        let request = GetDataChunk::new(location.path.clone(), range);
        with_timeout(self.config.io_timeout, async {
            write_message(&mut stream, &request)
                .await
                .map_err(ClientError::from)
        })
        .await?;
        debug!(
            chunk_start = request.chunk_start,
            chunk_end = request.chunk_end,
            "chunk requested"
        );

        let copied = match range.expected_len() {
            Some(size) => copy_exact(&mut stream, sink, size, self.config.io_timeout).await,
            None => copy_to_end(&mut stream, sink, self.config.io_timeout).await,
        };
        // Flush even on failure so a partial chunk reaches the sink.
        let flushed = sink.flush().await.map_err(ClientError::Sink);
        let written = copied?;
        flushed?;

        info!(bytes = written, "chunk received");
        Ok(written)
    }
}

/// Copy exactly `size` bytes from `reader` to `writer`.
///
/// A zero-length read before `size` bytes arrived fails with
/// [`ClientError::Truncated`] carrying the count received so far.
pub async fn copy_exact<R, W>(
    reader: &mut R,
    writer: &mut W,
    size: u64,
    io_timeout: Duration,
) -> Result<u64, ClientError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut read_bytes: u64 = 0;

    while read_bytes < size {
        let want = (size - read_bytes).min(READ_BUFFER_SIZE as u64) as usize;
        let n = timed_read(reader, &mut buf[..want], io_timeout).await?;

        if n == 0 {
            warn!(
                received = read_bytes,
                expected = size,
                "peer closed before the declared chunk size"
            );
            return Err(ClientError::Truncated {
                received: read_bytes,
                expected: size,
            });
        }

        writer
            .write_all(&buf[..n])
            .await
            .map_err(ClientError::Sink)?;
        read_bytes += n as u64;
    }

    Ok(read_bytes)
}

/// Copy from `reader` to `writer` until a zero-length read.
///
/// No size is validated; see the module docs.
pub async fn copy_to_end<R, W>(
    reader: &mut R,
    writer: &mut W,
    io_timeout: Duration,
) -> Result<u64, ClientError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut read_bytes: u64 = 0;

    loop {
        let n = timed_read(reader, &mut buf, io_timeout).await?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(ClientError::Sink)?;
        read_bytes += n as u64;
    }

    Ok(read_bytes)
}

async fn timed_read<R>(reader: &mut R, buf: &mut [u8], limit: Duration) -> Result<usize, ClientError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    with_timeout(limit, async { reader.read(buf).await.map_err(ClientError::from) }).await
}
