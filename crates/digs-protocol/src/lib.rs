// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! DIGS Protocol - tagged-line control messages and raw chunk transfer
//!
//! This crate provides the wire protocol a worker node speaks with:
//! - Central directory servers (locating the node that holds a file)
//! - Data nodes (streaming byte ranges of a file)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      digs-protocol                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Clients: DirectoryClient (lookup) / TransferClient (bytes) │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Serialization: `<tag> <json>\n` lines (serde_json)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport: TCP (tokio)                                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Messages
//!
//! | Tag | Direction | Purpose |
//! |-----|-----------|---------|
//! | `locate_data` | worker → directory | Look up a file by `search_by`/`term` |
//! | `locate_data_result` | directory → worker | `{"ip"/"address": .., "path": ..}` |
//! | `get_data_chunk` | worker → data node | Request `[chunk_start, chunk_end)`, `-1` = to EOF |
//! | `perform_bwa_job` | queue → worker | Alignment job description |
//!
//! A `get_data_chunk` request is answered with raw bytes, not a tagged line.
//!
//! # Usage
//!
//! ```ignore
//! use digs_protocol::{ChunkRange, ClientConfig, DirectoryClient, TransferClient, SEARCH_BY_FILE_ID};
//!
//! let directory = DirectoryClient::new(vec!["10.0.0.1:5000".into()], ClientConfig::default())?;
//! let location = directory.resolve(SEARCH_BY_FILE_ID, "R1").await?;
//!
//! let transfer = TransferClient::new(5001, ClientConfig::default());
//! let mut file = tokio::fs::File::create("reads.fastq").await?;
//! transfer.fetch(&location, ChunkRange::new(0, 1024)?, &mut file).await?;
//! ```

pub mod client;
pub mod codec;
pub mod directory;
pub mod messages;
pub mod transfer;

// Re-export main types
pub use client::{ClientConfig, ClientError};
pub use codec::{CodecError, MAX_LINE_LENGTH, Message, decode_line, encode_line, read_line};
pub use directory::DirectoryClient;
pub use messages::{
    CHUNK_END_OF_FILE, ChunkRange, DataLocation, GetDataChunk, LocateData, PerformBwaJob,
    SEARCH_BY_FILE_ID,
};
pub use transfer::{DEFAULT_DATA_PORT, READ_BUFFER_SIZE, TransferClient};
