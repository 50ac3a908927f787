// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed messages exchanged with directory servers, data nodes, and the job queue.

use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Message};

/// `search_by` value for lookups keyed by logical file id.
pub const SEARCH_BY_FILE_ID: &str = "file_id";

/// `chunk_end` sentinel requesting everything up to the end of the file.
pub const CHUNK_END_OF_FILE: i64 = -1;

/// Ask a directory server which node holds a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateData {
    pub search_by: String,
    pub term: String,
}

impl LocateData {
    pub fn new(search_by: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            search_by: search_by.into(),
            term: term.into(),
        }
    }

    /// Lookup by logical file id.
    pub fn by_file_id(term: impl Into<String>) -> Self {
        Self::new(SEARCH_BY_FILE_ID, term)
    }
}

impl Message for LocateData {
    const TAG: &'static str = "locate_data";
}

/// Network location of a file, as answered by a directory server.
///
/// Directory servers in the field send the host under `ip`; `address` is
/// accepted as well and wins when a reply carries both. Extra keys in the
/// reply are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LocationReply")]
pub struct DataLocation {
    pub address: String,
    pub path: String,
}

/// Raw `locate_data_result` body before the host key is settled.
#[derive(Deserialize)]
struct LocationReply {
    address: Option<String>,
    ip: Option<String>,
    path: String,
}

impl TryFrom<LocationReply> for DataLocation {
    type Error = &'static str;

    fn try_from(reply: LocationReply) -> Result<Self, Self::Error> {
        let address = reply
            .address
            .or(reply.ip)
            .ok_or("missing field `address` (or `ip`)")?;
        Ok(Self {
            address,
            path: reply.path,
        })
    }
}

impl Message for DataLocation {
    const TAG: &'static str = "locate_data_result";
}

/// Request a byte range of a file from a data node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetDataChunk {
    pub file_path: String,
    pub chunk_start: i64,
    pub chunk_end: i64,
}

impl GetDataChunk {
    pub fn new(file_path: impl Into<String>, range: ChunkRange) -> Self {
        Self {
            file_path: file_path.into(),
            chunk_start: range.start() as i64,
            chunk_end: range.wire_end(),
        }
    }

    /// Request the whole file.
    pub fn whole_file(file_path: impl Into<String>) -> Self {
        Self::new(file_path, ChunkRange::whole())
    }

    pub fn range(&self) -> Result<ChunkRange, CodecError> {
        ChunkRange::new(self.chunk_start, self.chunk_end)
    }
}

impl Message for GetDataChunk {
    const TAG: &'static str = "get_data_chunk";
}

/// Alignment job delivered through the job queue.
///
/// `chunk_start`/`chunk_end` select the slice of the reads data this job
/// covers (`chunk_end` exclusive, `-1` for the rest of the file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformBwaJob {
    pub reads_data: String,
    pub reference_genome: String,
    pub chunk_start: i64,
    pub chunk_end: i64,
}

impl PerformBwaJob {
    pub fn range(&self) -> Result<ChunkRange, CodecError> {
        ChunkRange::new(self.chunk_start, self.chunk_end)
    }
}

impl Message for PerformBwaJob {
    const TAG: &'static str = "perform_bwa_job";
}

/// Validated byte range of a chunk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRange {
    /// `[start, end)`; the transfer must deliver exactly `end - start` bytes.
    Bounded { start: u64, end: u64 },
    /// `[start, EOF)`; the size is unknown and never validated.
    ToEnd { start: u64 },
}

impl ChunkRange {
    /// Build a range from wire offsets, where `end == -1` means end of file.
    pub fn new(start: i64, end: i64) -> Result<Self, CodecError> {
        if start < 0 || end < CHUNK_END_OF_FILE {
            return Err(CodecError::InvalidRange { start, end });
        }
        if end == CHUNK_END_OF_FILE {
            return Ok(Self::ToEnd {
                start: start as u64,
            });
        }
        if start > end {
            return Err(CodecError::InvalidRange { start, end });
        }
        Ok(Self::Bounded {
            start: start as u64,
            end: end as u64,
        })
    }

    /// The whole file.
    pub fn whole() -> Self {
        Self::ToEnd { start: 0 }
    }

    pub fn start(&self) -> u64 {
        match *self {
            Self::Bounded { start, .. } | Self::ToEnd { start } => start,
        }
    }

    /// `chunk_end` as sent on the wire.
    pub fn wire_end(&self) -> i64 {
        match *self {
            Self::Bounded { end, .. } => end as i64,
            Self::ToEnd { .. } => CHUNK_END_OF_FILE,
        }
    }

    /// Number of bytes a bounded transfer must deliver; `None` for `ToEnd`.
    pub fn expected_len(&self) -> Option<u64> {
        match *self {
            Self::Bounded { start, end } => Some(end - start),
            Self::ToEnd { .. } => None,
        }
    }
}
