// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire format for tagged control lines.
//!
//! Every control message travels as a single line:
//! - a tag naming the message type (e.g. `locate_data`)
//! - one space
//! - a JSON object carrying the message fields
//! - a terminating `\n`

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum accepted line length (1 MB), newline included
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// A message that can be sent as a tagged line.
pub trait Message: Serialize + DeserializeOwned {
    /// Tag written in front of the JSON body.
    const TAG: &'static str;
}

/// Errors that can occur during line encoding/decoding
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty line")]
    EmptyLine,

    #[error("unexpected tag: expected '{expected}', got '{received}'")]
    UnexpectedTag {
        expected: &'static str,
        received: String,
    },

    #[error("malformed body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("line too long: {0} bytes (max: {MAX_LINE_LENGTH})")]
    LineTooLong(usize),

    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("invalid chunk range: start={start}, end={end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    ConnectionClosed,
}

/// Encode a message as `<tag> <json>\n`
pub fn encode_line<M: Message>(msg: &M) -> Result<String, CodecError> {
    let body = serde_json::to_string(msg)?;
    Ok(format!("{} {}\n", M::TAG, body))
}

/// Split a line into its tag and body.
///
/// Trailing whitespace (including the newline) is dropped and the line is split
/// at the first run of whitespace. A tag without a body yields an empty body.
pub fn split_line(line: &str) -> Result<(&str, &str), CodecError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CodecError::EmptyLine);
    }

    match trimmed.split_once(char::is_whitespace) {
        Some((tag, body)) => Ok((tag, body.trim_start())),
        None => Ok((trimmed, "")),
    }
}

/// Decode a line that must carry `M::TAG`.
///
/// A different tag is reported as [`CodecError::UnexpectedTag`] and the body is
/// never looked at.
pub fn decode_line<M: Message>(line: &str) -> Result<M, CodecError> {
    let (tag, body) = split_line(line)?;
    if tag != M::TAG {
        return Err(CodecError::UnexpectedTag {
            expected: M::TAG,
            received: tag.to_string(),
        });
    }
    Ok(serde_json::from_str(body)?)
}

/// Write a message as a single line and flush the writer
pub async fn write_message<W, M>(writer: &mut W, msg: &M) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    M: Message,
{
    let line = encode_line(msg)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read exactly one line from an async reader.
///
/// The returned string keeps its trailing newline when one was present. An
/// over-long line is consumed up to its newline before [`CodecError::LineTooLong`]
/// is returned, so the next call starts on the following line.
pub async fn read_line<R>(reader: &mut R) -> Result<String, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(MAX_LINE_LENGTH as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;

    if n == 0 {
        return Err(CodecError::ConnectionClosed);
    }
    if n > MAX_LINE_LENGTH {
        if buf.last() != Some(&b'\n') {
            discard_line(reader).await?;
        }
        return Err(CodecError::LineTooLong(n));
    }
    Ok(String::from_utf8(buf)?)
}

/// Skip input up to and including the next newline (or EOF).
async fn discard_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}
