// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-process directory server and data node for client tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use digs_protocol::{GetDataChunk, decode_line, read_line};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Deterministic test payload.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

/// Wait until the peer closes its side; returns false on timeout.
async fn wait_for_eof<S: tokio::io::AsyncRead + Unpin>(stream: &mut S) -> bool {
    let mut buf = [0u8; 64];
    let wait = async {
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .is_ok()
}

/// A directory server whose replies are produced by a closure.
pub struct FakeDirectory {
    pub addr: SocketAddr,
    /// Raw request lines, in arrival order.
    pub requests: Arc<Mutex<Vec<String>>>,
    /// Connections the client closed after the single request/response pair.
    pub closed_by_client: Arc<AtomicUsize>,
}

impl FakeDirectory {
    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn closed_by_client(&self) -> usize {
        self.closed_by_client.load(Ordering::SeqCst)
    }
}

/// Start a directory server. `reply` maps a request line to the response line
/// (without newline); `None` closes the connection without answering.
pub async fn spawn_directory<F>(reply: F) -> FakeDirectory
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    spawn_directory_bytes(move |line| reply(line).map(String::into_bytes)).await
}

/// Like [`spawn_directory`], but the reply is raw bytes and need not be UTF-8.
pub async fn spawn_directory_bytes<F>(reply: F) -> FakeDirectory
where
    F: Fn(&str) -> Option<Vec<u8>> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let closed_by_client = Arc::new(AtomicUsize::new(0));
    let reply = Arc::new(reply);

    let server_requests = requests.clone();
    let server_closed = closed_by_client.clone();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let requests = server_requests.clone();
            let closed = server_closed.clone();
            let reply = reply.clone();
            tokio::spawn(async move {
                let mut stream = BufReader::new(socket);
                let Ok(line) = read_line(&mut stream).await else {
                    return;
                };
                requests.lock().unwrap().push(line.trim_end().to_string());

                if let Some(mut out) = reply(line.trim_end()) {
                    out.push(b'\n');
                    if stream.get_mut().write_all(&out).await.is_err() {
                        return;
                    }
                    if wait_for_eof(&mut stream).await {
                        closed.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    FakeDirectory {
        addr,
        requests,
        closed_by_client,
    }
}

/// How a data node serves one file.
#[derive(Clone)]
pub enum Serve {
    /// Serve the requested range in full, then close.
    Full(Vec<u8>),
    /// Serve at most `n` bytes of the requested range, then close.
    TruncateAfter(Vec<u8>, usize),
    /// Serve at most `n` bytes of the requested range, then go silent.
    StallAfter(Vec<u8>, usize),
    /// Ignore the requested range and send the whole file.
    IgnoreRange(Vec<u8>),
}

pub struct FakeDataNode {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<GetDataChunk>>>,
    /// Connections the client closed after the transfer.
    pub closed_by_client: Arc<AtomicUsize>,
}

impl FakeDataNode {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn requests(&self) -> Vec<GetDataChunk> {
        self.requests.lock().unwrap().clone()
    }

    pub fn closed_by_client(&self) -> usize {
        self.closed_by_client.load(Ordering::SeqCst)
    }
}

fn slice_for(data: &[u8], request: &GetDataChunk) -> Vec<u8> {
    let start = (request.chunk_start.max(0) as usize).min(data.len());
    let end = if request.chunk_end < 0 {
        data.len()
    } else {
        (request.chunk_end as usize).min(data.len())
    };
    data[start..end.max(start)].to_vec()
}

async fn serve_chunk(
    socket: TcpStream,
    files: Arc<HashMap<String, Serve>>,
    requests: Arc<Mutex<Vec<GetDataChunk>>>,
    closed: Arc<AtomicUsize>,
) {
    let mut stream = BufReader::new(socket);
    let Ok(line) = read_line(&mut stream).await else {
        return;
    };
    let Ok(request) = decode_line::<GetDataChunk>(&line) else {
        return;
    };
    requests.lock().unwrap().push(request.clone());

    let (payload, stall) = match files.get(&request.file_path) {
        Some(Serve::Full(data)) => (slice_for(data, &request), false),
        Some(Serve::TruncateAfter(data, n)) => {
            let mut slice = slice_for(data, &request);
            slice.truncate(*n);
            (slice, false)
        }
        Some(Serve::StallAfter(data, n)) => {
            let mut slice = slice_for(data, &request);
            slice.truncate(*n);
            (slice, true)
        }
        Some(Serve::IgnoreRange(data)) => (data.clone(), false),
        None => (Vec::new(), false),
    };

    if stream.get_mut().write_all(&payload).await.is_err() {
        return;
    }
    if stall {
        tokio::time::sleep(Duration::from_secs(30)).await;
        return;
    }
    let _ = stream.get_mut().shutdown().await;
    if wait_for_eof(&mut stream).await {
        closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Start a data node serving `files` keyed by remote path.
pub async fn spawn_data_node(files: HashMap<String, Serve>) -> FakeDataNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let closed_by_client = Arc::new(AtomicUsize::new(0));
    let files = Arc::new(files);

    let server_requests = requests.clone();
    let server_closed = closed_by_client.clone();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(serve_chunk(
                socket,
                files.clone(),
                server_requests.clone(),
                server_closed.clone(),
            ));
        }
    });

    FakeDataNode {
        addr,
        requests,
        closed_by_client,
    }
}

/// Poll `check` for up to two seconds.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
