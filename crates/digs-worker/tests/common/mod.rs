// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for worker tests: an in-process directory server, an
//! in-process data node, and a runner wired to both.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use digs_protocol::{
    ClientConfig, DataLocation, DirectoryClient, GetDataChunk, LocateData, TransferClient,
    decode_line, encode_line, read_line,
};
use digs_worker::JobRunner;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Deterministic test payload.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| b"ACGTN"[i % 5]).collect()
}

/// How the directory answers a lookup for one term.
#[derive(Clone)]
pub enum Answer {
    /// `locate_data_result` pointing at this path on 127.0.0.1.
    Located(String),
    /// A raw line sent back as-is.
    Raw(String),
}

pub struct FakeDirectory {
    pub addr: SocketAddr,
    pub terms: Arc<Mutex<Vec<String>>>,
}

impl FakeDirectory {
    pub fn terms(&self) -> Vec<String> {
        self.terms.lock().unwrap().clone()
    }
}

async fn answer_lookup(
    socket: TcpStream,
    answers: Arc<HashMap<String, Answer>>,
    terms: Arc<Mutex<Vec<String>>>,
) {
    let mut stream = BufReader::new(socket);
    let Ok(line) = read_line(&mut stream).await else {
        return;
    };
    let Ok(request) = decode_line::<LocateData>(&line) else {
        return;
    };
    terms.lock().unwrap().push(request.term.clone());

    let out = match answers.get(&request.term) {
        Some(Answer::Located(path)) => encode_line(&DataLocation {
            address: "127.0.0.1".to_string(),
            path: path.clone(),
        })
        .unwrap(),
        Some(Answer::Raw(raw)) => format!("{}\n", raw),
        None => return,
    };
    let _ = stream.get_mut().write_all(out.as_bytes()).await;
}

/// Start a directory server answering from `answers`, keyed by term.
pub async fn spawn_directory(answers: HashMap<String, Answer>) -> FakeDirectory {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let terms = Arc::new(Mutex::new(Vec::new()));
    let answers = Arc::new(answers);

    let server_terms = terms.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(answer_lookup(socket, answers.clone(), server_terms.clone()));
        }
    });

    FakeDirectory { addr, terms }
}

/// A file held by the data node, optionally cut short after `limit` bytes.
#[derive(Clone)]
pub struct Hosted {
    pub data: Vec<u8>,
    pub limit: Option<usize>,
}

impl Hosted {
    pub fn full(data: Vec<u8>) -> Self {
        Self { data, limit: None }
    }

    pub fn truncated(data: Vec<u8>, limit: usize) -> Self {
        Self {
            data,
            limit: Some(limit),
        }
    }
}

pub struct FakeDataNode {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<GetDataChunk>>>,
}

impl FakeDataNode {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn requests(&self) -> Vec<GetDataChunk> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve_chunk(
    socket: TcpStream,
    files: Arc<HashMap<String, Hosted>>,
    requests: Arc<Mutex<Vec<GetDataChunk>>>,
) {
    let mut stream = BufReader::new(socket);
    let Ok(line) = read_line(&mut stream).await else {
        return;
    };
    let Ok(request) = decode_line::<GetDataChunk>(&line) else {
        return;
    };
    requests.lock().unwrap().push(request.clone());

    let Some(hosted) = files.get(&request.file_path) else {
        return;
    };
    let start = (request.chunk_start as usize).min(hosted.data.len());
    let end = if request.chunk_end < 0 {
        hosted.data.len()
    } else {
        (request.chunk_end as usize).min(hosted.data.len())
    };
    let mut payload = &hosted.data[start..end.max(start)];
    if let Some(limit) = hosted.limit {
        payload = &payload[..limit.min(payload.len())];
    }

    let _ = stream.get_mut().write_all(payload).await;
    let _ = stream.get_mut().shutdown().await;
}

/// Start a data node serving `files` keyed by remote path.
pub async fn spawn_data_node(files: HashMap<String, Hosted>) -> FakeDataNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let files = Arc::new(files);

    let server_requests = requests.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve_chunk(socket, files.clone(), server_requests.clone()));
        }
    });

    FakeDataNode { addr, requests }
}

/// Short timeouts so failing tests fail fast.
pub fn test_client_config() -> ClientConfig {
    ClientConfig {
        connect_timeout: Duration::from_secs(2),
        io_timeout: Duration::from_secs(2),
    }
}

/// A runner using real network clients against the fakes.
pub fn runner_for(directory: &FakeDirectory, node: &FakeDataNode, jobs_root: &Path) -> JobRunner {
    let directory_client =
        DirectoryClient::new(vec![directory.addr.to_string()], test_client_config()).unwrap();
    let transfer_client = TransferClient::new(node.port(), test_client_config());
    JobRunner::new(
        Arc::new(directory_client),
        Arc::new(transfer_client),
        jobs_root,
    )
}
