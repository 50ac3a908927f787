// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Directory-service client: maps logical file ids to data node locations.

use rand::seq::SliceRandom;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{debug, info, instrument};

use crate::client::{ClientConfig, ClientError, connect, with_timeout};
use crate::codec::{decode_line, read_line, write_message};
use crate::messages::{DataLocation, LocateData};

/// Client for the central directory servers.
///
/// Each lookup opens its own connection to one server (picked at random),
/// exchanges a single `locate_data` / `locate_data_result` pair, and closes
/// the connection. Nothing is pooled or cached.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    servers: Vec<String>,
    config: ClientConfig,
}

impl DirectoryClient {
    /// Create a client over a list of `host:port` directory servers
    pub fn new(servers: Vec<String>, config: ClientConfig) -> Result<Self, ClientError> {
        if servers.is_empty() {
            return Err(ClientError::NoDirectoryServers);
        }
        Ok(Self { servers, config })
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    fn pick_server(&self) -> &str {
        self.servers
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Resolve `term` (looked up by `search_by`) on a random directory server
    pub async fn resolve(&self, search_by: &str, term: &str) -> Result<DataLocation, ClientError> {
        let server = self.pick_server().to_string();
        self.resolve_via(&server, &LocateData::new(search_by, term))
            .await
    }

    /// Send one lookup to a specific directory server
    #[instrument(skip(self), fields(search_by = %request.search_by, term = %request.term))]
    pub async fn resolve_via(
        &self,
        server: &str,
        request: &LocateData,
    ) -> Result<DataLocation, ClientError> {
        let mut stream = connect(server, &self.config).await?;
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        with_timeout(self.config.io_timeout, async {
            write_message(&mut write_half, request)
                .await
                .map_err(ClientError::from)
        })
        .await?;

        let line = with_timeout(self.config.io_timeout, async {
            read_line(&mut reader).await.map_err(ClientError::from)
        })
        .await?;
        debug!(line = line.trim_end(), "received directory response");

        let location: DataLocation = decode_line(&line)?;
        info!(address = %location.address, path = %location.path, "data located");

        // One request per connection; the peer sees EOF before the socket drops.
        let _ = write_half.shutdown().await;
        Ok(location)
    }
}
