// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use digs_protocol::{ClientConfig, DEFAULT_DATA_PORT};

use crate::retry::RetryPolicy;

/// Worker node configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Central directory servers (`host:port`)
    pub central_servers: Vec<String>,
    /// Port data nodes serve chunks on
    pub data_port: u16,
    /// Root directory for job workspaces
    pub jobs_dir: PathBuf,
    /// Maximum jobs executing at once
    pub max_concurrent_jobs: usize,
    /// Timeout for establishing connections
    pub connect_timeout: Duration,
    /// Timeout for any single read or write
    pub io_timeout: Duration,
    /// Extra attempts after a transport failure (0 disables retries)
    pub transport_retries: u32,
    /// Backoff before the first retry; doubled for each further attempt
    pub retry_backoff: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DIGS_CENTRAL_SERVERS`: comma-separated `host:port` list of directory servers
    ///
    /// Optional (with defaults):
    /// - `DIGS_DATA_PORT`: data node port (default: 5001)
    /// - `DIGS_JOBS_DIR`: workspace root (default: jobs)
    /// - `DIGS_MAX_CONCURRENT_JOBS`: concurrent jobs (default: 4)
    /// - `DIGS_CONNECT_TIMEOUT_MS`: connect timeout (default: 10000)
    /// - `DIGS_IO_TIMEOUT_MS`: read/write timeout (default: 60000)
    /// - `DIGS_TRANSPORT_RETRIES`: retries on transport errors (default: 0)
    /// - `DIGS_RETRY_BACKOFF_MS`: initial retry backoff (default: 500)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_servers = std::env::var("DIGS_CENTRAL_SERVERS")
            .map_err(|_| ConfigError::Missing("DIGS_CENTRAL_SERVERS"))?;
        let central_servers: Vec<String> = raw_servers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if central_servers.is_empty() {
            return Err(ConfigError::Invalid(
                "DIGS_CENTRAL_SERVERS",
                "must list at least one host:port",
            ));
        }

        let data_port: u16 = parse_var(
            "DIGS_DATA_PORT",
            &DEFAULT_DATA_PORT.to_string(),
            "must be a valid port number",
        )?;

        let jobs_dir =
            PathBuf::from(std::env::var("DIGS_JOBS_DIR").unwrap_or_else(|_| "jobs".to_string()));

        let max_concurrent_jobs: usize =
            parse_var("DIGS_MAX_CONCURRENT_JOBS", "4", "must be a positive integer")?;
        if max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid(
                "DIGS_MAX_CONCURRENT_JOBS",
                "must be a positive integer",
            ));
        }

        let connect_timeout_ms: u64 = parse_var(
            "DIGS_CONNECT_TIMEOUT_MS",
            "10000",
            "must be a number of milliseconds",
        )?;
        let io_timeout_ms: u64 = parse_var(
            "DIGS_IO_TIMEOUT_MS",
            "60000",
            "must be a number of milliseconds",
        )?;
        let transport_retries: u32 = parse_var(
            "DIGS_TRANSPORT_RETRIES",
            "0",
            "must be a non-negative integer",
        )?;
        let retry_backoff_ms: u64 = parse_var(
            "DIGS_RETRY_BACKOFF_MS",
            "500",
            "must be a number of milliseconds",
        )?;

        Ok(Self {
            central_servers,
            data_port,
            jobs_dir,
            max_concurrent_jobs,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            io_timeout: Duration::from_millis(io_timeout_ms),
            transport_retries,
            retry_backoff: Duration::from_millis(retry_backoff_ms),
        })
    }

    /// Timeouts for the directory and transfer clients.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.transport_retries, self.retry_backoff)
    }
}

fn parse_var<T: FromStr>(
    name: &'static str,
    default: &str,
    reason: &'static str,
) -> Result<T, ConfigError> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(name, reason))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
