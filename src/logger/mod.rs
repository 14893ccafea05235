//! Logger module
//!
//! Installs the `tracing` subscriber and provides the server lifecycle and access log lines.

use crate::config::Config;
use hyper::{Method, StatusCode};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Target used for access log events, filterable with `RUST_LOG=access=off`
pub const ACCESS_TARGET: &str = "access";

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over the configured level. Should be called once at application startup.
pub fn init(config: &Config) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| format!("Invalid log level '{}': {e}", config.logging.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| format!("Failed to install logger: {e}"))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    info!("Async server started successfully");
    info!("Listening on: http://{addr}");
    info!("Serving directory: {}", config.files.root);
    info!("Log level: {}", config.logging.level);
    match config.server.workers {
        Some(workers) => info!("Worker threads: {workers}"),
        None => info!("Worker threads: default (CPU cores)"),
    }
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    error!(%peer_addr, "Failed to serve connection: {err}");
}

/// One access log line per request
pub fn log_access(
    peer_addr: &SocketAddr,
    method: &Method,
    path: &str,
    status: StatusCode,
    elapsed: Duration,
) {
    info!(
        target: ACCESS_TARGET,
        remote_addr = %peer_addr,
        %method,
        path,
        status = status.as_u16(),
        request_time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        "request"
    );
}
