// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub files: FilesConfig,
    pub delivery: DeliveryConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub access_log: bool,
}

/// Served directory and path policy
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FilesConfig {
    pub root: String,
    pub index_file: String,
    /// Redirect directories to `dir/` and files away from `file/`
    pub redirect: bool,
    /// Send metadata based `ETag` headers
    pub etag: bool,
}

/// Body streaming configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Bytes read from a file per chunk
    pub chunk_size: usize,
    /// Chunks queued between the reader task and the connection
    pub pipe_capacity: usize,
}
