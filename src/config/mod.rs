// Configuration module entry point
// Loads layered configuration and converts it into file server options

mod types;

use crate::handler::{DeliveryOptions, ServerOptions};
use std::net::SocketAddr;

// Re-export public types
pub use types::{Config, DeliveryConfig, FilesConfig, LoggingConfig, ServerConfig};

/// Environment variable prefix, e.g. `FILESERVER_SERVER__PORT=9000`
const ENV_PREFIX: &str = "FILESERVER";

impl Config {
    /// Load configuration from the default `config.toml` (optional)
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("files.root", "public")?
            .set_default("files.index_file", "index.html")?
            .set_default("files.redirect", true)?
            .set_default("files.etag", true)?
            .set_default("delivery.chunk_size", 65_536)?
            .set_default("delivery.pipe_capacity", 4)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            index_file: self.files.index_file.clone(),
            redirect: self.files.redirect,
            etag: self.files.etag,
            delivery: DeliveryOptions {
                chunk_size: self.delivery.chunk_size,
                pipe_capacity: self.delivery.pipe_capacity,
            },
        }
    }
}
