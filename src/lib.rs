//! Static file server with HTTP conditional requests and byte-range delivery.
//!
//! The delivery engine lives in [`handler::serve_content`]; [`handler::FileServer`]
//! drives it over a [`fs::FileSystem`].

pub mod config;
pub mod error;
pub mod fs;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use error::{DeliveryError, ServeError};
pub use handler::{serve_content, DeliveryOptions, FileServer, Resource};
