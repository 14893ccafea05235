//! Request handler module
//!
//! Content delivery for a single resource plus the file server that drives it from request
//! paths.

pub mod content;
pub mod file_server;
pub mod listing;
pub mod render;

// Re-export main entry points
pub use content::{serve_content, DeliveryOptions, Resource};
pub use file_server::{FileServer, ServerOptions};
pub use listing::FileEntry;
pub use render::{DefaultRenderer, Renderer};
