//! Storage abstraction
//!
//! The file server only needs three capabilities from storage: stat a path, open it as a
//! seekable byte source, and list a directory. Errors keep their `io::ErrorKind` so they can be
//! mapped to 404 / 403 / 500.

mod local;

pub use local::LocalFileSystem;

use chrono::{DateTime, Utc};
use std::future::Future;
use std::io;
use tokio::io::{AsyncRead, AsyncSeek};

/// Seekable content owned by one request
pub trait ByteSource: AsyncRead + AsyncSeek + Unpin + Send + 'static {}

impl<T> ByteSource for T where T: AsyncRead + AsyncSeek + Unpin + Send + 'static {}

/// What the file server needs to know about a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Final path component
    pub name: String,
    pub is_dir: bool,
    pub len: u64,
    /// `None` when storage does not track modification times
    pub modified: Option<DateTime<Utc>>,
}

/// One directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-only storage rooted somewhere, addressed by slash-separated absolute paths
pub trait FileSystem: Send + Sync + 'static {
    type File: ByteSource;

    fn stat(&self, path: &str) -> impl Future<Output = io::Result<Metadata>> + Send;

    fn open(&self, path: &str) -> impl Future<Output = io::Result<Self::File>> + Send;

    fn read_dir(&self, path: &str) -> impl Future<Output = io::Result<Vec<DirEntry>>> + Send;
}
