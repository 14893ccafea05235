//! Local filesystem storage

use super::{DirEntry, FileSystem, Metadata};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Serves files below a root directory
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a request path onto the disk, refusing anything outside the root
    async fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        if path.contains(['\0', '\\']) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "invalid character in file path",
            ));
        }

        let root = fs::canonicalize(&self.root).await.map_err(|e| {
            warn!(
                root = %self.root.display(),
                "Root directory not found or inaccessible: {e}"
            );
            e
        })?;

        // Missing files fail here with NotFound
        let target = fs::canonicalize(self.root.join(path.trim_start_matches('/'))).await?;
        if !target.starts_with(&root) {
            warn!(path, target = %target.display(), "Path traversal attempt blocked");
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "path escapes the served directory",
            ));
        }

        Ok(target)
    }
}

impl FileSystem for LocalFileSystem {
    type File = fs::File;

    async fn stat(&self, path: &str) -> io::Result<Metadata> {
        let target = self.resolve(path).await?;
        let meta = fs::metadata(&target).await?;
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Metadata {
            name,
            is_dir: meta.is_dir(),
            len: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    async fn open(&self, path: &str) -> io::Result<fs::File> {
        let target = self.resolve(path).await?;
        fs::File::open(target).await
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let target = self.resolve(path).await?;
        let mut dir = fs::read_dir(target).await?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type().await?.is_dir(),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("inner.txt"), b"inner").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_stat_file() {
        let dir = fixture();
        let fs = LocalFileSystem::new(dir.path());
        let meta = fs.stat("/hello.txt").await.unwrap();
        assert_eq!(meta.name, "hello.txt");
        assert!(!meta.is_dir);
        assert_eq!(meta.len, 11);
        assert!(meta.modified.is_some());
    }

    #[tokio::test]
    async fn test_stat_dir() {
        let dir = fixture();
        let fs = LocalFileSystem::new(dir.path());
        assert!(fs.stat("/sub").await.unwrap().is_dir);
        assert!(fs.stat("/").await.unwrap().is_dir);
    }

    #[tokio::test]
    async fn test_open_and_read() {
        let dir = fixture();
        let fs = LocalFileSystem::new(dir.path());
        let mut file = fs.open("/sub/inner.txt").await.unwrap();
        let mut buf = String::new();
        file.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "inner");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = fixture();
        let fs = LocalFileSystem::new(dir.path());
        let err = fs.stat("/nope.txt").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_traversal_blocked() {
        let dir = fixture();
        let fs = LocalFileSystem::new(dir.path().join("sub"));
        let err = fs.stat("/../hello.txt").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        let err = fs.stat("/a\\b").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_dir() {
        let dir = fixture();
        let fs = LocalFileSystem::new(dir.path());
        let mut entries = fs.read_dir("/").await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![
                DirEntry {
                    name: "hello.txt".into(),
                    is_dir: false
                },
                DirEntry {
                    name: "sub".into(),
                    is_dir: true
                },
            ]
        );
    }
}
