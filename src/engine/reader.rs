//! File content access.

use std::io;
use std::path::Path;

use async_trait::async_trait;

/// Reads file sizes and bytes by repo-relative path.
#[async_trait]
pub trait ContentReader: Send + Sync {
    async fn size(&self, root: &Path, path: &str) -> io::Result<u64>;

    async fn read(&self, root: &Path, path: &str) -> io::Result<Vec<u8>>;
}

/// Reads from the local file system with `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsContentReader;

#[async_trait]
impl ContentReader for FsContentReader {
    async fn size(&self, root: &Path, path: &str) -> io::Result<u64> {
        let metadata = tokio::fs::metadata(root.join(path)).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, format!("{} is not a file", path)));
        }
        Ok(metadata.len())
    }

    async fn read(&self, root: &Path, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(root.join(path)).await
    }
}
