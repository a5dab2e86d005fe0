//! Write-temp-then-rename helpers.
//!
//! Readers of the destination path see either the previous file, no file,
//! or the complete new file. A failed write removes its temp file.

use std::io::Write;
use std::path::Path;

use bytes::Bytes;

use crate::error::{Result, StoreError};

/// Atomically write `data` to `path`, creating the parent directory.
///
/// Runs on the blocking pool; the file is fsynced before the rename.
pub async fn write_atomic(path: &Path, data: Bytes) -> Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &data))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

/// Blocking variant of [`write_atomic`].
pub fn write_atomic_blocking(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::InvalidPath(path.display().to_string()))?;
    std::fs::create_dir_all(dir)?;

    // Same directory as the target so the rename never crosses filesystems
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("file.pdf");

        write_atomic_blocking(&path, b"%PDF-1.4 data").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 data");
    }

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");

        write_atomic_blocking(&path, b"one").unwrap();
        write_atomic_blocking(&path, b"two").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"two");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_write_atomic_async() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x").join("y.bin");

        write_atomic(&path, Bytes::from_static(b"payload")).await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"payload");
    }
}
