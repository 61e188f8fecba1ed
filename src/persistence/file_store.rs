//! Snapshot store backed by one JSON file per repository.
//!
//! # File Layout
//!
//! ```text
//! <dir>/<percent-encoded key>.json
//! ```
//!
//! # Crash Safety
//!
//! Records are written with write-to-temp-then-rename:
//! 1. Write to `<path>.tmp`
//! 2. fsync the temp file
//! 3. Rename to `<path>`
//! 4. fsync the parent directory
//!
//! A crash at any point leaves either the old record or the new one, never a
//! mix. The directory fsync makes the rename itself durable.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::store::{Result, SnapshotStore};

#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSnapshotStore { dir: dir.into() }
    }

    /// The file holding `key`'s record.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl SnapshotStore for FileSnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || write_atomic(&path, value.as_bytes())).await??;
        Ok(())
    }
}

/// Replaces the contents of `path` atomically and durably.
///
/// # Errors
///
/// Returns an error if any IO operation fails. The temp file may be left
/// behind; it is overwritten by the next write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent() {
        fsync_dir(parent)?;
    }

    Ok(())
}

/// Syncs a directory so that entries created or renamed in it survive a crash.
fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const KEY: &str = "https://github.com/octo/widgets";

    #[tokio::test]
    async fn missing_record_is_none() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        assert_eq!(store.get(KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_returns_latest_value() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested"));

        store.set(KEY, "{\"a\":1}".to_string()).await.unwrap();
        store.set(KEY, "{\"b\":2}".to_string()).await.unwrap();

        assert_eq!(store.get(KEY).await.unwrap(), Some("{\"b\":2}".to_string()));
    }

    #[tokio::test]
    async fn temp_file_cleaned_up() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        store.set(KEY, "{}".to_string()).await.unwrap();

        let path = store.path_for(KEY);
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn keys_map_to_single_flat_files() {
        let store = FileSnapshotStore::new("/state");

        let path = store.path_for(KEY);

        assert_eq!(path.parent(), Some(Path::new("/state")));
        assert_ne!(path, store.path_for("https://github.com/octo/gadgets"));
    }

    #[test]
    fn fsync_dir_fails_on_nonexistent() {
        assert!(fsync_dir(Path::new("/nonexistent/path/that/does/not/exist")).is_err());
    }
}
