//! State Store - Atomic JSON Watchlist Persistence
//!
//! Saves watchlist snapshots to `watchlist.json` using atomic writes
//! (write + fsync a tmp file, rename, then fsync the directory). This guarantees crash safety
//! and prevents partial writes from corrupting state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::ports::repository::{WatchlistRepository, WatchlistSnapshot};

/// Atomic JSON state store for crash recovery.
///
/// State is written to a temporary file first, then atomically
/// renamed to `watchlist.json`. The file is always either the old
/// or new version, never a partial write.
pub struct StateStore {
    /// Data directory, synced after each rename.
    dir: PathBuf,
    /// Path to watchlist.json.
    state_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl StateStore {
    /// Create a new state store in the given data directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        Ok(Self {
            dir: dir.to_path_buf(),
            state_path: dir.join("watchlist.json"),
            tmp_path: dir.join("watchlist.json.tmp"),
        })
    }

    /// Path of the live state file.
    pub fn path(&self) -> &Path {
        &self.state_path
    }

    /// Flush the directory entry so a completed rename survives power loss.
    async fn sync_dir(&self) -> Result<()> {
        let dir = fs::File::open(&self.dir)
            .await
            .context("Failed to open data directory")?;
        dir.sync_all()
            .await
            .context("Failed to sync data directory")
    }
}

#[async_trait]
impl WatchlistRepository for StateStore {
    /// Save a snapshot atomically (tmp → fsync → rename → dir fsync).
    #[instrument(skip(self, snapshot), fields(entries = snapshot.auction_end_times.len()))]
    async fn save(&self, snapshot: &WatchlistSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot).context("Failed to serialize watchlist")?;

        let mut file = fs::File::create(&self.tmp_path)
            .await
            .context("Failed to create tmp state file")?;
        file.write_all(&json)
            .await
            .context("Failed to write tmp state file")?;
        file.sync_all()
            .await
            .context("Failed to sync tmp state file")?;
        drop(file);

        // Atomic rename
        fs::rename(&self.tmp_path, &self.state_path)
            .await
            .context("Failed to rename state file")?;
        self.sync_dir().await?;

        debug!(path = %self.state_path.display(), "Watchlist snapshot saved");
        Ok(())
    }

    /// Load the stored snapshot.
    ///
    /// Returns `None` if no state file exists (first startup).
    #[instrument(skip(self))]
    async fn load(&self) -> Result<Option<WatchlistSnapshot>> {
        if !fs::try_exists(&self.state_path).await.unwrap_or(false) {
            info!(path = %self.state_path.display(), "No state file found, starting fresh");
            return Ok(None);
        }

        let json = fs::read_to_string(&self.state_path)
            .await
            .context("Failed to read state file")?;

        let snapshot: WatchlistSnapshot =
            serde_json::from_str(&json).context("Failed to parse state JSON")?;

        info!(
            entries = snapshot.auction_end_times.len(),
            "Watchlist snapshot loaded"
        );

        Ok(Some(snapshot))
    }

    /// Check if the data directory is writable.
    async fn is_healthy(&self) -> bool {
        let marker = self.dir.join(".health_check");
        let result = fs::write(&marker, b"ok").await;
        let _ = fs::remove_file(&marker).await;
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).await.unwrap();

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).await.unwrap();
        let snapshot = WatchlistSnapshot {
            auction_end_times: BTreeMap::from([(101, 1_700_003_000), (7, 1_700_000_060)]),
        };

        store.save(&snapshot).await.unwrap();

        // A fresh instance stands in for a process restart
        let reopened = StateStore::new(dir.path()).await.unwrap();
        assert_eq!(reopened.load().await.unwrap(), Some(snapshot));
        assert!(!dir.path().join("watchlist.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).await.unwrap();
        let first = WatchlistSnapshot {
            auction_end_times: BTreeMap::from([(1, 100)]),
        };
        let second = WatchlistSnapshot {
            auction_end_times: BTreeMap::from([(2, 200)]),
        };

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(second));
        assert!(!dir.path().join("watchlist.json.tmp").exists());
        store.sync_dir().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_fails_when_directory_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("state");
        let store = StateStore::new(&data).await.unwrap();
        std::fs::remove_dir_all(&data).unwrap();

        assert!(store.sync_dir().await.is_err());
        let snapshot = WatchlistSnapshot {
            auction_end_times: BTreeMap::from([(1, 100)]),
        };
        assert!(store.save(&snapshot).await.is_err());
    }

    #[tokio::test]
    async fn test_on_disk_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).await.unwrap();
        let snapshot = WatchlistSnapshot {
            auction_end_times: BTreeMap::from([(101, 1_700_003_000)]),
        };
        store.save(&snapshot).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "auction_end_times": { "101": 1_700_003_000 } })
        );
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).await.unwrap();
        std::fs::write(store.path(), b"{ not json").unwrap();

        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn test_healthy_when_writable() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).await.unwrap();
        assert!(store.is_healthy().await);
    }
}
