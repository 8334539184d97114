//! Watchlist Store - Crash-Durable Auction Deadlines
//!
//! Owns the auction id → end time mapping that drives closing-soon
//! alerts. Every mutation is followed by a full-state write through the
//! `WatchlistRepository` port while the same async mutex is held, so the
//! file always matches a state the map held and concurrent mutations
//! never lose an update.
//!
//! A failed write leaves the in-memory map authoritative and returns the
//! error for the caller to report.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::auction::{AuctionId, UnixSeconds};
use crate::ports::repository::{WatchlistRepository, WatchlistSnapshot};

/// Result of restoring the watchlist at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
  /// No state file; first run.
  Fresh,
  /// Previous state restored.
  Restored {
    /// Number of auctions restored.
    entries: usize,
  },
  /// State file present but unreadable; started empty.
  Corrupt {
    /// Reason, for the operator report.
    error: String,
  },
}

/// Serialized, persisted watchlist.
pub struct WatchlistStore {
  entries: Mutex<BTreeMap<AuctionId, UnixSeconds>>,
  repo: Arc<dyn WatchlistRepository>,
  /// Outcome of the most recent write (readiness signal).
  persist_ok: AtomicBool,
}

impl WatchlistStore {
  /// Create an empty store backed by `repo`.
  pub fn new(repo: Arc<dyn WatchlistRepository>) -> Self {
    Self {
      entries: Mutex::new(BTreeMap::new()),
      repo,
      persist_ok: AtomicBool::new(true),
    }
  }

  /// Replace the in-memory map with the persisted one.
  ///
  /// Never fails: a malformed file yields an empty watchlist and a
  /// `Corrupt` outcome the caller can report.
  pub async fn load(&self) -> LoadOutcome {
    let mut entries = self.entries.lock().await;

    match self.repo.load().await {
      Ok(Some(snapshot)) => {
        *entries = snapshot.auction_end_times;
        info!(entries = entries.len(), "Watchlist restored");
        LoadOutcome::Restored {
          entries: entries.len(),
        }
      }
      Ok(None) => {
        entries.clear();
        info!("No watchlist state found, starting empty");
        LoadOutcome::Fresh
      }
      Err(e) => {
        entries.clear();
        let error = format!("{e:#}");
        warn!(%error, "Watchlist state unreadable, starting empty");
        LoadOutcome::Corrupt { error }
      }
    }
  }

  /// Insert or overwrite an auction deadline, then persist.
  pub async fn add(&self, auction_id: AuctionId, end_time: UnixSeconds) -> Result<()> {
    let mut entries = self.entries.lock().await;
    entries.insert(auction_id, end_time);
    debug!(auction_id, end_time, "Watchlist entry set");
    self.write(&entries).await
  }

  /// Remove an auction if present; returns whether it was tracked.
  ///
  /// Removing an absent id is a no-op and skips the write.
  pub async fn remove(&self, auction_id: AuctionId) -> Result<bool> {
    let mut entries = self.entries.lock().await;
    if entries.remove(&auction_id).is_none() {
      debug!(auction_id, "Watchlist entry already absent");
      return Ok(false);
    }
    self.write(&entries).await?;
    Ok(true)
  }

  /// Remove a batch of `(auction_id, end_time)` entries with a single write.
  ///
  /// An entry is removed only if its stored deadline still equals the
  /// given one; a deadline rewritten since the caller's snapshot is kept.
  /// Returns how many entries were removed.
  pub async fn remove_many(&self, expected: &[(AuctionId, UnixSeconds)]) -> Result<usize> {
    let mut entries = self.entries.lock().await;
    let mut removed = 0;
    for &(auction_id, end_time) in expected {
      match entries.get(&auction_id) {
        Some(&stored) if stored == end_time => {
          entries.remove(&auction_id);
          removed += 1;
        }
        Some(&stored) => {
          debug!(auction_id, stored, end_time, "Deadline changed since snapshot, keeping entry");
        }
        None => {}
      }
    }
    if removed == 0 {
      return Ok(0);
    }
    self.write(&entries).await?;
    Ok(removed)
  }

  /// Copy of the current mapping; the lock is released on return.
  pub async fn snapshot(&self) -> BTreeMap<AuctionId, UnixSeconds> {
    self.entries.lock().await.clone()
  }

  /// Write the current state without mutating it.
  pub async fn persist(&self) -> Result<()> {
    let entries = self.entries.lock().await;
    self.write(&entries).await
  }

  /// Number of tracked auctions.
  pub async fn len(&self) -> usize {
    self.entries.lock().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.entries.lock().await.is_empty()
  }

  /// Whether the most recent write succeeded.
  pub fn last_persist_ok(&self) -> bool {
    self.persist_ok.load(Ordering::Relaxed)
  }

  /// Caller holds the lock for the duration of the write.
  async fn write(&self, entries: &BTreeMap<AuctionId, UnixSeconds>) -> Result<()> {
    let snapshot = WatchlistSnapshot {
      auction_end_times: entries.clone(),
    };
    match self.repo.save(&snapshot).await {
      Ok(()) => {
        self.persist_ok.store(true, Ordering::Relaxed);
        Ok(())
      }
      Err(e) => {
        self.persist_ok.store(false, Ordering::Relaxed);
        error!(error = %format!("{e:#}"), entries = entries.len(), "Watchlist persist failed");
        Err(e)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex as StdMutex;

  use async_trait::async_trait;

  /// In-memory repository recording every saved snapshot.
  #[derive(Default)]
  struct MemoryRepo {
    saved: StdMutex<Vec<WatchlistSnapshot>>,
    stored: StdMutex<Option<WatchlistSnapshot>>,
    fail_load: bool,
    fail_save: AtomicBool,
  }

  #[async_trait]
  impl WatchlistRepository for MemoryRepo {
    async fn save(&self, snapshot: &WatchlistSnapshot) -> Result<()> {
      if self.fail_save.load(Ordering::Relaxed) {
        anyhow::bail!("disk full");
      }
      self.saved.lock().unwrap().push(snapshot.clone());
      *self.stored.lock().unwrap() = Some(snapshot.clone());
      Ok(())
    }

    async fn load(&self) -> Result<Option<WatchlistSnapshot>> {
      if self.fail_load {
        anyhow::bail!("expected value at line 1 column 1");
      }
      Ok(self.stored.lock().unwrap().clone())
    }

    async fn is_healthy(&self) -> bool {
      true
    }
  }

  fn store_with(repo: Arc<MemoryRepo>) -> WatchlistStore {
    WatchlistStore::new(repo)
  }

  #[tokio::test]
  async fn test_add_is_idempotent() {
    let repo = Arc::new(MemoryRepo::default());
    let store = store_with(Arc::clone(&repo));

    store.add(7, 1_000).await.unwrap();
    store.add(7, 1_000).await.unwrap();

    assert_eq!(store.snapshot().await, BTreeMap::from([(7, 1_000)]));
    assert_eq!(repo.stored.lock().unwrap().as_ref().unwrap().auction_end_times.len(), 1);
  }

  #[tokio::test]
  async fn test_add_overwrites_deadline() {
    let store = store_with(Arc::new(MemoryRepo::default()));
    store.add(7, 1_000).await.unwrap();
    store.add(7, 2_000).await.unwrap();
    assert_eq!(store.snapshot().await[&7], 2_000);
  }

  #[tokio::test]
  async fn test_remove_absent_skips_write() {
    let repo = Arc::new(MemoryRepo::default());
    let store = store_with(Arc::clone(&repo));

    assert!(!store.remove(99).await.unwrap());
    assert!(repo.saved.lock().unwrap().is_empty());

    store.add(1, 10).await.unwrap();
    assert!(store.remove(1).await.unwrap());
    assert_eq!(repo.saved.lock().unwrap().len(), 2);
    assert!(store.is_empty().await);
  }

  #[tokio::test]
  async fn test_remove_many_single_write() {
    let repo = Arc::new(MemoryRepo::default());
    let store = store_with(Arc::clone(&repo));
    for id in 1..=3 {
      store.add(id, 100).await.unwrap();
    }
    let writes_before = repo.saved.lock().unwrap().len();

    assert_eq!(store.remove_many(&[(1, 100), (3, 100), (42, 100)]).await.unwrap(), 2);
    assert_eq!(repo.saved.lock().unwrap().len(), writes_before + 1);
    assert_eq!(store.snapshot().await, BTreeMap::from([(2, 100)]));
  }

  #[tokio::test]
  async fn test_remove_many_keeps_rewritten_deadline() {
    let repo = Arc::new(MemoryRepo::default());
    let store = store_with(Arc::clone(&repo));
    store.add(7, 600).await.unwrap();
    store.add(8, 700).await.unwrap();
    let snapshot: Vec<(AuctionId, UnixSeconds)> = store.snapshot().await.into_iter().collect();

    // Extension lands between the snapshot and the batch removal
    store.add(7, 6_000).await.unwrap();

    assert_eq!(store.remove_many(&snapshot).await.unwrap(), 1);
    assert_eq!(store.snapshot().await, BTreeMap::from([(7, 6_000)]));
    assert_eq!(
      repo.stored.lock().unwrap().as_ref().unwrap().auction_end_times,
      BTreeMap::from([(7, 6_000)])
    );
  }

  #[tokio::test]
  async fn test_load_outcomes() {
    let repo = Arc::new(MemoryRepo::default());
    let store = store_with(Arc::clone(&repo));
    assert_eq!(store.load().await, LoadOutcome::Fresh);

    store.add(5, 50).await.unwrap();
    let restarted = store_with(Arc::clone(&repo));
    assert_eq!(restarted.load().await, LoadOutcome::Restored { entries: 1 });
    assert_eq!(restarted.snapshot().await, BTreeMap::from([(5, 50)]));

    let broken = store_with(Arc::new(MemoryRepo {
      fail_load: true,
      ..MemoryRepo::default()
    }));
    assert!(matches!(broken.load().await, LoadOutcome::Corrupt { .. }));
    assert!(broken.is_empty().await);
  }

  #[tokio::test]
  async fn test_failed_write_keeps_memory_state() {
    let repo = Arc::new(MemoryRepo::default());
    let store = store_with(Arc::clone(&repo));
    repo.fail_save.store(true, Ordering::Relaxed);

    assert!(store.add(1, 10).await.is_err());
    assert!(!store.last_persist_ok());
    assert_eq!(store.len().await, 1);

    repo.fail_save.store(false, Ordering::Relaxed);
    store.persist().await.unwrap();
    assert!(store.last_persist_ok());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrent_add_and_batch_removal_lose_nothing() {
    let repo = Arc::new(MemoryRepo::default());
    let store = Arc::new(store_with(Arc::clone(&repo)));
    for id in 0..50 {
      store.add(id, 100).await.unwrap();
    }

    let mut handles = Vec::new();
    for id in 100..150 {
      let store = Arc::clone(&store);
      handles.push(tokio::spawn(async move { store.add(id, 200).await }));
    }
    let remover = {
      let store = Arc::clone(&store);
      tokio::spawn(async move {
        let expected: Vec<(AuctionId, UnixSeconds)> = (0..50).map(|id| (id, 100)).collect();
        store.remove_many(&expected).await
      })
    };

    for handle in handles {
      handle.await.unwrap().unwrap();
    }
    assert_eq!(remover.await.unwrap().unwrap(), 50);

    let expected: BTreeMap<AuctionId, UnixSeconds> = (100..150).map(|id| (id, 200)).collect();
    assert_eq!(store.snapshot().await, expected);
    assert_eq!(
      repo.stored.lock().unwrap().as_ref().unwrap().auction_end_times,
      expected
    );
  }
}
