//! Repository Port - Watchlist State Persistence
//!
//! The whole watchlist is saved as a single JSON object after every
//! mutation. Implementations must replace the previous state atomically
//! so a crash leaves either the old or the new snapshot on disk.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::auction::{AuctionId, UnixSeconds};

/// On-disk watchlist format: `{"auction_end_times": {"<id>": <unix_s>}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistSnapshot {
  /// Auction id → deadline (unix seconds).
  #[serde(default)]
  pub auction_end_times: BTreeMap<AuctionId, UnixSeconds>,
}

/// Trait for watchlist persistence providers.
#[async_trait]
pub trait WatchlistRepository: Send + Sync + 'static {
  /// Atomically replace the stored snapshot.
  async fn save(&self, snapshot: &WatchlistSnapshot) -> anyhow::Result<()>;

  /// Load the stored snapshot; `Ok(None)` when nothing was ever saved.
  ///
  /// A present but unreadable or malformed snapshot is an `Err`.
  async fn load(&self) -> anyhow::Result<Option<WatchlistSnapshot>>;

  /// Check if the backing storage is writable.
  async fn is_healthy(&self) -> bool;
}
