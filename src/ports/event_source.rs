//! Auction Event Source Port - Ledger Event Subscription
//!
//! Defines the trait for receiving auction lifecycle events. Ordering
//! within a single auction's lifecycle is the source's responsibility;
//! consumers do not re-verify it.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::auction::AuctionEvent;

/// Trait for auction lifecycle event providers.
///
/// Implementors decode events from the chain (or any transport) and
/// emit them via a broadcast channel. A source may redeliver events
/// after a reconnect; consumers must be idempotent.
#[async_trait]
pub trait AuctionEventSource: Send + Sync + 'static {
  /// Subscribe to the event stream.
  fn subscribe(&self) -> broadcast::Receiver<AuctionEvent>;

  /// Check if the source is currently keeping up with the chain.
  async fn is_healthy(&self) -> bool;
}
