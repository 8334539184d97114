//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use-case layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `AuctionEventSource`: Lifecycle events from the auction house
//! - `MetadataLookup`: Auction name/description lookup (best effort)
//! - `NameResolver`: Address → display name (never fails)
//! - `ChatNotifier`: Chat message delivery
//! - `WatchlistRepository`: Watchlist state persistence

pub mod event_source;
pub mod metadata;
pub mod names;
pub mod notifier;
pub mod repository;
