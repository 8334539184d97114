//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the bot's core workflows.
//!
//! Use cases:
//! - `WatchlistStore`: Serialized, persisted auction deadlines
//! - `EventNormalizer`: Ledger event → rendered chat alert
//! - `EventDispatcher`: Ordered watchlist mutations + background alerts
//! - `Sweeper`: Scheduled closing-soon alerts
//! - `Notifier`: Retried delivery with operator escalation

pub mod dispatcher;
pub mod normalizer;
pub mod notifier;
pub mod sweeper;
pub mod watchlist;

pub use dispatcher::EventDispatcher;
pub use normalizer::{EventNormalizer, Notice};
pub use notifier::{Notifier, RetryPolicy};
pub use sweeper::{SweepReport, SweepSchedule, Sweeper};
pub use watchlist::{LoadOutcome, WatchlistStore};
