//! Persistence Adapters - JSON File Storage
//!
//! Implements the `WatchlistRepository` port with an atomic JSON
//! snapshot file. No database dependency; lightweight and
//! crash-recoverable.

pub mod state;

pub use state::StateStore;
