//! Domain layer - Auction events, alert rendering, closing window.
//!
//! Pure logic with no I/O (hexagonal architecture inner ring). Everything
//! here is deterministic given its inputs, including the current time,
//! which callers pass in explicitly.

pub mod amount;
pub mod auction;
pub mod closing;
pub mod messages;

// Re-export core types for convenience
pub use auction::{AlertKind, AuctionEvent, AuctionId, UnixSeconds, WatchMutation};
pub use closing::{ClosingSoon, closing_soon};
pub use messages::AlertTemplates;
