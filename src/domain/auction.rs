//! Auction lifecycle types.
//!
//! Typed events decoded from the auction house contract, the watchlist
//! mutation each event implies, and the alert kinds used for logging and
//! metric labels. Addresses travel as display strings and token amounts as
//! raw 18-decimal integers; adapters do the conversion at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Auction identifier as emitted by the contract.
pub type AuctionId = u64;

/// Unix timestamp in whole seconds.
pub type UnixSeconds = i64;

/// A lifecycle event observed on the auction house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionEvent {
    /// A new auction was opened.
    Created {
        auction_id: AuctionId,
        end_time: UnixSeconds,
        /// Raw minimum total bid; `None` when the contract read failed.
        minimum_total_bid: Option<u128>,
    },
    /// A bid was placed.
    Bid {
        auction_id: AuctionId,
        bidder: String,
        value: u128,
    },
    /// The deadline moved (anti-sniping extension).
    Extended {
        auction_id: AuctionId,
        end_time: UnixSeconds,
    },
    /// The auction closed and was paid out.
    Settled {
        auction_id: AuctionId,
        winner: String,
        amount: u128,
    },
}

impl AuctionEvent {
    /// Identifier of the auction this event belongs to.
    pub const fn auction_id(&self) -> AuctionId {
        match self {
            Self::Created { auction_id, .. }
            | Self::Bid { auction_id, .. }
            | Self::Extended { auction_id, .. }
            | Self::Settled { auction_id, .. } => *auction_id,
        }
    }

    /// Alert kind used for metric labels.
    pub const fn kind(&self) -> AlertKind {
        match self {
            Self::Created { .. } => AlertKind::Created,
            Self::Bid { .. } => AlertKind::Bid,
            Self::Extended { .. } => AlertKind::Extended,
            Self::Settled { .. } => AlertKind::Settled,
        }
    }

    /// The watchlist change this event implies, if any.
    ///
    /// Created and Extended (re)track the deadline; Settled drops the
    /// entry early. Bids never touch the watchlist.
    pub const fn watch_mutation(&self) -> Option<WatchMutation> {
        match *self {
            Self::Created {
                auction_id,
                end_time,
                ..
            }
            | Self::Extended {
                auction_id,
                end_time,
            } => Some(WatchMutation::Track {
                auction_id,
                end_time,
            }),
            Self::Settled { auction_id, .. } => Some(WatchMutation::Untrack { auction_id }),
            Self::Bid { .. } => None,
        }
    }
}

/// A change to apply to the watchlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMutation {
    /// Insert or overwrite the deadline for an auction.
    Track {
        auction_id: AuctionId,
        end_time: UnixSeconds,
    },
    /// Stop watching an auction.
    Untrack { auction_id: AuctionId },
}

/// Category of an outgoing chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Created,
    Bid,
    Extended,
    Settled,
    ClosingSoon,
    /// Startup/shutdown announcements and operator reports.
    Operator,
}

impl AlertKind {
    /// Stable lowercase label for metrics and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Bid => "bid",
            Self::Extended => "extended",
            Self::Settled => "settled",
            Self::ClosingSoon => "closing_soon",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
