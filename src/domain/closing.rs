//! Closing-soon window selection.
//!
//! Pure part of the sweep: given a watchlist snapshot and the current
//! time, pick the auctions whose deadline falls inside `(now, now + window]`.

use std::collections::BTreeMap;

use super::amount::whole_minutes_until;
use super::auction::{AuctionId, UnixSeconds};

/// Default closing-soon window: two hours.
pub const DEFAULT_WINDOW_SECS: i64 = 2 * 60 * 60;

/// An auction due for its single closing-soon alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingSoon {
    pub auction_id: AuctionId,
    pub end_time: UnixSeconds,
    pub minutes_left: i64,
}

/// True when `0 < end_time - now <= window_secs`.
pub const fn in_closing_window(end_time: UnixSeconds, now: UnixSeconds, window_secs: i64) -> bool {
    let remaining = end_time.saturating_sub(now);
    remaining > 0 && remaining <= window_secs
}

/// Select every entry inside the window, in ascending auction id order.
///
/// Entries already past their deadline or further out than the window
/// are not returned.
pub fn closing_soon(
    entries: &BTreeMap<AuctionId, UnixSeconds>,
    now: UnixSeconds,
    window_secs: i64,
) -> Vec<ClosingSoon> {
    entries
        .iter()
        .filter(|&(_, &end_time)| in_closing_window(end_time, now, window_secs))
        .map(|(&auction_id, &end_time)| ClosingSoon {
            auction_id,
            end_time,
            minutes_left: whole_minutes_until(end_time, now),
        })
        .collect()
}
