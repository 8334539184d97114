//! Alert templates.
//!
//! Messages are sent with Telegram's HTML parse mode, so every string
//! that comes from outside the bot (auction metadata, resolved names) is
//! escaped before it is interpolated.

use super::amount::{format_end_time, format_token_amount};
use super::auction::{AuctionId, UnixSeconds};

/// Escape the three characters Telegram HTML treats specially.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders every alert the bot sends.
#[derive(Debug, Clone)]
pub struct AlertTemplates {
    /// Symbol appended to token amounts (e.g. `SQUID`).
    token_symbol: String,
}

impl AlertTemplates {
    pub fn new(token_symbol: impl Into<String>) -> Self {
        Self {
            token_symbol: token_symbol.into(),
        }
    }

    fn amount(&self, raw: u128) -> String {
        format!("{} {}", format_token_amount(raw), self.token_symbol)
    }

    /// New auction announcement. Name and description are omitted when
    /// metadata could not be fetched.
    pub fn auction_created(
        &self,
        auction_id: AuctionId,
        end_time: UnixSeconds,
        minimum_total_bid: Option<u128>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> String {
        let mut msg = String::from("🐙 A new auction has been created!\n\n");

        let mut has_header = false;
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            msg.push_str(&format!("<b>{}</b>\n", escape_html(name)));
            has_header = true;
        }
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            msg.push_str(&escape_html(description));
            msg.push('\n');
            has_header = true;
        }
        if has_header {
            msg.push('\n');
        }

        let minimum = minimum_total_bid.map_or_else(|| "unknown".to_string(), |raw| self.amount(raw));

        msg.push_str(&format!(
            "📌 <b>Auction ID:</b> {auction_id}\n\
             ⏳ <b>End Time:</b> {}\n\
             💵 <b>Minimum Total Bid:</b> {minimum}",
            format_end_time(end_time),
        ));
        msg
    }

    pub fn bid_placed(&self, auction_id: AuctionId, bidder: &str, value: u128) -> String {
        format!(
            "🦍 A new bid of <b>{}</b> on <b>Auction {auction_id}</b> by <code>{}</code>.",
            self.amount(value),
            escape_html(bidder),
        )
    }

    pub fn auction_extended(&self, auction_id: AuctionId, minutes_added: i64) -> String {
        format!("🕰️ <b>Auction {auction_id}</b> has been extended by <b>~{minutes_added}m</b>.")
    }

    pub fn auction_settled(&self, auction_id: AuctionId, winner: &str, amount: u128) -> String {
        format!(
            "🏆 <b>Auction {auction_id}</b> has been settled. The winner is <code>{}</code> \
             with a bid of <b>{}</b>.",
            escape_html(winner),
            self.amount(amount),
        )
    }

    pub fn closing_soon(&self, auction_id: AuctionId, minutes_left: i64) -> String {
        format!("⏰ <b>Auction {auction_id}</b> is ending soon (<b>~{minutes_left}m</b> left).")
    }

    pub fn started(&self, bot_name: &str) -> String {
        format!("🟢 🐙 <b>{} started successfully</b>", escape_html(bot_name))
    }

    pub fn stopped(&self, bot_name: &str) -> String {
        format!("🔴 🐙 <b>{} shutdown successfully</b>", escape_html(bot_name))
    }

    pub fn persistence_failed(&self, detail: &str) -> String {
        format!(
            "⚠️ <b>Watchlist persistence failed</b>: <code>{}</code>\n\
             In-memory state is kept but will be lost on crash.",
            escape_html(detail)
        )
    }

    pub fn state_file_corrupt(&self, detail: &str) -> String {
        format!(
            "⚠️ <b>Watchlist state file unreadable</b>, starting empty: <code>{}</code>",
            escape_html(detail)
        )
    }

    pub fn delivery_failed(&self, kind: &str, detail: &str) -> String {
        format!(
            "⚠️ <b>Failed to deliver {kind} alert</b>: <code>{}</code>",
            escape_html(detail)
        )
    }
}
