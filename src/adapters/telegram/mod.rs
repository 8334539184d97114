//! Telegram Chat Adapter
//!
//! Sub-modules:
//! - `client`: `sendMessage` delivery with rate limiting
//! - `types`: Bot API request/response types

pub mod client;
pub mod types;

pub use client::TelegramNotifier;
