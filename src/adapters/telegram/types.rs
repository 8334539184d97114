//! Telegram Bot API Request/Response Types

use serde::{Deserialize, Serialize};

/// `sendMessage` payload.
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    /// Numeric chat id or `@channel` handle.
    pub chat_id: &'a str,
    /// Message body.
    pub text: &'a str,
    /// Always `HTML` for this bot.
    pub parse_mode: &'a str,
    /// Keep alerts compact.
    pub disable_web_page_preview: bool,
}

/// Envelope of every Bot API response (only the error text is used).
#[derive(Debug, Deserialize)]
pub struct TelegramResponse {
    /// Human-readable error on failure.
    pub description: Option<String>,
}
