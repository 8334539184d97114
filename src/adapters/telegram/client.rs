//! Telegram Bot API Client - Rate-limited Chat Delivery
//!
//! Implements the `ChatNotifier` port with `sendMessage` (HTML parse
//! mode). Each call is a single attempt; HTTP failures are classified as
//! transient (network, 429, 5xx) or permanent (other 4xx) so the
//! notifier use case can decide on retries.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use super::types::{SendMessageRequest, TelegramResponse};
use crate::config::TelegramConfig;
use crate::ports::notifier::{ChatNotifier, ChatTarget, NotifyError};

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Telegram delivery adapter.
pub struct TelegramNotifier {
    /// Underlying HTTP client.
    http: Client,
    /// `{api_url}/bot{token}/sendMessage`; never logged.
    send_url: String,
    /// Chat receiving auction alerts.
    group_chat_id: String,
    /// Chat receiving operator messages.
    operator_chat_id: String,
    /// Outgoing message budget.
    limiter: DefaultDirectRateLimiter,
}

impl TelegramNotifier {
    /// Create a notifier with the token from `TELEGRAM_BOT_TOKEN`.
    pub fn from_env(config: &TelegramConfig) -> Result<Self> {
        let token = std::env::var(TOKEN_ENV).with_context(|| format!("{TOKEN_ENV} not set"))?;
        Self::new(config, &token)
    }

    /// Create a notifier with an explicit token.
    pub fn new(config: &TelegramConfig, token: &str) -> Result<Self> {
        anyhow::ensure!(!token.trim().is_empty(), "Telegram bot token is empty");

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(2)
            .build()
            .context("Failed to build HTTP client")?;

        let per_minute = NonZeroU32::new(config.messages_per_minute)
            .context("messages_per_minute must be positive")?;

        Ok(Self {
            http,
            send_url: format!(
                "{}/bot{}/sendMessage",
                config.api_url.trim_end_matches('/'),
                token.trim()
            ),
            group_chat_id: config.group_chat_id.clone(),
            operator_chat_id: config.operator_chat_id.clone(),
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        })
    }

    fn chat_id(&self, target: ChatTarget) -> &str {
        match target {
            ChatTarget::Group => &self.group_chat_id,
            ChatTarget::Operator => &self.operator_chat_id,
        }
    }
}

#[async_trait]
impl ChatNotifier for TelegramNotifier {
    #[instrument(skip(self, text), fields(target = ?target, len = text.len()))]
    async fn send(&self, target: ChatTarget, text: &str) -> Result<(), NotifyError> {
        self.limiter.until_ready().await;

        let body = SendMessageRequest {
            chat_id: self.chat_id(target),
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = match self.http.post(&self.send_url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                // without_url: the request URL embeds the bot token
                let e = e.without_url();
                warn!(error = %e, "Telegram request failed");
                return Err(if e.is_builder() {
                    NotifyError::Permanent(e.to_string())
                } else {
                    NotifyError::Transient(e.to_string())
                });
            }
        };

        let status = response.status();
        let description = response
            .json::<TelegramResponse>()
            .await
            .ok()
            .and_then(|r| r.description)
            .unwrap_or_default();

        let outcome = classify(status, &description);
        if outcome.is_ok() {
            debug!("Telegram message delivered");
        }
        outcome
    }
}

/// Map a Bot API response status onto the delivery outcome.
fn classify(status: StatusCode, description: &str) -> Result<(), NotifyError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::TOO_MANY_REQUESTS => Err(NotifyError::Transient(format!(
            "rate limited by Telegram: {description}"
        ))),
        s if s.is_server_error() => Err(NotifyError::Transient(format!(
            "Telegram server error {s}: {description}"
        ))),
        s => Err(NotifyError::Permanent(format!(
            "Telegram rejected message {s}: {description}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelegramConfig {
        TelegramConfig {
            api_url: "https://api.telegram.org/".to_string(),
            group_chat_id: "-100111".to_string(),
            operator_chat_id: "-100222".to_string(),
            max_attempts: 3,
            retry_base_delay_ms: 500,
            messages_per_minute: 20,
            timeout_secs: 15,
        }
    }

    #[test]
    fn test_classify_statuses() {
        assert!(classify(StatusCode::OK, "").is_ok());
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, "retry after 3").unwrap_err().is_transient());
        assert!(classify(StatusCode::BAD_GATEWAY, "").unwrap_err().is_transient());
        assert!(!classify(StatusCode::BAD_REQUEST, "chat not found").unwrap_err().is_transient());
        assert!(!classify(StatusCode::FORBIDDEN, "bot was kicked").unwrap_err().is_transient());
    }

    #[test]
    fn test_chat_routing_and_url() {
        let notifier = TelegramNotifier::new(&config(), "123:abc").unwrap();
        assert_eq!(notifier.chat_id(ChatTarget::Group), "-100111");
        assert_eq!(notifier.chat_id(ChatTarget::Operator), "-100222");
        assert_eq!(notifier.send_url, "https://api.telegram.org/bot123:abc/sendMessage");
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(TelegramNotifier::new(&config(), "  ").is_err());
    }
}
