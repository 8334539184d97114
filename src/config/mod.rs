//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml`. Secrets (the
//! Telegram bot token) come from environment variables only.
//! All contract addresses and chat ids are externalized here -
//! nothing is hardcoded in the domain layer.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

/// Top-level bot configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the bot begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Bot identity and metadata.
  pub bot: BotConfig,
  /// Chain RPC and contract addresses.
  pub chain: ChainConfig,
  /// Auction metadata API.
  pub api: ApiConfig,
  /// Telegram delivery settings.
  pub telegram: TelegramConfig,
  /// Watchlist persistence.
  #[serde(default)]
  pub watchlist: WatchlistConfig,
  /// Closing-soon sweep schedule.
  #[serde(default)]
  pub sweeper: SweeperConfig,
  /// Display settings for auction amounts.
  #[serde(default)]
  pub auction: AuctionConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable bot name, used in startup/shutdown announcements.
  #[serde(default = "default_bot_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Grace period for in-flight notifications on shutdown (seconds).
  #[serde(default = "default_shutdown_grace")]
  pub shutdown_grace_secs: u64,
}

/// Chain connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// JSON-RPC endpoint.
  pub rpc_url: String,
  /// Expected chain id (252 = Fraxtal).
  #[serde(default = "default_chain_id")]
  pub chain_id: u64,
  /// Auction house contract address.
  pub auction_house: String,
  /// FNS registry for reverse name lookups; raw addresses when unset.
  pub fns_registry: Option<String>,
  /// Log polling interval (seconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_secs: u64,
  /// Maximum blocks per `eth_getLogs` request.
  #[serde(default = "default_max_block_range")]
  pub max_block_range: u64,
  /// First block to scan; defaults to the chain head at startup.
  pub start_block: Option<u64>,
}

/// Auction metadata API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the auction contract API.
  #[serde(default = "default_metadata_url")]
  pub metadata_base_url: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

/// Telegram delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
  /// Bot API base URL.
  #[serde(default = "default_telegram_url")]
  pub api_url: String,
  /// Chat receiving auction alerts.
  pub group_chat_id: String,
  /// Chat receiving lifecycle announcements and failure reports.
  pub operator_chat_id: String,
  /// Delivery attempts per message (first try included).
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  /// Base delay between retries (exponential backoff, milliseconds).
  #[serde(default = "default_retry_delay")]
  pub retry_base_delay_ms: u64,
  /// Outgoing message budget per minute.
  #[serde(default = "default_messages_per_minute")]
  pub messages_per_minute: u32,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

/// Watchlist persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistConfig {
  /// Directory holding `watchlist.json`.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

/// Closing-soon sweep configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
  /// Sweep period (seconds).
  #[serde(default = "default_sweep_interval")]
  pub interval_secs: u64,
  /// Alert when the deadline is at most this far away (seconds).
  #[serde(default = "default_closing_window")]
  pub closing_window_secs: i64,
  /// Fire on interval boundaries (top of the hour for 3600s).
  #[serde(default = "default_true")]
  pub align_to_interval: bool,
}

/// Auction display configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionConfig {
  /// Symbol shown after token amounts.
  #[serde(default = "default_token_symbol")]
  pub token_symbol: String,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Serve /live, /ready and /metrics.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Health and metrics port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl BotConfig {
  pub const fn shutdown_grace(&self) -> Duration {
    Duration::from_secs(self.shutdown_grace_secs)
  }
}

impl ChainConfig {
  pub const fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs)
  }
}

impl SweeperConfig {
  pub const fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_secs)
  }
}

impl Default for WatchlistConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

impl Default for SweeperConfig {
  fn default() -> Self {
    Self {
      interval_secs: default_sweep_interval(),
      closing_window_secs: default_closing_window(),
      align_to_interval: true,
    }
  }
}

impl Default for AuctionConfig {
  fn default() -> Self {
    Self {
      token_symbol: default_token_symbol(),
    }
  }
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      health_port: default_health_port(),
    }
  }
}

// Default value functions for serde

fn default_bot_name() -> String {
  "leviathan auction bot".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

const fn default_shutdown_grace() -> u64 {
  10
}

const fn default_chain_id() -> u64 {
  252
}

const fn default_poll_interval() -> u64 {
  4
}

const fn default_max_block_range() -> u64 {
  2_000
}

fn default_metadata_url() -> String {
  "https://api.leviathannews.xyz/api/v1/auction_contract".to_string()
}

const fn default_timeout() -> u64 {
  15
}

fn default_telegram_url() -> String {
  "https://api.telegram.org".to_string()
}

const fn default_max_attempts() -> u32 {
  3
}

const fn default_retry_delay() -> u64 {
  500
}

const fn default_messages_per_minute() -> u32 {
  20
}

fn default_data_dir() -> String {
  "data".to_string()
}

const fn default_sweep_interval() -> u64 {
  3_600
}

const fn default_closing_window() -> i64 {
  crate::domain::closing::DEFAULT_WINDOW_SECS
}

const fn default_true() -> bool {
  true
}

fn default_token_symbol() -> String {
  "SQUID".to_string()
}

const fn default_health_port() -> u16 {
  8080
}
