//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    chain_id = config.chain.chain_id,
    auction_house = %config.chain.auction_house,
    sweep_interval_secs = config.sweeper.interval_secs,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  // Chain validation
  anyhow::ensure!(
    !config.chain.rpc_url.is_empty(),
    "chain.rpc_url must not be empty"
  );
  anyhow::ensure!(
    config.chain.auction_house.starts_with("0x") && config.chain.auction_house.len() == 42,
    "chain.auction_house must be a 0x-prefixed 20-byte address, got {}",
    config.chain.auction_house
  );
  if let Some(registry) = &config.chain.fns_registry {
    anyhow::ensure!(
      registry.starts_with("0x") && registry.len() == 42,
      "chain.fns_registry must be a 0x-prefixed 20-byte address, got {registry}"
    );
  }
  anyhow::ensure!(
    config.chain.poll_interval_secs > 0,
    "chain.poll_interval_secs must be positive"
  );
  anyhow::ensure!(
    config.chain.max_block_range > 0,
    "chain.max_block_range must be positive"
  );

  // Telegram validation
  anyhow::ensure!(
    !config.telegram.group_chat_id.is_empty(),
    "telegram.group_chat_id must not be empty"
  );
  anyhow::ensure!(
    !config.telegram.operator_chat_id.is_empty(),
    "telegram.operator_chat_id must not be empty"
  );
  anyhow::ensure!(
    (1..=10).contains(&config.telegram.max_attempts),
    "telegram.max_attempts must be in [1, 10], got {}",
    config.telegram.max_attempts
  );
  anyhow::ensure!(
    config.telegram.messages_per_minute > 0,
    "telegram.messages_per_minute must be positive"
  );

  // Sweeper validation
  anyhow::ensure!(
    config.sweeper.interval_secs > 0,
    "sweeper.interval_secs must be positive"
  );
  anyhow::ensure!(
    config.sweeper.closing_window_secs > 0,
    "sweeper.closing_window_secs must be positive, got {}",
    config.sweeper.closing_window_secs
  );
  if config.sweeper.closing_window_secs < i64::try_from(config.sweeper.interval_secs).unwrap_or(i64::MAX) {
    tracing::warn!(
      window = config.sweeper.closing_window_secs,
      interval = config.sweeper.interval_secs,
      "Closing window shorter than sweep interval; some auctions may never be alerted"
    );
  }

  anyhow::ensure!(
    !config.watchlist.data_dir.is_empty(),
    "watchlist.data_dir must not be empty"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINIMAL: &str = r#"
    [bot]

    [chain]
    rpc_url = "https://rpc.frax.com"
    auction_house = "0xd184CF2f60Da3C54eD1fc371a3e04179C41570c6"

    [api]

    [telegram]
    group_chat_id = "-1001234567890"
    operator_chat_id = "-1009876543210"
  "#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = parse_config(MINIMAL).unwrap();

    assert_eq!(config.bot.name, "leviathan auction bot");
    assert_eq!(config.chain.chain_id, 252);
    assert!(config.chain.fns_registry.is_none());
    assert_eq!(config.sweeper.interval_secs, 3_600);
    assert_eq!(config.sweeper.closing_window_secs, 7_200);
    assert!(config.sweeper.align_to_interval);
    assert_eq!(config.telegram.max_attempts, 3);
    assert_eq!(config.auction.token_symbol, "SQUID");
    assert_eq!(config.watchlist.data_dir, "data");
    assert_eq!(config.metrics.health_port, 8080);
  }

  #[test]
  fn test_rejects_bad_auction_house() {
    let bad = MINIMAL.replace("0xd184CF2f60Da3C54eD1fc371a3e04179C41570c6", "squid");
    assert!(parse_config(&bad).is_err());
  }

  #[test]
  fn test_rejects_zero_attempts() {
    let bad = format!("{MINIMAL}\nmax_attempts = 0\n");
    // appended under [telegram], the last table
    assert!(parse_config(&bad).is_err());
  }
}
