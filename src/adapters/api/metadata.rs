//! Auction Metadata API Client
//!
//! Implements the `MetadataLookup` port against the auction contract
//! API: `GET {base}/{chain_id}/{auction_house}/{auction_id}/`. Any HTTP
//! or decoding failure is logged and collapsed into `None`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::types::AuctionResponse;
use crate::config::ApiConfig;
use crate::domain::auction::AuctionId;
use crate::ports::metadata::{AuctionMetadata, MetadataLookup};

/// HTTP client for per-auction metadata.
pub struct MetadataApi {
  /// Underlying HTTP client.
  http: Client,
  /// `{base}/{chain_id}/{auction_house}/`, always ending in `/`.
  contract_url: String,
}

impl MetadataApi {
  /// Create a client scoped to one auction house contract.
  pub fn new(config: &ApiConfig, chain_id: u64, auction_house: &str) -> Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      http,
      contract_url: format!(
        "{}/{chain_id}/{auction_house}/",
        config.metadata_base_url.trim_end_matches('/')
      ),
    })
  }

  fn auction_url(&self, auction_id: AuctionId) -> String {
    format!("{}{auction_id}/", self.contract_url)
  }

  async fn fetch(&self, auction_id: AuctionId) -> Result<AuctionMetadata> {
    let response = self
      .http
      .get(self.auction_url(auction_id))
      .send()
      .await
      .context("Metadata request failed")?
      .error_for_status()
      .context("Metadata API returned an error status")?;

    let body: AuctionResponse = response
      .json()
      .await
      .context("Failed to decode metadata JSON")?;

    Ok(body.into_metadata())
  }
}

#[async_trait]
impl MetadataLookup for MetadataApi {
  #[instrument(skip(self))]
  async fn auction_metadata(&self, auction_id: AuctionId) -> Option<AuctionMetadata> {
    match self.fetch(auction_id).await {
      Ok(meta) => {
        debug!(name = ?meta.name, "Auction metadata fetched");
        Some(meta)
      }
      Err(e) => {
        warn!(error = %format!("{e:#}"), "Auction metadata unavailable");
        None
      }
    }
  }
}
