//! Metadata Lookup Port - Auction Name and Description
//!
//! Best-effort lookup: every failure collapses into `None` so callers
//! degrade gracefully instead of erroring.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::auction::AuctionId;

/// Descriptive metadata attached to an auction off-chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuctionMetadata {
  /// Display name of the auctioned item.
  pub name: Option<String>,
  /// Free-form description.
  pub description: Option<String>,
  /// Image URL, if any.
  pub image_url: Option<String>,
  /// Trait type → value.
  pub attributes: BTreeMap<String, serde_json::Value>,
}

/// Trait for auction metadata providers.
#[async_trait]
pub trait MetadataLookup: Send + Sync + 'static {
  /// Fetch metadata for an auction, or `None` on any failure.
  async fn auction_metadata(&self, auction_id: AuctionId) -> Option<AuctionMetadata>;
}
