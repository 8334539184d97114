//! Auction Metadata API Response Types
//!
//! Mirrors the JSON served per auction:
//! `{"auction_id": .., "metadata": {"name", "description", "image_url",
//! "attributes": [{"trait_type", "value"}]}}`. Every field is optional;
//! malformed attribute entries are skipped.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::ports::metadata::AuctionMetadata;

/// Single-auction response body.
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionResponse {
  /// Descriptive metadata; `null` before the item is pinned.
  #[serde(default)]
  pub metadata: Option<RawMetadata>,
}

/// Metadata block as served by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetadata {
  pub name: Option<String>,
  pub description: Option<String>,
  pub image_url: Option<String>,
  /// Loosely typed: entries that are not objects are ignored.
  #[serde(default)]
  pub attributes: Vec<serde_json::Value>,
}

impl AuctionResponse {
  /// Flatten into the port type.
  pub fn into_metadata(self) -> AuctionMetadata {
    let raw = self.metadata.unwrap_or_default();

    let attributes: BTreeMap<String, serde_json::Value> = raw
      .attributes
      .iter()
      .filter_map(|attr| {
        let obj = attr.as_object()?;
        let trait_type = obj.get("trait_type")?.as_str()?.to_string();
        let value = obj.get("value").cloned().unwrap_or(serde_json::Value::Null);
        Some((trait_type, value))
      })
      .collect();

    AuctionMetadata {
      name: raw.name,
      description: raw.description,
      image_url: raw.image_url,
      attributes,
    }
  }
}
