//! Event Normalizer - Ledger Events to Chat Alerts
//!
//! Renders each `AuctionEvent` into its group-chat message, enriching
//! Created events with off-chain metadata and Bid/Settled events with
//! resolved display names. Lookups are best effort and never fail the
//! rendering.

use std::sync::Arc;

use crate::domain::amount::whole_minutes_until;
use crate::domain::auction::{AlertKind, AuctionEvent, AuctionId, UnixSeconds};
use crate::domain::messages::AlertTemplates;
use crate::ports::metadata::MetadataLookup;
use crate::ports::names::NameResolver;

/// A rendered alert ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub kind: AlertKind,
  pub auction_id: AuctionId,
  pub text: String,
}

pub struct EventNormalizer {
  metadata: Arc<dyn MetadataLookup>,
  names: Arc<dyn NameResolver>,
  templates: AlertTemplates,
}

impl EventNormalizer {
  pub fn new(
    metadata: Arc<dyn MetadataLookup>,
    names: Arc<dyn NameResolver>,
    templates: AlertTemplates,
  ) -> Self {
    Self {
      metadata,
      names,
      templates,
    }
  }

  /// Render `event` as seen at `now`.
  pub async fn render(&self, event: &AuctionEvent, now: UnixSeconds) -> Notice {
    let text = match event {
      AuctionEvent::Created {
        auction_id,
        end_time,
        minimum_total_bid,
      } => {
        let meta = self
          .metadata
          .auction_metadata(*auction_id)
          .await
          .unwrap_or_default();
        self.templates.auction_created(
          *auction_id,
          *end_time,
          *minimum_total_bid,
          meta.name.as_deref(),
          meta.description.as_deref(),
        )
      }
      AuctionEvent::Bid {
        auction_id,
        bidder,
        value,
      } => {
        let bidder = self.names.resolve(bidder).await;
        self.templates.bid_placed(*auction_id, &bidder, *value)
      }
      AuctionEvent::Extended {
        auction_id,
        end_time,
      } => self
        .templates
        .auction_extended(*auction_id, whole_minutes_until(*end_time, now)),
      AuctionEvent::Settled {
        auction_id,
        winner,
        amount,
      } => {
        let winner = self.names.resolve(winner).await;
        self.templates.auction_settled(*auction_id, &winner, *amount)
      }
    };

    Notice {
      kind: event.kind(),
      auction_id: event.auction_id(),
      text,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use async_trait::async_trait;
  use mockall::mock;
  use mockall::predicate::eq;

  use crate::ports::metadata::AuctionMetadata;
  use crate::ports::names::RawAddresses;

  mock! {
    Metadata {}

    #[async_trait]
    impl MetadataLookup for Metadata {
      async fn auction_metadata(&self, auction_id: AuctionId) -> Option<AuctionMetadata>;
    }
  }

  mock! {
    Names {}

    #[async_trait]
    impl NameResolver for Names {
      async fn resolve(&self, address: &str) -> String;
    }
  }

  fn normalizer(metadata: MockMetadata, names: Arc<dyn NameResolver>) -> EventNormalizer {
    EventNormalizer::new(Arc::new(metadata), names, AlertTemplates::new("SQUID"))
  }

  #[tokio::test]
  async fn test_created_uses_metadata() {
    let mut metadata = MockMetadata::new();
    metadata.expect_auction_metadata().with(eq(42)).returning(|_| {
      Some(AuctionMetadata {
        name: Some("Squid #42".to_string()),
        description: Some("Rare & <wild>".to_string()),
        ..AuctionMetadata::default()
      })
    });

    let notice = normalizer(metadata, Arc::new(RawAddresses))
      .render(
        &AuctionEvent::Created {
          auction_id: 42,
          end_time: 0,
          minimum_total_bid: Some(10u128.pow(18)),
        },
        0,
      )
      .await;

    assert_eq!(notice.kind, AlertKind::Created);
    assert!(notice.text.contains("<b>Squid #42</b>\nRare &amp; &lt;wild&gt;\n"));
    assert!(notice.text.contains("1.0000 SQUID"));
  }

  #[tokio::test]
  async fn test_created_without_metadata() {
    let mut metadata = MockMetadata::new();
    metadata.expect_auction_metadata().returning(|_| None);

    let notice = normalizer(metadata, Arc::new(RawAddresses))
      .render(
        &AuctionEvent::Created {
          auction_id: 1,
          end_time: 0,
          minimum_total_bid: None,
        },
        0,
      )
      .await;

    assert!(notice.text.starts_with("🐙 A new auction has been created!\n\n📌"));
  }

  #[tokio::test]
  async fn test_bid_and_settled_resolve_names() {
    let mut names = MockNames::new();
    names
      .expect_resolve()
      .with(eq("0xabc"))
      .returning(|_| "squid.frax".to_string());

    let normalizer = normalizer(MockMetadata::new(), Arc::new(names));
    let bid = normalizer
      .render(
        &AuctionEvent::Bid {
          auction_id: 5,
          bidder: "0xabc".to_string(),
          value: 3 * 10u128.pow(18),
        },
        0,
      )
      .await;
    let settled = normalizer
      .render(
        &AuctionEvent::Settled {
          auction_id: 5,
          winner: "0xabc".to_string(),
          amount: 3 * 10u128.pow(18),
        },
        0,
      )
      .await;

    assert_eq!(
      bid.text,
      "🦍 A new bid of <b>3.0000 SQUID</b> on <b>Auction 5</b> by <code>squid.frax</code>."
    );
    assert!(settled.text.contains("The winner is <code>squid.frax</code>"));
  }

  #[tokio::test]
  async fn test_extended_minutes_from_now() {
    let notice = normalizer(MockMetadata::new(), Arc::new(RawAddresses))
      .render(
        &AuctionEvent::Extended {
          auction_id: 3,
          end_time: 1_000 + 15 * 60 + 59,
        },
        1_000,
      )
      .await;
    assert_eq!(
      notice.text,
      "🕰️ <b>Auction 3</b> has been extended by <b>~15m</b>."
    );
  }
}
