//! Auction House Feed - Lifecycle Events from Contract Logs
//!
//! Implements the `AuctionEventSource` port by polling `eth_getLogs`
//! for the auction house contract in bounded block ranges and decoding
//! the four lifecycle events. Created auctions are enriched with the
//! on-chain `minimum_total_bid`.
//!
//! Delivery is at-least-once: a range that fails mid-way is retried
//! from its first block on the next tick, so some events may be
//! re-broadcast. Consumers are idempotent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::rpc::types::{Filter, Log};
use alloy::sol;
use alloy::sol_types::SolEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use super::provider::ChainProvider;
use crate::config::ChainConfig;
use crate::domain::auction::{AuctionEvent, AuctionId, UnixSeconds};
use crate::ports::event_source::AuctionEventSource;

sol! {
    /// Auction house events and views consumed by the bot.
    #[derive(Debug)]
    interface IAuctionHouse {
        event AuctionCreated(uint256 indexed auction_id, uint256 start_time, uint256 end_time);
        event AuctionBid(uint256 indexed auction_id, address indexed bidder, uint256 value, bool extended);
        event AuctionExtended(uint256 indexed auction_id, uint256 end_time);
        event AuctionSettled(uint256 indexed auction_id, address indexed winner, uint256 amount);

        function minimum_total_bid(uint256 auction_id) external view returns (uint256);
    }
}

/// Broadcast buffer; a slow dispatcher sees `Lagged` beyond this.
const EVENT_BUFFER: usize = 4096;

/// Polling log feed for one auction house contract.
pub struct AuctionHouseFeed {
    /// Shared chain provider.
    provider: Arc<ChainProvider>,
    /// Auction house address.
    address: Address,
    /// Decoded events fan-out.
    events_tx: broadcast::Sender<AuctionEvent>,
    /// Delay between polls.
    poll_interval: Duration,
    /// Maximum blocks per `eth_getLogs`.
    max_block_range: u64,
    /// First block to scan, if pinned in config.
    start_block: Option<u64>,
    /// Last poll succeeded.
    healthy: AtomicBool,
}

impl AuctionHouseFeed {
    /// Create a feed from chain config.
    pub fn new(provider: Arc<ChainProvider>, config: &ChainConfig) -> Result<Self> {
        let address: Address = config
            .auction_house
            .parse()
            .context("Invalid auction house address")?;
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        Ok(Self {
            provider,
            address,
            events_tx,
            poll_interval: config.poll_interval(),
            max_block_range: config.max_block_range,
            start_block: config.start_block,
            healthy: AtomicBool::new(false),
        })
    }

    /// Run the polling loop until shutdown.
    ///
    /// Errors never end the loop: the cursor stays put and the same
    /// range is retried on the next tick.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.address))]
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut next_block = match self.start_block {
            Some(block) => block,
            None => self.head().await? + 1,
        };

        info!(from_block = next_block, "Auction house feed started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Auction house feed shutting down");
                    return Ok(());
                }
                () = tokio::time::sleep(self.poll_interval) => {
                    match self.poll(next_block).await {
                        Ok(cursor) => {
                            next_block = cursor;
                            self.healthy.store(true, Ordering::Relaxed);
                        }
                        Err(e) => {
                            self.healthy.store(false, Ordering::Relaxed);
                            warn!(error = %format!("{e:#}"), from_block = next_block, "Log poll failed, will retry");
                        }
                    }
                }
            }
        }
    }

    async fn head(&self) -> Result<u64> {
        self.provider
            .inner()
            .get_block_number()
            .await
            .context("Failed to query block number")
    }

    /// Scan `[from, min(head, from + range - 1)]`; returns the next cursor.
    async fn poll(&self, from: u64) -> Result<u64> {
        let head = self.head().await?;
        if head < from {
            return Ok(from);
        }
        let to = head.min(from.saturating_add(self.max_block_range - 1));

        let filter = Filter::new()
            .address(self.address)
            .event_signature(vec![
                IAuctionHouse::AuctionCreated::SIGNATURE_HASH,
                IAuctionHouse::AuctionBid::SIGNATURE_HASH,
                IAuctionHouse::AuctionExtended::SIGNATURE_HASH,
                IAuctionHouse::AuctionSettled::SIGNATURE_HASH,
            ])
            .from_block(from)
            .to_block(to);

        let logs = self
            .provider
            .inner()
            .get_logs(&filter)
            .await
            .with_context(|| format!("eth_getLogs {from}..={to} failed"))?;

        for log in &logs {
            match self.decode(log).await {
                Ok(Some(event)) => {
                    debug!(?event, block = ?log.block_number, "Auction event decoded");
                    if self.events_tx.send(event).is_err() {
                        debug!("No event subscribers");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %format!("{e:#}"), tx = ?log.transaction_hash, "Skipping undecodable log");
                }
            }
        }

        if !logs.is_empty() {
            info!(from, to, events = logs.len(), "Processed auction house logs");
        }
        Ok(to + 1)
    }

    /// Decode one log into a domain event; `None` for foreign topics.
    async fn decode(&self, log: &Log) -> Result<Option<AuctionEvent>> {
        let Some(topic0) = log.topic0().copied() else {
            return Ok(None);
        };

        let event = if topic0 == IAuctionHouse::AuctionCreated::SIGNATURE_HASH {
            let e = log.log_decode::<IAuctionHouse::AuctionCreated>()?.inner.data;
            let auction_id = to_auction_id(e.auction_id)?;
            AuctionEvent::Created {
                auction_id,
                end_time: to_unix(e.end_time)?,
                minimum_total_bid: self.minimum_total_bid(e.auction_id).await,
            }
        } else if topic0 == IAuctionHouse::AuctionBid::SIGNATURE_HASH {
            let e = log.log_decode::<IAuctionHouse::AuctionBid>()?.inner.data;
            AuctionEvent::Bid {
                auction_id: to_auction_id(e.auction_id)?,
                bidder: e.bidder.to_string(),
                value: to_amount(e.value),
            }
        } else if topic0 == IAuctionHouse::AuctionExtended::SIGNATURE_HASH {
            let e = log.log_decode::<IAuctionHouse::AuctionExtended>()?.inner.data;
            AuctionEvent::Extended {
                auction_id: to_auction_id(e.auction_id)?,
                end_time: to_unix(e.end_time)?,
            }
        } else if topic0 == IAuctionHouse::AuctionSettled::SIGNATURE_HASH {
            let e = log.log_decode::<IAuctionHouse::AuctionSettled>()?.inner.data;
            AuctionEvent::Settled {
                auction_id: to_auction_id(e.auction_id)?,
                winner: e.winner.to_string(),
                amount: to_amount(e.amount),
            }
        } else {
            return Ok(None);
        };

        Ok(Some(event))
    }

    /// Read `minimum_total_bid(auction_id)`; `None` if the call fails.
    async fn minimum_total_bid(&self, auction_id: U256) -> Option<u128> {
        let call = IAuctionHouse::minimum_total_bidCall { auction_id };
        match self.provider.view(self.address, call).await {
            Ok(ret) => Some(to_amount(ret._0)),
            Err(e) => {
                warn!(%auction_id, error = %format!("{e:#}"), "minimum_total_bid unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl AuctionEventSource for AuctionHouseFeed {
    fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.events_tx.subscribe()
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

fn to_auction_id(raw: U256) -> Result<AuctionId> {
    u64::try_from(raw).map_err(|_| anyhow::anyhow!("auction id {raw} exceeds u64"))
}

fn to_unix(raw: U256) -> Result<UnixSeconds> {
    i64::try_from(raw).map_err(|_| anyhow::anyhow!("timestamp {raw} exceeds i64"))
}

/// Token amounts above `u128::MAX` saturate; display is unaffected in practice.
fn to_amount(raw: U256) -> u128 {
    u128::try_from(raw).unwrap_or(u128::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(to_auction_id(U256::from(42u64)).unwrap(), 42);
        assert!(to_auction_id(U256::MAX).is_err());
        assert_eq!(to_unix(U256::from(1_700_000_000u64)).unwrap(), 1_700_000_000);
        assert!(to_unix(U256::from(u64::MAX)).is_err());
        assert_eq!(to_amount(U256::from(10u128.pow(18))), 10u128.pow(18));
        assert_eq!(to_amount(U256::MAX), u128::MAX);
    }

    #[test]
    fn test_event_signatures_are_distinct() {
        let sigs = [
            IAuctionHouse::AuctionCreated::SIGNATURE_HASH,
            IAuctionHouse::AuctionBid::SIGNATURE_HASH,
            IAuctionHouse::AuctionExtended::SIGNATURE_HASH,
            IAuctionHouse::AuctionSettled::SIGNATURE_HASH,
        ];
        for (i, a) in sigs.iter().enumerate() {
            for b in &sigs[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(
            IAuctionHouse::AuctionExtended::SIGNATURE,
            "AuctionExtended(uint256,uint256)"
        );
    }
}
