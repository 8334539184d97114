//! Chain Adapters - Auction House Ledger Access
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - RPC provider management and typed view calls
//! - Auction house lifecycle event polling
//! - Reverse name resolution for bidder and winner addresses

pub mod auction_house;
pub mod names;
pub mod provider;

pub use auction_house::AuctionHouseFeed;
pub use names::FnsResolver;
pub use provider::ChainProvider;
