//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, chain RPC, file I/O). Each
//! sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Auction metadata REST client
//! - `chain`: Auction house events and name lookups via alloy-rs
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: Atomic watchlist snapshots
//! - `telegram`: Bot API chat delivery

pub mod api;
pub mod chain;
pub mod metrics;
pub mod persistence;
pub mod telegram;
