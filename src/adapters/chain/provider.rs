//! Chain RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Manages the JSON-RPC connection to the chain hosting the auction
//! house. Validates the chain id at startup and exposes a shared,
//! type-erased provider plus a typed `eth_call` helper for view calls.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::ChainConfig;

/// Shared chain provider backed by alloy-rs 0.9.
///
/// All chain adapters share a single provider instance to avoid
/// redundant connections.
pub struct ChainProvider {
    /// The alloy provider (type-erased over the built-in transports).
    provider: Arc<dyn Provider + Send + Sync>,
}

impl ChainProvider {
    /// Connect to the RPC endpoint and validate the chain id.
    ///
    /// `on_builtin` picks HTTP, WS or IPC from the URL scheme.
    #[instrument(skip_all)]
    pub async fn connect(config: &ChainConfig) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .on_builtin(&config.rpc_url)
            .await
            .context("Failed to connect to RPC endpoint")?;

        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        anyhow::ensure!(
            chain_id == config.chain_id,
            "Expected chain_id={}, RPC reports {chain_id}",
            config.chain_id
        );

        info!(chain_id, "Connected to chain RPC");

        Ok(Self { provider })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    /// Execute a view call and decode its return values.
    pub async fn view<C: SolCall + Send>(&self, to: Address, call: C) -> Result<C::Return> {
        let calldata = Bytes::from(call.abi_encode());
        let tx = TransactionRequest::default().to(to).input(calldata.into());

        let raw = self
            .provider
            .call(&tx)
            .await
            .with_context(|| format!("eth_call {} failed", C::SIGNATURE))?;

        C::abi_decode_returns(&raw, true)
            .with_context(|| format!("Failed to decode {} return data", C::SIGNATURE))
    }

    /// Check if the RPC connection is healthy via a lightweight call.
    pub async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
