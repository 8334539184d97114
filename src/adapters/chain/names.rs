//! Name Service Reverse Resolution
//!
//! Implements the `NameResolver` port against an ENS-compatible
//! registry: `registry.resolver(node)` then `resolver.name(node)` with
//! `node = namehash("<hex addr>.addr.reverse")`. Hits are cached for
//! the life of the process; misses and errors fall back to the raw
//! address and are retried next time.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{keccak256, Address, B256};
use alloy::sol;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::provider::ChainProvider;
use crate::ports::names::NameResolver;

sol! {
    #[derive(Debug)]
    interface INameRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    #[derive(Debug)]
    interface INameResolver {
        function name(bytes32 node) external view returns (string);
    }
}

/// Recursive namehash; the empty name hashes to zero.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// Reverse record node for `address`.
pub fn reverse_node(address: Address) -> B256 {
    let hex = format!("{address:x}");
    namehash(&format!("{}.addr.reverse", hex.trim_start_matches("0x")))
}

/// Reverse resolver with an in-memory cache of successful lookups.
pub struct FnsResolver {
    provider: Arc<ChainProvider>,
    registry: Address,
    cache: RwLock<HashMap<Address, String>>,
}

impl FnsResolver {
    pub fn new(provider: Arc<ChainProvider>, registry: &str) -> Result<Self> {
        let registry = registry.parse().context("Invalid name registry address")?;
        Ok(Self {
            provider,
            registry,
            cache: RwLock::new(HashMap::new()),
        })
    }

    async fn lookup(&self, address: Address) -> Result<Option<String>> {
        let node = reverse_node(address);

        let resolver = self
            .provider
            .view(self.registry, INameRegistry::resolverCall { node })
            .await?
            ._0;
        if resolver == Address::ZERO {
            return Ok(None);
        }

        let name = self
            .provider
            .view(resolver, INameResolver::nameCall { node })
            .await?
            ._0;
        Ok(Some(name).filter(|n| !n.is_empty()))
    }
}

#[async_trait]
impl NameResolver for FnsResolver {
    async fn resolve(&self, address: &str) -> String {
        let Ok(parsed) = address.parse::<Address>() else {
            return address.to_string();
        };

        if let Some(name) = self.cache.read().await.get(&parsed) {
            return name.clone();
        }

        match self.lookup(parsed).await {
            Ok(Some(name)) => {
                debug!(%parsed, %name, "Reverse name resolved");
                self.cache.write().await.insert(parsed, name.clone());
                name
            }
            Ok(None) => address.to_string(),
            Err(e) => {
                warn!(%parsed, error = %format!("{e:#}"), "Reverse name lookup failed");
                address.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
    }

    #[test]
    fn test_reverse_node_uses_lowercase_hex() {
        let addr: Address = "0xd184CF2f60Da3C54eD1fc371a3e04179C41570c6".parse().unwrap();
        assert_eq!(
            reverse_node(addr),
            namehash("d184cf2f60da3c54ed1fc371a3e04179c41570c6.addr.reverse")
        );
    }
}
