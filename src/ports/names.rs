//! Name Resolver Port - Address to Display Name
//!
//! Resolution must never fail outward: an unresolvable address is
//! displayed as itself.

use async_trait::async_trait;

/// Trait for reverse name resolution providers.
#[async_trait]
pub trait NameResolver: Send + Sync + 'static {
  /// Resolve an address to a display name, falling back to the address.
  async fn resolve(&self, address: &str) -> String;
}

/// Resolver that always displays the raw address.
///
/// Used when no name registry is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawAddresses;

#[async_trait]
impl NameResolver for RawAddresses {
  async fn resolve(&self, address: &str) -> String {
    address.to_string()
  }
}
