//! Chat Notifier Port - Message Delivery Interface
//!
//! Defines the trait for delivering rendered alerts to a chat channel.
//! Errors are classified so the use-case layer can decide whether a
//! retry makes sense.

use async_trait::async_trait;
use thiserror::Error;

/// Logical destination of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatTarget {
  /// Public group receiving auction alerts.
  Group,
  /// Operator channel for lifecycle announcements and failures.
  Operator,
}

/// Delivery failure reported by a chat adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
  /// Network error, rate limit or server-side failure; worth retrying.
  #[error("transient chat delivery failure: {0}")]
  Transient(String),
  /// Rejected request (bad chat id, malformed payload); retrying won't help.
  #[error("permanent chat delivery failure: {0}")]
  Permanent(String),
}

impl NotifyError {
  /// Whether the failure may succeed on retry.
  pub const fn is_transient(&self) -> bool {
    matches!(self, Self::Transient(_))
  }
}

/// Trait for chat delivery providers.
///
/// A single call is a single attempt; retry policy lives in the
/// use-case layer.
#[async_trait]
pub trait ChatNotifier: Send + Sync + 'static {
  /// Deliver one message to the given target.
  async fn send(&self, target: ChatTarget, text: &str) -> Result<(), NotifyError>;
}
