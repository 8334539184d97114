//! Notifier Use Case - Retried Chat Delivery
//!
//! Wraps the `ChatNotifier` port with:
//! - Exponential backoff for transient failures, bounded attempts
//! - No retry for permanent failures
//! - One operator report when a group alert is finally dropped
//! - Tracked fire-and-forget tasks, drained on shutdown
//!
//! Operator reports never trigger further reports.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::config::TelegramConfig;
use crate::domain::auction::AlertKind;
use crate::domain::messages::AlertTemplates;
use crate::ports::notifier::{ChatNotifier, ChatTarget, NotifyError};

/// Retry budget for a single message.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Total attempts including the first.
  pub max_attempts: u32,
  /// Delay before the second attempt; doubles each retry.
  pub base_delay: Duration,
}

impl RetryPolicy {
  pub fn from_config(config: &TelegramConfig) -> Self {
    Self {
      max_attempts: config.max_attempts.max(1),
      base_delay: Duration::from_millis(config.retry_base_delay_ms),
    }
  }

  /// Backoff before attempt `attempt` (1-based retry index).
  fn delay(&self, attempt: u32) -> Duration {
    self.base_delay * 2u32.saturating_pow(attempt - 1)
  }
}

/// Chat delivery with retries and operator escalation.
pub struct Notifier {
  chat: Arc<dyn ChatNotifier>,
  policy: RetryPolicy,
  metrics: Arc<MetricsRegistry>,
  templates: AlertTemplates,
  bot_name: String,
  /// Fire-and-forget deliveries awaiting completion.
  in_flight: Mutex<JoinSet<()>>,
}

impl Notifier {
  pub fn new(
    chat: Arc<dyn ChatNotifier>,
    policy: RetryPolicy,
    metrics: Arc<MetricsRegistry>,
    templates: AlertTemplates,
    bot_name: impl Into<String>,
  ) -> Self {
    Self {
      chat,
      policy,
      metrics,
      templates,
      bot_name: bot_name.into(),
      in_flight: Mutex::new(JoinSet::new()),
    }
  }

  /// Send to `target`, retrying transient failures within the budget.
  pub async fn send_to(&self, target: ChatTarget, text: &str) -> Result<(), NotifyError> {
    let mut last_error = None;

    for attempt in 0..self.policy.max_attempts {
      if attempt > 0 {
        let delay = self.policy.delay(attempt);
        debug!(attempt, delay_ms = delay.as_millis(), ?target, "Retrying chat send");
        sleep(delay).await;
      }

      match self.chat.send(target, text).await {
        Ok(()) => return Ok(()),
        Err(e) if e.is_transient() => {
          warn!(error = %e, attempt, ?target, "Chat send failed");
          last_error = Some(e);
        }
        Err(e) => return Err(e),
      }
    }

    Err(last_error.unwrap_or_else(|| NotifyError::Transient("no attempts made".to_string())))
  }

  /// Deliver an alert to the group chat; returns whether it arrived.
  ///
  /// A final failure is reported once to the operator chat.
  pub async fn send(&self, kind: AlertKind, text: &str) -> bool {
    match self.send_to(ChatTarget::Group, text).await {
      Ok(()) => {
        self.metrics.record_sent(kind);
        true
      }
      Err(e) => {
        self.metrics.record_failed(kind);
        error!(error = %e, %kind, "Alert dropped after retries");
        self
          .report(&self.templates.delivery_failed(kind.as_str(), &e.to_string()))
          .await;
        false
      }
    }
  }

  /// Deliver an operator message; failures are only logged.
  pub async fn report(&self, text: &str) -> bool {
    match self.send_to(ChatTarget::Operator, text).await {
      Ok(()) => {
        self.metrics.record_sent(AlertKind::Operator);
        true
      }
      Err(e) => {
        self.metrics.record_failed(AlertKind::Operator);
        error!(error = %e, "Operator report failed");
        false
      }
    }
  }

  /// Queue an operator message without waiting for it.
  pub async fn report_in_background(self: &Arc<Self>, text: String) {
    let notifier = Arc::clone(self);
    self
      .spawn(async move {
        notifier.report(&text).await;
      })
      .await;
  }

  /// Track a delivery task so shutdown can wait for it.
  pub async fn spawn<F>(&self, task: F)
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let mut in_flight = self.in_flight.lock().await;
    while let Some(result) = in_flight.try_join_next() {
      if let Err(e) = result {
        error!(error = %e, "Notification task panicked");
      }
    }
    in_flight.spawn(task);
  }

  /// Number of deliveries still running.
  pub async fn pending(&self) -> usize {
    self.in_flight.lock().await.len()
  }

  /// Wait up to `grace` for outstanding deliveries, then abort the rest.
  ///
  /// Returns the number of abandoned deliveries.
  pub async fn drain(&self, grace: Duration) -> usize {
    let mut tasks = std::mem::take(&mut *self.in_flight.lock().await);
    if tasks.is_empty() {
      return 0;
    }

    info!(pending = tasks.len(), grace_secs = grace.as_secs(), "Draining notifications");

    let drained = tokio::time::timeout(grace, async {
      while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
          error!(error = %e, "Notification task panicked");
        }
      }
    })
    .await;

    if drained.is_ok() {
      return 0;
    }

    let abandoned = tasks.len();
    warn!(abandoned, "Grace period elapsed, aborting notifications");
    tasks.abort_all();
    abandoned
  }

  pub async fn announce_startup(&self) -> bool {
    self.report(&self.templates.started(&self.bot_name)).await
  }

  pub async fn announce_shutdown(&self) -> bool {
    self.report(&self.templates.stopped(&self.bot_name)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use async_trait::async_trait;
  use mockall::mock;
  use mockall::predicate::eq;

  mock! {
    Chat {}

    #[async_trait]
    impl ChatNotifier for Chat {
      async fn send(&self, target: ChatTarget, text: &str) -> Result<(), NotifyError>;
    }
  }

  fn notifier(chat: MockChat, max_attempts: u32) -> (Notifier, Arc<MetricsRegistry>) {
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let policy = RetryPolicy {
      max_attempts,
      base_delay: Duration::ZERO,
    };
    (
      Notifier::new(
        Arc::new(chat),
        policy,
        Arc::clone(&metrics),
        AlertTemplates::new("SQUID"),
        "test bot",
      ),
      metrics,
    )
  }

  #[test]
  fn test_backoff_doubles() {
    let policy = RetryPolicy {
      max_attempts: 4,
      base_delay: Duration::from_millis(500),
    };
    assert_eq!(policy.delay(1), Duration::from_millis(500));
    assert_eq!(policy.delay(2), Duration::from_millis(1000));
    assert_eq!(policy.delay(3), Duration::from_millis(2000));
  }

  #[tokio::test]
  async fn test_transient_failure_retried_until_success() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut chat = MockChat::new();
    chat
      .expect_send()
      .with(eq(ChatTarget::Group), eq("hello"))
      .times(3)
      .returning(move |_, _| {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
          Err(NotifyError::Transient("503".to_string()))
        } else {
          Ok(())
        }
      });

    let (notifier, metrics) = notifier(chat, 3);
    assert!(notifier.send(AlertKind::Bid, "hello").await);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(metrics.alerts_sent.with_label_values(&["bid"]).get(), 1);
  }

  #[tokio::test]
  async fn test_permanent_failure_not_retried_and_reported() {
    let mut chat = MockChat::new();
    chat
      .expect_send()
      .with(eq(ChatTarget::Group), eq("hello"))
      .times(1)
      .returning(|_, _| Err(NotifyError::Permanent("chat not found".to_string())));
    chat
      .expect_send()
      .withf(|target, text| *target == ChatTarget::Operator && text.contains("Failed to deliver bid alert"))
      .times(1)
      .returning(|_, _| Ok(()));

    let (notifier, metrics) = notifier(chat, 3);
    assert!(!notifier.send(AlertKind::Bid, "hello").await);
    assert_eq!(metrics.alerts_failed.with_label_values(&["bid"]).get(), 1);
    assert_eq!(metrics.alerts_sent.with_label_values(&["operator"]).get(), 1);
  }

  #[tokio::test]
  async fn test_exhausted_budget_reports_once_without_recursion() {
    let mut chat = MockChat::new();
    chat
      .expect_send()
      .with(eq(ChatTarget::Group), eq("hello"))
      .times(2)
      .returning(|_, _| Err(NotifyError::Transient("timeout".to_string())));
    // Operator chat is down too: retried within budget, then given up
    chat
      .expect_send()
      .withf(|target, _| *target == ChatTarget::Operator)
      .times(2)
      .returning(|_, _| Err(NotifyError::Transient("timeout".to_string())));

    let (notifier, metrics) = notifier(chat, 2);
    assert!(!notifier.send(AlertKind::ClosingSoon, "hello").await);
    assert_eq!(metrics.alerts_failed.with_label_values(&["operator"]).get(), 1);
  }

  #[tokio::test]
  async fn test_announcements_go_to_operator() {
    let mut chat = MockChat::new();
    chat
      .expect_send()
      .with(eq(ChatTarget::Operator), eq("🟢 🐙 <b>test bot started successfully</b>"))
      .times(1)
      .returning(|_, _| Ok(()));
    chat
      .expect_send()
      .with(eq(ChatTarget::Operator), eq("🔴 🐙 <b>test bot shutdown successfully</b>"))
      .times(1)
      .returning(|_, _| Ok(()));

    let (notifier, _) = notifier(chat, 1);
    assert!(notifier.announce_startup().await);
    assert!(notifier.announce_shutdown().await);
  }

  #[tokio::test]
  async fn test_drain_waits_for_tasks() {
    let mut chat = MockChat::new();
    chat.expect_send().times(3).returning(|_, _| Ok(()));
    let (notifier, metrics) = notifier(chat, 1);
    let notifier = Arc::new(notifier);

    for _ in 0..3 {
      let n = Arc::clone(&notifier);
      notifier
        .spawn(async move {
          n.send(AlertKind::Created, "x").await;
        })
        .await;
    }

    assert_eq!(notifier.drain(Duration::from_secs(5)).await, 0);
    assert_eq!(notifier.pending().await, 0);
    assert_eq!(metrics.alerts_sent.with_label_values(&["created"]).get(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_drain_aborts_after_grace() {
    let (notifier, _) = notifier(MockChat::new(), 1);
    notifier
      .spawn(async {
        sleep(Duration::from_secs(3600)).await;
      })
      .await;

    assert_eq!(notifier.drain(Duration::from_secs(1)).await, 1);
  }
}
