//! Event Dispatcher - Ordered Mutations, Concurrent Alerts
//!
//! Consumes the event stream in delivery order. Each event's watchlist
//! mutation is applied inline so per-auction ordering holds; rendering
//! and delivery run as a tracked background task so slow lookups or
//! chat retries never stall the stream.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, instrument, warn};

use super::normalizer::EventNormalizer;
use super::notifier::Notifier;
use super::watchlist::WatchlistStore;
use crate::adapters::metrics::MetricsRegistry;
use crate::domain::auction::{AuctionEvent, WatchMutation};
use crate::domain::messages::AlertTemplates;

pub struct EventDispatcher {
  store: Arc<WatchlistStore>,
  normalizer: Arc<EventNormalizer>,
  notifier: Arc<Notifier>,
  metrics: Arc<MetricsRegistry>,
  templates: AlertTemplates,
}

impl EventDispatcher {
  pub fn new(
    store: Arc<WatchlistStore>,
    normalizer: Arc<EventNormalizer>,
    notifier: Arc<Notifier>,
    metrics: Arc<MetricsRegistry>,
    templates: AlertTemplates,
  ) -> Self {
    Self {
      store,
      normalizer,
      notifier,
      metrics,
      templates,
    }
  }

  /// Dispatch events until shutdown or until the source closes.
  #[instrument(skip_all)]
  pub async fn run(
    &self,
    mut events_rx: broadcast::Receiver<AuctionEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
  ) {
    info!("Event dispatcher started");

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          let drained = self.drain_buffered(&mut events_rx).await;
          info!(drained, "Event dispatcher shutting down");
          return;
        }
        received = events_rx.recv() => match received {
          Ok(event) => self.handle(event).await,
          Err(RecvError::Lagged(skipped)) => {
            warn!(skipped, "Event dispatcher lagged, events dropped");
          }
          Err(RecvError::Closed) => {
            info!("Event source closed");
            return;
          }
        }
      }
    }
  }

  /// Handle every event already buffered; the feed restarts at the chain
  /// head, so anything left here would never be seen again.
  async fn drain_buffered(&self, events_rx: &mut broadcast::Receiver<AuctionEvent>) -> usize {
    let mut drained = 0;
    loop {
      match events_rx.try_recv() {
        Ok(event) => {
          self.handle(event).await;
          drained += 1;
        }
        Err(TryRecvError::Lagged(skipped)) => {
          warn!(skipped, "Event dispatcher lagged during drain, events dropped");
        }
        Err(TryRecvError::Empty | TryRecvError::Closed) => return drained,
      }
    }
  }

  /// Apply one event's mutation, then queue its alert.
  pub async fn handle(&self, event: AuctionEvent) {
    let kind = event.kind();
    self.metrics.record_event(kind);
    debug!(auction_id = event.auction_id(), %kind, "Dispatching event");

    if let Some(mutation) = event.watch_mutation() {
      self.apply(mutation).await;
    }

    let normalizer = Arc::clone(&self.normalizer);
    let notifier = Arc::clone(&self.notifier);
    self
      .notifier
      .spawn(async move {
        let notice = normalizer.render(&event, Utc::now().timestamp()).await;
        notifier.send(notice.kind, &notice.text).await;
      })
      .await;
  }

  /// Apply a watchlist mutation; persistence failures go to the operator.
  pub async fn apply(&self, mutation: WatchMutation) {
    let result = match mutation {
      WatchMutation::Track {
        auction_id,
        end_time,
      } => self.store.add(auction_id, end_time).await,
      WatchMutation::Untrack { auction_id } => self.store.remove(auction_id).await.map(|_| ()),
    };

    self.metrics.set_watchlist_size(self.store.len().await);

    if let Err(e) = result {
      self.metrics.persist_failures.inc();
      self
        .notifier
        .report_in_background(self.templates.persistence_failed(&format!("{e:#}")))
        .await;
    }
  }
}
