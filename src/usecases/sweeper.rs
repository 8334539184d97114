//! Sweeper Use Case - Hourly Closing-Soon Alerts
//!
//! Scans a snapshot of the watchlist for auctions ending within the
//! closing window, alerts each one, then removes every alerted auction
//! in a single batch. Removal after alerting makes the alert
//! at-most-once per tracked deadline; an Extended event re-adds the
//! auction and re-arms it.
//!
//! Sweeps are single-flight: a tick that fires while a sweep is still
//! running is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, broadcast};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use super::notifier::Notifier;
use super::watchlist::WatchlistStore;
use crate::adapters::metrics::MetricsRegistry;
use crate::domain::auction::{AlertKind, AuctionId, UnixSeconds};
use crate::domain::closing::closing_soon;
use crate::domain::messages::AlertTemplates;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
  /// Entries inspected.
  pub checked: usize,
  /// Alerts delivered.
  pub alerted: usize,
  /// Alerts abandoned after retries.
  pub failed: usize,
  /// Entries removed from the watchlist.
  pub removed: usize,
}

/// Sweep scheduling parameters.
#[derive(Debug, Clone, Copy)]
pub struct SweepSchedule {
  /// Time between sweeps.
  pub interval: Duration,
  /// Alert when `0 < end - now <= window` seconds.
  pub window_secs: i64,
  /// Fire on interval boundaries (top of the hour for 3600 s).
  pub align: bool,
}

pub struct Sweeper {
  store: Arc<WatchlistStore>,
  notifier: Arc<Notifier>,
  metrics: Arc<MetricsRegistry>,
  templates: AlertTemplates,
  schedule: SweepSchedule,
  /// Held for the duration of a sweep.
  in_flight: Mutex<()>,
}

impl Sweeper {
  pub fn new(
    store: Arc<WatchlistStore>,
    notifier: Arc<Notifier>,
    metrics: Arc<MetricsRegistry>,
    templates: AlertTemplates,
    schedule: SweepSchedule,
  ) -> Self {
    Self {
      store,
      notifier,
      metrics,
      templates,
      schedule,
      in_flight: Mutex::new(()),
    }
  }

  /// Sweep against the wall clock.
  pub async fn sweep(&self) -> Option<SweepReport> {
    self.sweep_at(Utc::now().timestamp()).await
  }

  /// Sweep as of `now`; `None` when another sweep is in flight.
  #[instrument(skip(self))]
  pub async fn sweep_at(&self, now: UnixSeconds) -> Option<SweepReport> {
    let Ok(_guard) = self.in_flight.try_lock() else {
      warn!("Previous sweep still running, skipping");
      return None;
    };

    let snapshot = self.store.snapshot().await;
    let due = closing_soon(&snapshot, now, self.schedule.window_secs);

    let mut report = SweepReport {
      checked: snapshot.len(),
      ..SweepReport::default()
    };
    // Removal is keyed on the snapshotted deadline so an extension
    // observed mid-sweep survives and re-arms the alert
    let mut marked: Vec<(AuctionId, UnixSeconds)> = Vec::with_capacity(due.len());

    for entry in &due {
      let text = self
        .templates
        .closing_soon(entry.auction_id, entry.minutes_left);
      if self.notifier.send(AlertKind::ClosingSoon, &text).await {
        report.alerted += 1;
      } else {
        report.failed += 1;
      }
      marked.push((entry.auction_id, entry.end_time));
    }

    if !marked.is_empty() {
      report.removed = match self.store.remove_many(&marked).await {
        Ok(removed) => removed,
        Err(e) => {
          self.metrics.persist_failures.inc();
          self
            .notifier
            .report(&self.templates.persistence_failed(&format!("{e:#}")))
            .await;
          marked.len()
        }
      };
    }

    self.metrics.sweeps.inc();
    self.metrics.set_watchlist_size(self.store.len().await);

    info!(
      checked = report.checked,
      alerted = report.alerted,
      failed = report.failed,
      removed = report.removed,
      "Sweep complete"
    );
    Some(report)
  }

  /// Run sweeps on schedule until shutdown.
  pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
    let start = Instant::now() + self.first_delay(Utc::now().timestamp());
    let mut ticker = tokio::time::interval_at(start, self.schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
      interval_secs = self.schedule.interval.as_secs(),
      window_secs = self.schedule.window_secs,
      "Sweeper started"
    );

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Sweeper shutting down");
          return;
        }
        _ = ticker.tick() => {
          debug!("Sweep tick");
          self.sweep().await;
        }
      }
    }
  }

  /// Delay until the next interval boundary, or one interval if unaligned.
  fn first_delay(&self, now: UnixSeconds) -> Duration {
    let interval = self.schedule.interval.as_secs().max(1);
    if !self.schedule.align {
      return Duration::from_secs(interval);
    }
    let elapsed = now.rem_euclid(i64::try_from(interval).unwrap_or(i64::MAX));
    let elapsed = u64::try_from(elapsed).unwrap_or(0);
    Duration::from_secs(interval - elapsed)
  }
}
