//! Prometheus Metrics Registry - Alerting Observability
//!
//! Registers the bot's counters and gauges. All metrics follow the
//! naming convention `auction_bot_*`; per-alert metrics carry a `kind`
//! label (`created`, `bid`, `extended`, `settled`, `closing_soon`,
//! `operator`).

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::warn;

use crate::domain::auction::AlertKind;

/// Centralized Prometheus metrics for the auction bot.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Ledger events received, by kind.
    pub events_received: IntCounterVec,
    /// Alerts delivered, by kind.
    pub alerts_sent: IntCounterVec,
    /// Alerts abandoned after the retry budget, by kind.
    pub alerts_failed: IntCounterVec,
    /// Auctions currently on the watchlist.
    pub watchlist_size: IntGauge,
    /// Completed sweeps.
    pub sweeps: IntCounter,
    /// Failed watchlist writes.
    pub persist_failures: IntCounter,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let events_received = IntCounterVec::new(
            Opts::new("auction_bot_events_total", "Auction lifecycle events received"),
            &["kind"],
        )?;

        let alerts_sent = IntCounterVec::new(
            Opts::new("auction_bot_alerts_sent_total", "Chat alerts delivered"),
            &["kind"],
        )?;

        let alerts_failed = IntCounterVec::new(
            Opts::new(
                "auction_bot_alerts_failed_total",
                "Chat alerts abandoned after retries",
            ),
            &["kind"],
        )?;

        let watchlist_size = IntGauge::new(
            "auction_bot_watchlist_size",
            "Auctions currently on the watchlist",
        )?;

        let sweeps = IntCounter::new("auction_bot_sweeps_total", "Completed closing-soon sweeps")?;

        let persist_failures = IntCounter::new(
            "auction_bot_persist_failures_total",
            "Failed watchlist state writes",
        )?;

        // Register all metrics
        registry.register(Box::new(events_received.clone()))?;
        registry.register(Box::new(alerts_sent.clone()))?;
        registry.register(Box::new(alerts_failed.clone()))?;
        registry.register(Box::new(watchlist_size.clone()))?;
        registry.register(Box::new(sweeps.clone()))?;
        registry.register(Box::new(persist_failures.clone()))?;

        Ok(Self {
            registry,
            events_received,
            alerts_sent,
            alerts_failed,
            watchlist_size,
            sweeps,
            persist_failures,
        })
    }

    pub fn record_event(&self, kind: AlertKind) {
        self.events_received.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn record_sent(&self, kind: AlertKind) {
        self.alerts_sent.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn record_failed(&self, kind: AlertKind) {
        self.alerts_failed.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn set_watchlist_size(&self, size: usize) {
        self.watchlist_size.set(i64::try_from(size).unwrap_or(i64::MAX));
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
