//! Health Check Server - Liveness, Readiness and Metrics
//!
//! Exposes /live, /ready and /metrics via axum 0.7 for Docker
//! health checks and Prometheus scraping. Readiness depends on the
//! event source keeping up and the last watchlist write succeeding.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use super::prometheus::MetricsRegistry;
use crate::ports::event_source::AuctionEventSource;
use crate::usecases::watchlist::WatchlistStore;

/// Shared state polled by the probes.
#[derive(Clone)]
pub struct HealthState {
    /// Event source whose health gates readiness.
    source: Arc<dyn AuctionEventSource>,
    /// Watchlist whose last write gates readiness.
    store: Arc<WatchlistStore>,
    /// Metrics rendered on /metrics.
    metrics: Arc<MetricsRegistry>,
    /// Cleared during graceful shutdown.
    accepting: Arc<AtomicBool>,
}

impl HealthState {
    pub fn new(
        source: Arc<dyn AuctionEventSource>,
        store: Arc<WatchlistStore>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            source,
            store,
            metrics,
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark the process as shutting down (readiness → 503).
    pub fn mark_draining(&self) {
        self.accepting.store(false, Ordering::Relaxed);
    }

    /// Check if the bot is fully operational.
    pub async fn is_ready(&self) -> bool {
        self.accepting.load(Ordering::Relaxed)
            && self.store.last_persist_ok()
            && self.source.is_healthy().await
    }
}

/// Axum-based health check HTTP server.
pub struct HealthServer {
    /// Health state shared with all components.
    state: HealthState,
    /// Bind port (default 8080 from config).
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub const fn new(state: HealthState, port: u16) -> Self {
        Self { state, port }
    }

    /// Serve until the shutdown signal fires.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/metrics", get(Self::metrics))
            .with_state(self.state);

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 200 only while the source and persistence are healthy.
    async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
        if state.is_ready().await {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }

    async fn metrics(State(state): State<HealthState>) -> impl IntoResponse {
        state.metrics.render()
    }
}
