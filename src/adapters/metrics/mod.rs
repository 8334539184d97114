//! Metrics and Monitoring Adapters
//!
//! Prometheus counters for events, alerts and persistence, served
//! together with the /live and /ready probes by a single axum 0.7 server.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use prometheus::MetricsRegistry;
