//! Leviathan Auction Bot - Entry Point
//!
//! Initializes configuration, logging, the chain connection and the
//! Telegram channel, then runs the event dispatcher and the hourly
//! sweeper until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Connect chain RPC, build feed, name resolver, metadata client
//! 4. Create Telegram notifier (TELEGRAM_BOT_TOKEN) + retry wrapper
//! 5. Load watchlist (report corrupt state to the operator)
//! 6. Announce startup
//! 7. Spawn health server, auction feed, dispatcher, sweeper
//! 8. Wait for SIGINT → graceful shutdown (stop→drain→persist→announce)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use leviathan_auction_bot::adapters::api::MetadataApi;
use leviathan_auction_bot::adapters::chain::{AuctionHouseFeed, ChainProvider, FnsResolver};
use leviathan_auction_bot::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use leviathan_auction_bot::adapters::persistence::StateStore;
use leviathan_auction_bot::adapters::telegram::TelegramNotifier;
use leviathan_auction_bot::config;
use leviathan_auction_bot::domain::messages::AlertTemplates;
use leviathan_auction_bot::ports::event_source::AuctionEventSource;
use leviathan_auction_bot::ports::names::{NameResolver, RawAddresses};
use leviathan_auction_bot::usecases::{
    EventDispatcher, EventNormalizer, LoadOutcome, Notifier, RetryPolicy, SweepSchedule, Sweeper,
    WatchlistStore,
};

/// Upper bound on waiting for each long-running task after shutdown.
const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config =
        config::loader::load_config(&config_path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        chain_id = config.chain.chain_id,
        auction_house = %config.chain.auction_house,
        "Starting auction bot"
    );

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
    let templates = AlertTemplates::new(config.auction.token_symbol.clone());

    // ── 3. Chain access, names, metadata ────────────────────
    let provider = Arc::new(ChainProvider::connect(&config.chain).await?);
    let feed = Arc::new(AuctionHouseFeed::new(Arc::clone(&provider), &config.chain)?);

    let names: Arc<dyn NameResolver> = match &config.chain.fns_registry {
        Some(registry) => Arc::new(FnsResolver::new(Arc::clone(&provider), registry)?),
        None => {
            warn!("No name registry configured, showing raw addresses");
            Arc::new(RawAddresses)
        }
    };
    let metadata = Arc::new(MetadataApi::new(
        &config.api,
        config.chain.chain_id,
        &config.chain.auction_house,
    )?);

    // ── 4. Telegram delivery ────────────────────────────────
    let chat = Arc::new(
        TelegramNotifier::from_env(&config.telegram)
            .context("Failed to create Telegram notifier")?,
    );
    let notifier = Arc::new(Notifier::new(
        chat,
        RetryPolicy::from_config(&config.telegram),
        Arc::clone(&metrics),
        templates.clone(),
        config.bot.name.clone(),
    ));

    // ── 5. Restore the watchlist ────────────────────────────
    let state = Arc::new(StateStore::new(&config.watchlist.data_dir).await?);
    info!(path = %state.path().display(), "Watchlist state file");
    let store = Arc::new(WatchlistStore::new(state));

    if let LoadOutcome::Corrupt { error } = store.load().await {
        notifier.report(&templates.state_file_corrupt(&error)).await;
    }
    metrics.set_watchlist_size(store.len().await);

    // ── 6. Announce startup ─────────────────────────────────
    notifier.announce_startup().await;

    // ── 7. Spawn long-running tasks ─────────────────────────
    let source: Arc<dyn AuctionEventSource> = feed.clone();
    let health = HealthState::new(Arc::clone(&source), Arc::clone(&store), Arc::clone(&metrics));

    let health_handle = if config.metrics.enabled {
        let server = HealthServer::new(health.clone(), config.metrics.health_port);
        let health_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(health_shutdown).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    // Subscribe before the feed starts so no early event is missed
    let events_rx = source.subscribe();

    let feed_shutdown = shutdown_tx.subscribe();
    let feed_ref = Arc::clone(&feed);
    let feed_handle = tokio::spawn(async move {
        if let Err(e) = feed_ref.run(feed_shutdown).await {
            error!(error = %format!("{e:#}"), "Auction feed failed");
        }
    });

    let dispatcher = EventDispatcher::new(
        Arc::clone(&store),
        Arc::new(EventNormalizer::new(metadata, names, templates.clone())),
        Arc::clone(&notifier),
        Arc::clone(&metrics),
        templates.clone(),
    );
    let dispatcher_shutdown = shutdown_tx.subscribe();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(events_rx, dispatcher_shutdown).await;
    });

    let sweeper = Sweeper::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        Arc::clone(&metrics),
        templates,
        SweepSchedule {
            interval: config.sweeper.interval(),
            window_secs: config.sweeper.closing_window_secs,
            align: config.sweeper.align_to_interval,
        },
    );
    let sweeper_shutdown = shutdown_tx.subscribe();
    let sweeper_handle = tokio::spawn(async move {
        sweeper.run(sweeper_shutdown).await;
    });

    info!("All tasks spawned, bot is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    // Graceful shutdown: stop intake, drain alerts, persist, announce
    let _ = shutdown_tx.send(());
    health.mark_draining();

    for (name, handle) in [
        ("feed", feed_handle),
        ("dispatcher", dispatcher_handle),
        ("sweeper", sweeper_handle),
    ] {
        if tokio::time::timeout(TASK_STOP_TIMEOUT, handle).await.is_err() {
            warn!(task = name, "Task did not stop in time");
        }
    }

    let abandoned = notifier.drain(config.bot.shutdown_grace()).await;
    if abandoned > 0 {
        warn!(abandoned, "Notifications abandoned at shutdown");
    }

    if let Err(e) = store.persist().await {
        error!(error = %format!("{e:#}"), "Final watchlist persist failed");
    }

    notifier.announce_shutdown().await;

    if let Some(handle) = health_handle {
        let _ = tokio::time::timeout(TASK_STOP_TIMEOUT, handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}
