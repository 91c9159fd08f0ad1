//! Fleetwatch - delivery tracking and discharge alerting for a truck fleet
//!
//! Resolves live vehicle positions against a geofence hierarchy, derives
//! delivery progress and waiting time, and classifies waits into alerts.
//!
//! Module structure:
//! - `domain/` - Core types (records, hierarchy levels, geometry, progress)
//! - `io/` - External interfaces (position/manifest feeds, files, egress)
//! - `services/` - Business logic (resolver, wait engine, alerts, engine)
//! - `infra/` - Infrastructure (config, stats)

use clap::Parser;
use fleetwatch::infra::Config;
use fleetwatch::io::{HttpManifestFeed, HttpPositionFeed};
use fleetwatch::services::{MemoryStore, TrackingEngine};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Fleetwatch - truck delivery tracking and discharge alerting
#[derive(Parser, Debug)]
#[command(name = "fleetwatch", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = env!("GIT_HASH"), "fleetwatch starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        positions_url = %config.positions_base_url(),
        manifests_url = %config.manifests_base_url(),
        geofences = %config.geofences_path(),
        cache_ttl_secs = %config.cache_ttl_secs(),
        cycle_interval_secs = %config.cycle_interval_secs(),
        "config_loaded"
    );

    let positions = Arc::new(HttpPositionFeed::new(
        config.positions_base_url(),
        config.positions_token(),
        config.positions_timeout_secs(),
    ));
    let manifests = Arc::new(HttpManifestFeed::new(
        config.manifests_base_url(),
        config.manifests_token(),
        config.manifests_timeout_secs(),
        config.terminal_statuses(),
    ));
    let store = Arc::new(MemoryStore::new());

    let interval_secs = config.cycle_interval_secs();
    let engine = Arc::new(TrackingEngine::new(config, positions, manifests, store));

    // Scheduled processing loop; trigger_cycle no-ops if a cycle is in flight
    let cycle_engine = engine.clone();
    let scheduler = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            cycle_engine.trigger_cycle().await;
        }
    });

    info!("engine_started");

    tokio::signal::ctrl_c().await.ok();
    info!("shutdown_signal_received");
    scheduler.abort();

    info!("fleetwatch shutdown complete");
    Ok(())
}
