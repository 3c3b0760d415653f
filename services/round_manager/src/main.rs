//! Round Manager Service Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use round_config::{load_settings, RoundManagerSettings};
use round_manager::adapters::{
    EthersLedgerClient, FileAdvisoryLock, FileStateStore, HttpEntryPool, MemoryAdvisoryLock,
    MemoryStateStore,
};
use round_manager::logging::init_logging;
use round_manager::{
    AdvisoryLock, Collaborators, OrchestratorConfig, RoundOrchestrator, StateStore, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "round_manager")]
#[command(about = "Raffle round lifecycle orchestrator")]
struct Args {
    /// Base configuration file (defaults to config/round_manager.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay loaded from config/environments/<name>.toml
    #[arg(short, long)]
    environment: Option<String>,

    /// Keep markers and locks in memory instead of on disk
    #[arg(long)]
    memory_state: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref(), args.environment.as_deref())
        .context("Failed to load round manager configuration")?;
    init_logging(&settings.logging)?;

    info!("🚀 Starting Raffle Round Manager");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Freeze window {}s, safety margin {}s, tick {}s",
        settings.timing.freeze_window_secs,
        settings.timing.safety_margin_secs,
        settings.timing.tick_interval_secs
    );

    let config = OrchestratorConfig::try_from(&settings)?;
    let collaborators = build_collaborators(&settings, args.memory_state).await?;
    let orchestrator = RoundOrchestrator::new(collaborators, config);

    orchestrator.start();
    info!("Round manager running. Press Ctrl+C to stop.");

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("🛑 Shutting down round manager");
    orchestrator.shutdown().await;

    let metrics = orchestrator.metrics();
    info!(
        "📊 Final metrics: {} ticks, {} snapshots, {} rounds created, {} failures",
        metrics.ticks, metrics.snapshots_submitted, metrics.rounds_created, metrics.tick_failures
    );

    Ok(())
}

async fn build_collaborators(
    settings: &RoundManagerSettings,
    memory_state: bool,
) -> Result<Collaborators> {
    let ledger = EthersLedgerClient::connect(&settings.ledger)
        .await
        .context("Failed to connect to ledger")?;
    let pool = Arc::new(HttpEntryPool::new(&settings.pool)?);

    let (store, lock): (Arc<dyn StateStore>, Arc<dyn AdvisoryLock>) = if memory_state {
        info!("Using in-memory state; markers will not survive a restart");
        (
            Arc::new(MemoryStateStore::new()),
            Arc::new(MemoryAdvisoryLock::new()),
        )
    } else {
        (
            Arc::new(
                FileStateStore::open(&settings.state.state_file)
                    .await
                    .context("Failed to open state store")?,
            ),
            Arc::new(FileAdvisoryLock::new(&settings.state.lock_dir)?),
        )
    };

    Ok(Collaborators {
        ledger: Arc::new(ledger),
        pool: pool.clone(),
        validator: pool,
        store,
        lock,
        clock: Arc::new(SystemClock),
    })
}
