//! # Round Orchestrator
//!
//! Drives the round lifecycle from a fixed-interval tick. Each tick reads the
//! current round from the ledger, classifies it into a [`RoundPhase`] and performs
//! the single action that phase calls for:
//!
//! ```text
//! NoRound / PendingActivation / SafetyMargin → wait
//! ActiveEarly  → log minutes remaining (once per minute value)
//! FreezeWindow → freeze unless frozen:<round> is set
//! Ended        → recovery if no snapshot_tx:<round>, else optional draw request
//! Completed    → announce winner, reconcile pool, open next round if pool non-empty
//! ```
//!
//! Errors never escape a tick: they are logged, counted and the schedule continues.
//! Overlapping ticks are dropped by an in-memory guard.

use crate::clock::Clock;
use crate::config::OrchestratorConfig;
use crate::creation::RoundCreator;
use crate::error::Result;
use crate::freeze::{reconcile_pool, FreezeCoordinator, FreezeOutcome, ReconcileOutcome};
use crate::guard::BusyGuard;
use crate::markers::RoundMarkers;
use crate::metrics::{MetricsSnapshot, OrchestratorMetrics};
use crate::phase::{PhaseWindows, RoundPhase};
use crate::traits::{Collaborators, EntryPoolReader, EntryPoolValidator, LedgerClient};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use types::{Round, RoundNumber, NO_ROUND};

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was still running; nothing done
    AlreadyTicking,
    /// Tick completed for a round in this phase
    Observed(RoundPhase),
    /// Tick aborted early; retried on the next interval
    Failed(String),
}

struct Ticker {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

struct Inner {
    ledger: Arc<dyn LedgerClient>,
    pool: Arc<dyn EntryPoolReader>,
    validator: Arc<dyn EntryPoolValidator>,
    clock: Arc<dyn Clock>,
    markers: RoundMarkers,
    freeze: FreezeCoordinator,
    creator: RoundCreator,
    config: OrchestratorConfig,
    metrics: Arc<OrchestratorMetrics>,
    ticking: AtomicBool,
    last_logged_minutes: Mutex<Option<(RoundNumber, u64)>>,
    last_announced_winner: AtomicU64,
    recovered: Mutex<HashSet<RoundNumber>>,
}

pub struct RoundOrchestrator {
    inner: Arc<Inner>,
    ticker: Mutex<Option<Ticker>>,
}

impl RoundOrchestrator {
    pub fn new(collaborators: Collaborators, config: OrchestratorConfig) -> Self {
        let metrics = Arc::new(OrchestratorMetrics::new());
        let freeze = FreezeCoordinator::new(&collaborators, &config, metrics.clone());
        let creator = RoundCreator::new(&collaborators, &config, metrics.clone());

        Self {
            inner: Arc::new(Inner {
                ledger: collaborators.ledger,
                pool: collaborators.pool,
                validator: collaborators.validator,
                clock: collaborators.clock,
                markers: RoundMarkers::new(collaborators.store),
                freeze,
                creator,
                config,
                metrics,
                ticking: AtomicBool::new(false),
                last_logged_minutes: Mutex::new(None),
                last_announced_winner: AtomicU64::new(NO_ROUND),
                recovered: Mutex::new(HashSet::new()),
            }),
            ticker: Mutex::new(None),
        }
    }

    /// Spawn the periodic ticker on the current tokio runtime
    ///
    /// Calling `start` while already running logs and does nothing.
    pub fn start(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            info!("Round orchestrator already running");
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let inner = self.inner.clone();
        let period = inner.config.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        inner.tick().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("🛑 Round orchestrator ticker stopped");
        });

        *ticker = Some(Ticker { handle, shutdown });
        info!("🚀 Round orchestrator started (tick every {:?})", period);
    }

    /// Stop scheduling ticks; an in-flight tick runs to completion in the background
    pub fn stop(&self) {
        if let Some(ticker) = self.ticker.lock().take() {
            let _ = ticker.shutdown.send(true);
            info!("Round orchestrator stopping");
        }
    }

    /// Stop scheduling ticks and wait for an in-flight tick to finish
    pub async fn shutdown(&self) {
        let ticker = self.ticker.lock().take();
        if let Some(ticker) = ticker {
            let _ = ticker.shutdown.send(true);
            if let Err(e) = ticker.handle.await {
                warn!("⚠️ Ticker task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.lock().is_some()
    }

    /// Run one tick now
    pub async fn tick(&self) -> TickOutcome {
        self.inner.tick().await
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Creation entry point for collaborators that open the first round
    pub fn round_creator(&self) -> &RoundCreator {
        &self.inner.creator
    }
}

impl Drop for RoundOrchestrator {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.get_mut().take() {
            let _ = ticker.shutdown.send(true);
        }
    }
}

impl Inner {
    async fn tick(&self) -> TickOutcome {
        let _ticking = match BusyGuard::try_acquire(&self.ticking) {
            Some(guard) => guard,
            None => {
                debug!("Previous tick still running, skipping");
                self.metrics.increment_ticks_overlapped();
                return TickOutcome::AlreadyTicking;
            }
        };

        self.metrics.increment_ticks();
        match self.run_tick().await {
            Ok(phase) => TickOutcome::Observed(phase),
            Err(e) => {
                warn!("❌ Tick failed: {}", e);
                self.metrics.increment_tick_failures();
                TickOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run_tick(&self) -> Result<RoundPhase> {
        let current = self.ledger.current_round_number().await?;
        if current == NO_ROUND {
            debug!("No round on the ledger yet, waiting for one to be opened");
            return Ok(RoundPhase::NoRound);
        }

        let round = self.ledger.get_round(current).await?;
        let now = self.clock.now_secs();
        let phase = RoundPhase::classify(Some(&round), now, self.windows());
        debug!("Round {} phase: {}", round.number, phase);

        match phase {
            RoundPhase::NoRound => {}
            RoundPhase::PendingActivation => {
                debug!("Round {} not active yet", round.number);
            }
            RoundPhase::ActiveEarly => self.log_remaining(&round, now),
            RoundPhase::FreezeWindow => self.on_freeze_window(&round).await?,
            RoundPhase::SafetyMargin => {
                debug!(
                    "Round {} inside safety margin, {}s left",
                    round.number,
                    round.seconds_remaining(now)
                );
            }
            RoundPhase::Ended => self.on_ended(&round).await?,
            RoundPhase::Completed => self.on_completed(&round).await?,
        }

        Ok(phase)
    }

    fn windows(&self) -> PhaseWindows {
        PhaseWindows {
            freeze_window_secs: self.config.freeze_window_secs,
            safety_margin_secs: self.config.safety_margin_secs,
        }
    }

    fn log_remaining(&self, round: &Round, now: u64) {
        if !self.config.log_remaining_time {
            return;
        }

        let minutes = round.seconds_remaining(now) / 60;
        let mut last = self.last_logged_minutes.lock();
        if *last == Some((round.number, minutes)) {
            return;
        }
        *last = Some((round.number, minutes));
        info!("⏱️ Round {}: {} minutes remaining", round.number, minutes);
    }

    async fn on_freeze_window(&self, round: &Round) -> Result<()> {
        if self.markers.is_frozen(round.number).await? {
            debug!("Round {} already frozen", round.number);
            return Ok(());
        }
        self.freeze.perform_freeze(round).await?;
        Ok(())
    }

    async fn on_ended(&self, round: &Round) -> Result<()> {
        let number = round.number;

        if let Some(tx) = self.markers.snapshot_tx(number).await? {
            if self.config.request_draw_after_end && !self.markers.draw_requested(number).await? {
                self.ledger.request_draw().await?;
                self.markers.mark_draw_requested(number).await?;
                info!("✅ Draw requested for round {}", number);
            } else {
                debug!(
                    "Round {} ended with snapshot {}, awaiting settlement",
                    number, tx
                );
            }
            return Ok(());
        }

        if self.recovered.lock().contains(&number) {
            debug!("Recovery for round {} already completed", number);
            return Ok(());
        }

        match self.freeze.recover(round).await {
            Ok(FreezeOutcome::AlreadyInProgress) => Ok(()),
            Ok(outcome) => {
                info!("Recovery for round {} finished: {:?}", number, outcome);
                self.recovered.lock().insert(number);
                Ok(())
            }
            Err(e) => {
                error!(
                    "❌ Recovery for round {} failed, operator attention required: {}",
                    number, e
                );
                Err(e)
            }
        }
    }

    async fn on_completed(&self, round: &Round) -> Result<()> {
        match round.winner() {
            Some(winner) => {
                if self.last_announced_winner.swap(round.number, Ordering::SeqCst) != round.number {
                    let item = round
                        .winning_item_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    info!(
                        "🏆 Round {} winner: {} (item {})",
                        round.number, winner, item
                    );
                }
            }
            None => debug!("Round {} completed, winner not available yet", round.number),
        }

        if let ReconcileOutcome::Failed(reason) =
            reconcile_pool(self.validator.as_ref(), &self.metrics).await
        {
            debug!(
                "Deciding on round {} successor from unreconciled pool: {}",
                round.number, reason
            );
        }

        let rows = self.pool.get_all_entries().await?;
        if rows.is_empty() {
            debug!("Pool is empty, not opening a new round");
            return Ok(());
        }

        self.creator.create_round_if_needed().await?;
        Ok(())
    }
}
