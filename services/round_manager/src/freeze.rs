//! Freeze coordination
//!
//! A freeze turns the eligibility pool into the round's snapshot on the ledger:
//!
//! ```text
//! [safety check] → reconcile → read pool → build snapshot → submit → persist markers
//! ```
//!
//! `snapshot_tx:<round>` is the idempotency key; once it is present nothing is ever
//! submitted again for that round. The in-memory `pushing` flag keeps two callers in
//! one process from submitting concurrently.

use crate::clock::Clock;
use crate::config::OrchestratorConfig;
use crate::error::{Result, RoundError};
use crate::guard::BusyGuard;
use crate::markers::RoundMarkers;
use crate::metrics::OrchestratorMetrics;
use crate::snapshot::Snapshot;
use crate::traits::{Collaborators, EntryPoolReader, EntryPoolValidator, LedgerClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use types::{Round, TxReference, U256};

/// Result of a freeze or recovery attempt that did not error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeOutcome {
    /// Snapshot confirmed on the ledger and recorded
    Submitted { tx: TxReference, entries: usize },
    /// Nothing eligible; round marked frozen without a submission
    EmptyPool,
    /// Round was already frozen
    AlreadyFrozen,
    /// A snapshot is already on record for the round
    AlreadySubmitted,
    /// Too close to the round's end; marked frozen without a submission
    AbortedUnsafe,
    /// Another push is running in this process
    AlreadyInProgress,
}

/// Result of a best-effort pool reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Reconciled,
    Failed(String),
}

impl ReconcileOutcome {
    pub fn is_reconciled(&self) -> bool {
        matches!(self, ReconcileOutcome::Reconciled)
    }
}

/// Run reconciliation, logging and counting failures instead of propagating them
pub async fn reconcile_pool(
    validator: &dyn EntryPoolValidator,
    metrics: &OrchestratorMetrics,
) -> ReconcileOutcome {
    match validator.reconcile().await {
        Ok(()) => {
            debug!("Pool reconciled");
            ReconcileOutcome::Reconciled
        }
        Err(e) => {
            warn!("⚠️ Pool reconciliation failed, continuing with last known pool: {}", e);
            metrics.increment_reconcile_failures();
            ReconcileOutcome::Failed(e.to_string())
        }
    }
}

pub struct FreezeCoordinator {
    ledger: Arc<dyn LedgerClient>,
    pool: Arc<dyn EntryPoolReader>,
    validator: Arc<dyn EntryPoolValidator>,
    clock: Arc<dyn Clock>,
    markers: RoundMarkers,
    safety_margin_secs: u64,
    item_id_offset: U256,
    metrics: Arc<OrchestratorMetrics>,
    pushing: AtomicBool,
}

impl FreezeCoordinator {
    pub fn new(
        collaborators: &Collaborators,
        config: &OrchestratorConfig,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        Self {
            ledger: collaborators.ledger.clone(),
            pool: collaborators.pool.clone(),
            validator: collaborators.validator.clone(),
            clock: collaborators.clock.clone(),
            markers: RoundMarkers::new(collaborators.store.clone()),
            safety_margin_secs: config.safety_margin_secs,
            item_id_offset: config.item_id_offset,
            metrics,
            pushing: AtomicBool::new(false),
        }
    }

    /// Freeze `round` during its freeze window
    ///
    /// Re-checks the remaining time first: inside the safety margin the round is
    /// marked frozen without submitting. A submission failure is returned as an
    /// error and leaves the round unfrozen for the next tick.
    pub async fn perform_freeze(&self, round: &Round) -> Result<FreezeOutcome> {
        let number = round.number;

        if self.markers.snapshot_tx(number).await?.is_some() {
            return Ok(FreezeOutcome::AlreadySubmitted);
        }
        if self.markers.is_frozen(number).await? {
            return Ok(FreezeOutcome::AlreadyFrozen);
        }

        let now = self.clock.now_secs();
        if now.saturating_add(self.safety_margin_secs) >= round.end_time {
            warn!(
                "⚠️ Round {} ends in {}s, inside the {}s safety margin; freezing without snapshot",
                number,
                round.seconds_remaining(now),
                self.safety_margin_secs
            );
            self.markers.mark_frozen(number).await?;
            self.metrics.increment_safety_aborts();
            return Ok(FreezeOutcome::AbortedUnsafe);
        }

        info!(
            "🧊 Freezing round {} ({}s before end)",
            number,
            round.seconds_remaining(now)
        );
        self.metrics.increment_freezes();
        self.push_snapshot(round).await
    }

    /// Submit the snapshot of an ended round that has none on record
    ///
    /// Skips the safety check and ignores `frozen:<round>`; only the snapshot
    /// record prevents a second submission.
    pub async fn recover(&self, round: &Round) -> Result<FreezeOutcome> {
        if self.markers.snapshot_tx(round.number).await?.is_some() {
            return Ok(FreezeOutcome::AlreadySubmitted);
        }

        warn!(
            "⚠️ Round {} ended without a snapshot on record, running recovery",
            round.number
        );
        self.metrics.increment_recoveries();
        self.push_snapshot(round).await
    }

    /// True while a push is running in this process
    pub fn is_pushing(&self) -> bool {
        self.pushing.load(Ordering::Acquire)
    }

    async fn push_snapshot(&self, round: &Round) -> Result<FreezeOutcome> {
        let number = round.number;

        let _pushing = match BusyGuard::try_acquire(&self.pushing) {
            Some(guard) => guard,
            None => {
                info!("Snapshot push already in progress, skipping round {}", number);
                return Ok(FreezeOutcome::AlreadyInProgress);
            }
        };

        // A push that finished while we waited for the guard may have recorded it
        if self.markers.snapshot_tx(number).await?.is_some() {
            return Ok(FreezeOutcome::AlreadySubmitted);
        }

        let reconciled = reconcile_pool(self.validator.as_ref(), &self.metrics)
            .await
            .is_reconciled();

        let rows = self.pool.get_all_entries().await?;
        if rows.is_empty() {
            info!("Pool is empty, round {} frozen without snapshot", number);
            self.markers.mark_frozen(number).await?;
            self.metrics.increment_empty_freezes();
            return Ok(FreezeOutcome::EmptyPool);
        }

        let row_count = rows.len();
        let snapshot = Snapshot::build(rows, self.item_id_offset);
        for (row, reason) in snapshot.rejected() {
            warn!(
                "⚠️ Skipping pool row ({}, {}): {}",
                row.wallet_address, row.item_id, reason
            );
        }

        if snapshot.is_empty() {
            error!(
                "❌ All {} pool rows for round {} were rejected; frozen without snapshot",
                row_count, number
            );
            self.markers.mark_frozen(number).await?;
            self.metrics.increment_empty_freezes();
            return Ok(FreezeOutcome::EmptyPool);
        }

        let entries = snapshot.len();
        debug!(
            "Snapshot for round {}: {} entries from {} rows ({} duplicates removed, reconciled: {})",
            number,
            entries,
            row_count,
            snapshot.duplicates_removed(),
            reconciled
        );

        let (item_ids, owners) = snapshot.into_columns();
        let tx = match self.ledger.submit_snapshot(number, item_ids, owners).await {
            Ok(tx) => tx,
            Err(e) => {
                self.metrics.increment_submission_failures();
                error!("❌ Snapshot submission for round {} failed: {}", number, e);
                return Err(match e {
                    RoundError::Submission { .. } => e,
                    other => RoundError::Submission {
                        round: number,
                        message: other.to_string(),
                    },
                });
            }
        };

        self.markers.record_snapshot(number, &tx).await?;
        self.metrics.increment_snapshots_submitted();
        info!(
            "✅ Snapshot for round {} submitted: {} entries, tx {}",
            number, entries, tx
        );

        Ok(FreezeOutcome::Submitted { tx, entries })
    }
}
