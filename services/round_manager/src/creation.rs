//! Round creation under the cross-process advisory lock

use crate::clock::Clock;
use crate::config::OrchestratorConfig;
use crate::error::Result;
use crate::markers::RoundMarkers;
use crate::metrics::OrchestratorMetrics;
use crate::traits::{AdvisoryLock, Collaborators, LedgerClient};
use std::sync::Arc;
use tracing::{error, info, warn};
use types::{RoundNumber, NO_ROUND};

/// Name of the advisory lock serializing round creation
pub const ROUND_CREATION_LOCK: &str = "round-creation";

pub struct RoundCreator {
    ledger: Arc<dyn LedgerClient>,
    lock: Arc<dyn AdvisoryLock>,
    clock: Arc<dyn Clock>,
    markers: RoundMarkers,
    config: OrchestratorConfig,
    metrics: Arc<OrchestratorMetrics>,
}

impl RoundCreator {
    pub fn new(
        collaborators: &Collaborators,
        config: &OrchestratorConfig,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        Self {
            ledger: collaborators.ledger.clone(),
            lock: collaborators.lock.clone(),
            clock: collaborators.clock.clone(),
            markers: RoundMarkers::new(collaborators.store.clone()),
            config: config.clone(),
            metrics,
        }
    }

    /// Open the next round unless one is already open
    ///
    /// Returns `Ok(None)` when another process holds the creation lock or already
    /// opened a round. Safe to call from any process sharing the lock directory.
    pub async fn create_round_if_needed(&self) -> Result<Option<RoundNumber>> {
        let lease = match self.lock.try_acquire(ROUND_CREATION_LOCK).await? {
            Some(lease) => lease,
            None => {
                info!("🔒 Round creation lock held elsewhere, skipping");
                self.metrics.increment_lock_contentions();
                return Ok(None);
            }
        };

        // Re-read under the lock; another process may have opened a round already
        let current = self.ledger.current_round_number().await?;
        if current != NO_ROUND {
            let round = self.ledger.get_round(current).await?;
            if !round.is_completed {
                info!(
                    "Round {} already open, not creating another",
                    round.number
                );
                return Ok(None);
            }
        }

        let is_first = !self.markers.first_round_created().await?;
        let duration = self.config.duration_for(is_first);
        let start = self.clock.now_secs().saturating_sub(self.config.start_skew_secs);
        let end = start.saturating_add(duration);

        info!(
            "🚀 Creating {} round: start {}, end {} ({}s)",
            if is_first { "first" } else { "next" },
            start,
            end,
            duration
        );

        let created = match self.ledger.create_round(start, end).await? {
            Some(number) => number,
            None => {
                let number = self.ledger.current_round_number().await?;
                if number == current {
                    warn!(
                        "⚠️ Ledger did not report a new round after creation, round pointer still {}",
                        current
                    );
                    return Ok(None);
                }
                number
            }
        };

        self.metrics.increment_rounds_created();
        // The round exists on the ledger regardless of whether the marker sticks
        if let Err(e) = self.markers.mark_first_round_created().await {
            error!(
                "❌ Round {} created but first-round marker not recorded: {}",
                created, e
            );
        }
        lease.release();

        info!("✅ Round {} created", created);
        Ok(Some(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoundError;
    use crate::testing::{active_round, TestHarness};
    use crate::traits::StateStore;
    use std::time::Duration;

    const NOW: u64 = 1_700_000_000;

    /// Store that reads as empty and refuses every write
    struct ReadOnlyStore;

    #[async_trait::async_trait]
    impl StateStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(RoundError::state_store("read-only store"))
        }
    }

    fn creator(harness: &TestHarness, config: OrchestratorConfig) -> RoundCreator {
        RoundCreator::new(
            &harness.collaborators(),
            &config,
            Arc::new(OrchestratorMetrics::new()),
        )
    }

    #[tokio::test]
    async fn test_first_round_uses_first_duration() {
        let harness = TestHarness::new(NOW);
        let config = OrchestratorConfig {
            first_round_duration_secs: Some(3_600),
            ..OrchestratorConfig::default()
        };
        let creator = creator(&harness, config.clone());

        assert_eq!(creator.create_round_if_needed().await.unwrap(), Some(1));
        harness.ledger.complete_round(1, None);
        assert_eq!(creator.create_round_if_needed().await.unwrap(), Some(2));

        let creations = harness.ledger.creations();
        assert_eq!(creations[0], (NOW - 5, NOW - 5 + 3_600));
        assert_eq!(
            creations[1],
            (NOW - 5, NOW - 5 + config.round_duration_secs)
        );
    }

    #[tokio::test]
    async fn test_open_round_aborts_creation() {
        let harness = TestHarness::new(NOW);
        harness.ledger.set_round(active_round(4, NOW - 10, NOW + 100));
        let creator = creator(&harness, OrchestratorConfig::default());

        assert_eq!(creator.create_round_if_needed().await.unwrap(), None);
        assert!(harness.ledger.creations().is_empty());
        assert!(!harness.lock.is_held(ROUND_CREATION_LOCK));
    }

    #[tokio::test]
    async fn test_contended_lock_returns_none() {
        let harness = TestHarness::new(NOW);
        let metrics = Arc::new(OrchestratorMetrics::new());
        let creator = RoundCreator::new(
            &harness.collaborators(),
            &OrchestratorConfig::default(),
            metrics.clone(),
        );

        let _held = harness
            .lock
            .try_acquire(ROUND_CREATION_LOCK)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(creator.create_round_if_needed().await.unwrap(), None);
        assert!(harness.ledger.creations().is_empty());
        assert_eq!(metrics.snapshot().lock_contentions, 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_current_pointer() {
        let harness = TestHarness::new(NOW);
        harness.ledger.hide_created_number(true);
        let creator = creator(&harness, OrchestratorConfig::default());

        assert_eq!(creator.create_round_if_needed().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_unmoved_pointer_is_not_counted_as_created() {
        let harness = TestHarness::new(NOW);
        harness.ledger.set_round_pointer_frozen(true);
        let metrics = Arc::new(OrchestratorMetrics::new());
        let creator = RoundCreator::new(
            &harness.collaborators(),
            &OrchestratorConfig::default(),
            metrics.clone(),
        );

        assert_eq!(creator.create_round_if_needed().await.unwrap(), None);
        assert_eq!(harness.ledger.creations().len(), 1);
        assert_eq!(metrics.snapshot().rounds_created, 0);
        assert!(!harness.lock.is_held(ROUND_CREATION_LOCK));
    }

    #[tokio::test]
    async fn test_marker_failure_still_reports_created_round() {
        let harness = TestHarness::new(NOW);
        let metrics = Arc::new(OrchestratorMetrics::new());
        let collaborators = Collaborators {
            store: Arc::new(ReadOnlyStore),
            ..harness.collaborators()
        };
        let creator = RoundCreator::new(
            &collaborators,
            &OrchestratorConfig::default(),
            metrics.clone(),
        );

        assert_eq!(creator.create_round_if_needed().await.unwrap(), Some(1));
        assert_eq!(metrics.snapshot().rounds_created, 1);
        assert!(!harness.lock.is_held(ROUND_CREATION_LOCK));
    }

    #[tokio::test]
    async fn test_lock_released_after_ledger_error() {
        let harness = TestHarness::new(NOW);
        harness.ledger.set_fail_reads(true);
        let creator = creator(&harness, OrchestratorConfig::default());

        assert!(creator.create_round_if_needed().await.is_err());
        assert!(!harness.lock.is_held(ROUND_CREATION_LOCK));
    }

    #[tokio::test]
    async fn test_concurrent_creators_open_one_round() {
        let harness = TestHarness::new(NOW);
        harness.ledger.set_create_delay(Duration::from_millis(50));
        let first = creator(&harness, OrchestratorConfig::default());
        let second = creator(&harness, OrchestratorConfig::default());

        let (a, b) = tokio::join!(
            first.create_round_if_needed(),
            second.create_round_if_needed()
        );

        let created: Vec<_> = [a.unwrap(), b.unwrap()].into_iter().flatten().collect();
        assert_eq!(created, vec![1]);
        assert_eq!(harness.ledger.creations().len(), 1);
    }
}
