//! Round Lifecycle End-to-End Tests
//!
//! Drives one orchestrator through freeze, settlement and the next round's creation
//! with in-memory collaborators and a manual clock.

use round_manager::testing::{active_round, rows, TestHarness};
use round_manager::{OrchestratorConfig, RoundOrchestrator, RoundPhase, StateStore, TickOutcome};
use types::U256;

const END: u64 = 1_700_000_000;
const WEEK: u64 = 7 * 24 * 60 * 60;
const WINNER: &str = "0x00000000000000000000000000000000000000aa";

#[tokio::test]
async fn test_full_round_lifecycle() {
    println!("🧪 Testing freeze → end → settlement → next round");

    let harness = TestHarness::new(END - 180);
    harness.ledger.set_round(active_round(1, END - WEEK, END));
    harness.pool.set_rows(rows(&[
        ("0x00000000000000000000000000000000000000bb", "2"),
        ("0x00000000000000000000000000000000000000aa", "1"),
        ("0x00000000000000000000000000000000000000aa", "1"),
    ]));

    let config = OrchestratorConfig::default();
    let orchestrator = RoundOrchestrator::new(harness.collaborators(), config.clone());

    // T-180: freeze window opens
    assert_eq!(
        orchestrator.tick().await,
        TickOutcome::Observed(RoundPhase::FreezeWindow)
    );
    let submissions = harness.ledger.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].round, 1);
    assert_eq!(
        submissions[0].owners,
        vec![
            "0x00000000000000000000000000000000000000aa",
            "0x00000000000000000000000000000000000000bb"
        ]
    );
    assert_eq!(
        submissions[0].item_ids,
        vec![U256::from(1_000_001u64), U256::from(1_000_002u64)]
    );
    assert!(harness.store.get("snapshot_tx:1").await.unwrap().is_some());
    println!("✅ Snapshot frozen with 2 entries");

    // Still inside the window: nothing more happens
    harness.clock.advance(60);
    orchestrator.tick().await;
    assert_eq!(harness.ledger.submissions().len(), 1);

    // T: round ended with a snapshot on record
    harness.clock.set(END);
    assert_eq!(
        orchestrator.tick().await,
        TickOutcome::Observed(RoundPhase::Ended)
    );
    assert_eq!(harness.ledger.submissions().len(), 1);
    assert_eq!(orchestrator.metrics().recoveries, 0);
    assert!(harness.ledger.creations().is_empty());

    // Settled: winner known, pool non-empty → next round
    harness.ledger.complete_round(1, Some(WINNER));
    harness.clock.set(END + 100);
    assert_eq!(
        orchestrator.tick().await,
        TickOutcome::Observed(RoundPhase::Completed)
    );

    let creations = harness.ledger.creations();
    assert_eq!(creations.len(), 1);
    let (start, end) = creations[0];
    assert_eq!(start, END + 100 - config.start_skew_secs);
    assert_eq!(end, start + config.round_duration_secs);
    println!("✅ Next round created");

    // The new round is picked up on the following tick
    assert_eq!(
        orchestrator.tick().await,
        TickOutcome::Observed(RoundPhase::ActiveEarly)
    );

    let metrics = orchestrator.metrics();
    assert_eq!(metrics.snapshots_submitted, 1);
    assert_eq!(metrics.rounds_created, 1);
    assert_eq!(metrics.tick_failures, 0);
}

#[tokio::test]
async fn test_missed_window_is_recovered_after_end() {
    let harness = TestHarness::new(END + 30);
    harness.ledger.set_round(active_round(1, END - WEEK, END));
    harness.pool.set_rows(rows(&[("0x00000000000000000000000000000000000000aa", "5")]));

    let orchestrator = RoundOrchestrator::new(harness.collaborators(), OrchestratorConfig::default());

    assert_eq!(
        orchestrator.tick().await,
        TickOutcome::Observed(RoundPhase::Ended)
    );
    assert_eq!(harness.ledger.submissions().len(), 1);
    assert_eq!(orchestrator.metrics().recoveries, 1);
}

#[tokio::test]
async fn test_safety_margin_tick_does_not_freeze() {
    let harness = TestHarness::new(END - 10);
    harness.ledger.set_round(active_round(1, END - WEEK, END));
    harness.pool.set_rows(rows(&[("0x00000000000000000000000000000000000000aa", "5")]));

    let orchestrator = RoundOrchestrator::new(harness.collaborators(), OrchestratorConfig::default());

    assert_eq!(
        orchestrator.tick().await,
        TickOutcome::Observed(RoundPhase::SafetyMargin)
    );
    assert!(harness.ledger.submissions().is_empty());
    assert_eq!(harness.store.get("frozen:1").await.unwrap(), None);
}
