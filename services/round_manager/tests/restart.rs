//! Restart Safety Tests
//!
//! Markers written to the file-backed store must stop a restarted orchestrator from
//! submitting a second snapshot for the same round.

use round_manager::adapters::FileStateStore;
use round_manager::testing::{active_round, rows, TestHarness};
use round_manager::{Collaborators, OrchestratorConfig, RoundOrchestrator, StateStore};
use std::sync::Arc;
use tempfile::TempDir;

const END: u64 = 1_700_000_000;

fn with_store(harness: &TestHarness, store: Arc<dyn StateStore>) -> Collaborators {
    Collaborators {
        store,
        ..harness.collaborators()
    }
}

#[tokio::test]
async fn test_snapshot_not_resubmitted_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let state_file = temp_dir.path().join("round_state.json");

    let harness = TestHarness::new(END - 120);
    harness.ledger.set_round(active_round(3, END - 3_600, END));
    harness.pool.set_rows(rows(&[("0x00000000000000000000000000000000000000aa", "1"), ("0x00000000000000000000000000000000000000bb", "2")]));

    // Phase 1: freeze and shut down
    {
        let store = Arc::new(FileStateStore::open(&state_file).await.unwrap());
        let orchestrator =
            RoundOrchestrator::new(with_store(&harness, store), OrchestratorConfig::default());
        orchestrator.tick().await;
        assert_eq!(harness.ledger.submissions().len(), 1);
    }

    // Phase 2: a fresh process inside the window and after the end
    {
        let store = Arc::new(FileStateStore::open(&state_file).await.unwrap());
        assert!(store.get("snapshot_tx:3").await.unwrap().is_some());

        let orchestrator =
            RoundOrchestrator::new(with_store(&harness, store), OrchestratorConfig::default());
        orchestrator.tick().await;

        harness.clock.set(END + 10);
        orchestrator.tick().await;

        assert_eq!(harness.ledger.submissions().len(), 1);
        assert_eq!(orchestrator.metrics().recoveries, 0);
    }
}

#[tokio::test]
async fn test_first_round_marker_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let state_file = temp_dir.path().join("round_state.json");
    let config = OrchestratorConfig {
        first_round_duration_secs: Some(600),
        ..OrchestratorConfig::default()
    };

    let harness = TestHarness::new(END);
    {
        let store = Arc::new(FileStateStore::open(&state_file).await.unwrap());
        let orchestrator = RoundOrchestrator::new(with_store(&harness, store), config.clone());
        assert_eq!(
            orchestrator.round_creator().create_round_if_needed().await.unwrap(),
            Some(1)
        );
    }

    harness.ledger.complete_round(1, None);
    {
        let store = Arc::new(FileStateStore::open(&state_file).await.unwrap());
        let orchestrator = RoundOrchestrator::new(with_store(&harness, store), config.clone());
        orchestrator.round_creator().create_round_if_needed().await.unwrap();
    }

    let creations = harness.ledger.creations();
    assert_eq!(creations[0].1 - creations[0].0, 600);
    assert_eq!(creations[1].1 - creations[1].0, config.round_duration_secs);
}
