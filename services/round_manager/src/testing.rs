//! Test doubles for the round manager collaborators

use crate::adapters::{MemoryAdvisoryLock, MemoryStateStore};
use crate::clock::ManualClock;
use crate::error::{Result, RoundError};
use crate::traits::{Collaborators, EntryPoolReader, EntryPoolValidator, LedgerClient};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use types::{EligibilityRow, Round, RoundNumber, TxReference, U256};

/// A snapshot call received by [`MockLedger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub round: RoundNumber,
    pub item_ids: Vec<U256>,
    pub owners: Vec<String>,
}

#[derive(Debug, Default)]
struct LedgerState {
    current: RoundNumber,
    rounds: BTreeMap<RoundNumber, Round>,
    submissions: Vec<RecordedSubmission>,
    creations: Vec<(u64, u64)>,
    draw_requests: usize,
    failing_submissions: usize,
    fail_reads: bool,
    hide_created_number: bool,
    round_pointer_frozen: bool,
    create_delay: Option<Duration>,
    submit_delay: Option<Duration>,
}

/// In-memory ledger recording every write
#[derive(Debug, Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a round and make it current
    pub fn set_round(&self, round: Round) {
        let mut state = self.state.lock();
        state.current = state.current.max(round.number);
        state.rounds.insert(round.number, round);
    }

    /// Settle a round with the given winner
    pub fn complete_round(&self, number: RoundNumber, winner: Option<&str>) {
        let mut state = self.state.lock();
        if let Some(round) = state.rounds.get_mut(&number) {
            round.is_active = false;
            round.is_completed = true;
            round.winner = Round::normalize_winner(winner.map(str::to_string));
            round.winning_item_id = round.winner.as_ref().map(|_| U256::from(1u64));
        }
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.state.lock().submissions.clone()
    }

    pub fn creations(&self) -> Vec<(u64, u64)> {
        self.state.lock().creations.clone()
    }

    pub fn draw_requests(&self) -> usize {
        self.state.lock().draw_requests
    }

    /// Make the next `count` snapshot submissions fail
    pub fn fail_next_submissions(&self, count: usize) {
        self.state.lock().failing_submissions = count;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Report `None` from `create_round`, as a ledger without the creation event would
    pub fn hide_created_number(&self, hide: bool) {
        self.state.lock().hide_created_number = hide;
    }

    /// Accept `create_round` calls without opening a round, as a silently reverted call would
    pub fn set_round_pointer_frozen(&self, frozen: bool) {
        self.state.lock().round_pointer_frozen = frozen;
    }

    pub fn set_create_delay(&self, delay: Duration) {
        self.state.lock().create_delay = Some(delay);
    }

    pub fn set_submit_delay(&self, delay: Duration) {
        self.state.lock().submit_delay = Some(delay);
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn current_round_number(&self) -> Result<RoundNumber> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(RoundError::ledger("mock ledger unavailable"));
        }
        Ok(state.current)
    }

    async fn get_round(&self, number: RoundNumber) -> Result<Round> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(RoundError::ledger("mock ledger unavailable"));
        }
        state
            .rounds
            .get(&number)
            .cloned()
            .ok_or(RoundError::RoundNotFound { round: number })
    }

    async fn create_round(&self, start_time: u64, end_time: u64) -> Result<Option<RoundNumber>> {
        let delay = self.state.lock().create_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.creations.push((start_time, end_time));
        if state.round_pointer_frozen {
            return Ok(None);
        }

        let number = state.current + 1;
        state.current = number;
        state.rounds.insert(
            number,
            Round {
                number,
                start_time,
                end_time,
                is_active: true,
                is_completed: false,
                winner: None,
                winning_item_id: None,
            },
        );

        Ok((!state.hide_created_number).then_some(number))
    }

    async fn submit_snapshot(
        &self,
        round: RoundNumber,
        item_ids: Vec<U256>,
        owners: Vec<String>,
    ) -> Result<TxReference> {
        let delay = self.state.lock().submit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.failing_submissions > 0 {
            state.failing_submissions -= 1;
            return Err(RoundError::Submission {
                round,
                message: "mock submission rejected".to_string(),
            });
        }

        state.submissions.push(RecordedSubmission {
            round,
            item_ids,
            owners,
        });
        Ok(TxReference::new(format!(
            "0xmock{:04}",
            state.submissions.len()
        )))
    }

    async fn request_draw(&self) -> Result<()> {
        self.state.lock().draw_requests += 1;
        Ok(())
    }
}

/// Pool returning whatever rows were last set
#[derive(Debug, Default)]
pub struct StaticEntryPool {
    rows: Mutex<Vec<EligibilityRow>>,
    fail: AtomicBool,
    reads: AtomicUsize,
}

impl StaticEntryPool {
    pub fn set_rows(&self, rows: Vec<EligibilityRow>) {
        *self.rows.lock() = rows;
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntryPoolReader for StaticEntryPool {
    async fn get_all_entries(&self) -> Result<Vec<EligibilityRow>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RoundError::pool("mock pool unavailable"));
        }
        Ok(self.rows.lock().clone())
    }
}

/// Validator counting reconciliations, optionally failing them
#[derive(Debug, Default)]
pub struct MockValidator {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntryPoolValidator for MockValidator {
    async fn reconcile(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RoundError::pool("mock reconciliation failed"));
        }
        Ok(())
    }
}

/// Fully in-memory wiring with handles kept for assertions
pub struct TestHarness {
    pub ledger: Arc<MockLedger>,
    pub pool: Arc<StaticEntryPool>,
    pub validator: Arc<MockValidator>,
    pub store: Arc<MemoryStateStore>,
    pub lock: Arc<MemoryAdvisoryLock>,
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    pub fn new(now: u64) -> Self {
        Self {
            ledger: Arc::new(MockLedger::new()),
            pool: Arc::new(StaticEntryPool::default()),
            validator: Arc::new(MockValidator::new()),
            store: Arc::new(MemoryStateStore::new()),
            lock: Arc::new(MemoryAdvisoryLock::new()),
            clock: Arc::new(ManualClock::new(now)),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            ledger: self.ledger.clone(),
            pool: self.pool.clone(),
            validator: self.validator.clone(),
            store: self.store.clone(),
            lock: self.lock.clone(),
            clock: self.clock.clone(),
        }
    }
}

/// Active round `number` spanning `[start, end)`
pub fn active_round(number: RoundNumber, start: u64, end: u64) -> Round {
    Round {
        number,
        start_time: start,
        end_time: end,
        is_active: true,
        is_completed: false,
        winner: None,
        winning_item_id: None,
    }
}

/// Pool rows from `(wallet, item)` pairs
pub fn rows(pairs: &[(&str, &str)]) -> Vec<EligibilityRow> {
    pairs
        .iter()
        .map(|(wallet, item)| EligibilityRow::new(*wallet, *item))
        .collect()
}
