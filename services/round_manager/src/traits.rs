//! Collaborator interfaces
//!
//! The orchestrator only talks to the outside world through these traits. Concrete
//! implementations live in [`crate::adapters`]; test doubles in [`crate::testing`].

use crate::clock::Clock;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use types::{EligibilityRow, Round, RoundNumber, TxReference, U256};

/// Durable key/value store for round markers
///
/// Must survive restarts and be strongly consistent per key. No multi-key
/// transactions are required.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Source of the current eligibility pool (rows in any order)
#[async_trait]
pub trait EntryPoolReader: Send + Sync {
    async fn get_all_entries(&self) -> Result<Vec<EligibilityRow>>;
}

/// Best-effort reconciliation of the pool against live ownership
#[async_trait]
pub trait EntryPoolValidator: Send + Sync {
    async fn reconcile(&self) -> Result<()>;
}

/// Ledger holding rounds, snapshots and draws
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current round pointer, [`types::NO_ROUND`] when none exists
    async fn current_round_number(&self) -> Result<RoundNumber>;

    async fn get_round(&self, number: RoundNumber) -> Result<Round>;

    /// Request a new round; returns its number when the ledger reports one
    async fn create_round(&self, start_time: u64, end_time: u64) -> Result<Option<RoundNumber>>;

    /// Submit a round's snapshot as parallel item/owner columns and await confirmation
    async fn submit_snapshot(
        &self,
        round: RoundNumber,
        item_ids: Vec<U256>,
        owners: Vec<String>,
    ) -> Result<TxReference>;

    async fn request_draw(&self) -> Result<()>;
}

/// Named mutual exclusion that outlives a single process's memory
#[async_trait]
pub trait AdvisoryLock: Send + Sync {
    /// Try to take the named lock without waiting
    ///
    /// `Ok(None)` means another holder has it.
    async fn try_acquire(&self, name: &str) -> Result<Option<LockLease>>;
}

/// Scoped ownership of an advisory lock, released when dropped
pub struct LockLease {
    name: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockLease {
    pub fn new(name: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name: name.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release now instead of at end of scope
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for LockLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockLease")
            .field("name", &self.name)
            .field("held", &self.release.is_some())
            .finish()
    }
}

/// Everything the orchestrator needs from the outside world
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn LedgerClient>,
    pub pool: Arc<dyn EntryPoolReader>,
    pub validator: Arc<dyn EntryPoolValidator>,
    pub store: Arc<dyn StateStore>,
    pub lock: Arc<dyn AdvisoryLock>,
    pub clock: Arc<dyn Clock>,
}
