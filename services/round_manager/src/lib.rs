//! # Raffle Round Manager
//!
//! Keeps a recurring raffle moving on its ledger: watches the current round, freezes
//! the eligibility pool into an on-ledger snapshot shortly before the round ends,
//! recovers missed snapshots, and opens the next round once the previous one has
//! been settled.
//!
//! ## Architecture
//!
//! ```text
//!             ┌────────────── tick (every N s) ──────────────┐
//!             ▼                                              │
//!    [RoundOrchestrator] ── classify ──→ RoundPhase ── dispatch
//!        │          │                        │
//!        │          ▼                        ▼
//!        │  [FreezeCoordinator]         [RoundCreator]
//!        │   reconcile → read pool        advisory lock
//!        │   → Snapshot → submit          → re-check → create
//!        ▼          │                        │
//!   LedgerClient  EntryPoolReader/Validator  AdvisoryLock    StateStore (markers)
//! ```
//!
//! All collaborators are traits ([`traits`]); production implementations live in
//! [`adapters`], in-memory doubles in [`testing`].
//!
//! ## Guarantees
//!
//! - At most one snapshot submission per round, keyed by `snapshot_tx:<round>`
//! - Snapshots are ordered by (wallet, numeric item id) and deduplicated
//! - Round creation is serialized across processes by a named advisory lock
//! - A failing tick never stops the schedule

pub mod adapters;
pub mod clock;
pub mod config;
pub mod creation;
pub mod error;
pub mod freeze;
pub mod logging;
pub mod markers;
pub mod metrics;
pub mod orchestrator;
pub mod phase;
pub mod snapshot;
pub mod testing;
pub mod traits;

mod guard;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OrchestratorConfig;
pub use creation::{RoundCreator, ROUND_CREATION_LOCK};
pub use error::{Result, RoundError};
pub use freeze::{FreezeCoordinator, FreezeOutcome, ReconcileOutcome};
pub use metrics::{MetricsSnapshot, OrchestratorMetrics};
pub use orchestrator::{RoundOrchestrator, TickOutcome};
pub use phase::{PhaseWindows, RoundPhase};
pub use snapshot::Snapshot;
pub use traits::{
    AdvisoryLock, Collaborators, EntryPoolReader, EntryPoolValidator, LedgerClient, LockLease,
    StateStore,
};
