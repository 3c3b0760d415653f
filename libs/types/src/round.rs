//! Round read model and transaction references

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential round number assigned by the ledger
pub type RoundNumber = u64;

/// Sentinel the ledger reports when no round was ever created
pub const NO_ROUND: RoundNumber = 0;

/// Zero address the ledger returns for "no winner yet"
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Ledger view of a single round
///
/// Timestamps are unix seconds. `winner` is `None` until the ledger settles the draw;
/// adapters map the zero address to `None` through [`Round::normalize_winner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: RoundNumber,
    pub start_time: u64,
    pub end_time: u64,
    pub is_active: bool,
    pub is_completed: bool,
    pub winner: Option<String>,
    pub winning_item_id: Option<U256>,
}

impl Round {
    /// Seconds left until `end_time`, zero once the round has ended
    pub fn seconds_remaining(&self, now: u64) -> u64 {
        self.end_time.saturating_sub(now)
    }

    /// Winner address, if the ledger has settled one
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Map empty or zero-address winners to `None`
    pub fn normalize_winner(raw: Option<String>) -> Option<String> {
        raw.filter(|w| {
            let w = w.trim();
            !w.is_empty() && !w.eq_ignore_ascii_case(ZERO_ADDRESS)
        })
    }
}

/// Reference to a confirmed ledger transaction (usually a 0x-prefixed hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxReference(String);

impl TxReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TxReference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}
