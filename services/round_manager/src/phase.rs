//! Round phase classification
//!
//! The orchestrator computes one [`RoundPhase`] per tick from the ledger's view and
//! dispatches on it; no other code compares round timestamps.
//!
//! ```text
//!  start                end-FREEZE          end-SAFETY      end
//!    |---- ActiveEarly ----|--- FreezeWindow ---|-- SafetyMargin --|---- Ended ---->
//! ```

use std::fmt;
use types::{Round, NO_ROUND};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    /// Ledger has never created a round
    NoRound,
    /// Round exists but the ledger has not activated it
    PendingActivation,
    /// Active, freeze window not yet open
    ActiveEarly,
    /// Active, snapshot must be frozen now
    FreezeWindow,
    /// Active, too close to end for a freeze to be attempted
    SafetyMargin,
    /// Active past its end, waiting for the draw
    Ended,
    /// Settled by the ledger
    Completed,
}

/// Window boundaries, in seconds before a round's end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseWindows {
    pub freeze_window_secs: u64,
    pub safety_margin_secs: u64,
}

impl RoundPhase {
    /// Classify `round` at time `now`; `None` or round number 0 means no round
    pub fn classify(round: Option<&Round>, now: u64, windows: PhaseWindows) -> Self {
        let round = match round {
            Some(round) if round.number != NO_ROUND => round,
            _ => return RoundPhase::NoRound,
        };

        if round.is_completed {
            return RoundPhase::Completed;
        }
        if !round.is_active {
            return RoundPhase::PendingActivation;
        }

        let end = round.end_time;
        let freeze_opens = end.saturating_sub(windows.freeze_window_secs);
        let freeze_closes = end.saturating_sub(windows.safety_margin_secs);

        if now >= end {
            RoundPhase::Ended
        } else if now >= freeze_closes {
            RoundPhase::SafetyMargin
        } else if now >= freeze_opens {
            RoundPhase::FreezeWindow
        } else {
            RoundPhase::ActiveEarly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::NoRound => "no_round",
            RoundPhase::PendingActivation => "pending_activation",
            RoundPhase::ActiveEarly => "active_early",
            RoundPhase::FreezeWindow => "freeze_window",
            RoundPhase::SafetyMargin => "safety_margin",
            RoundPhase::Ended => "ended",
            RoundPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
