//! Orchestrator runtime configuration

use crate::error::RoundError;
use round_config::RoundManagerSettings;
use std::time::Duration;
use types::U256;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Cadence of the periodic tick
    pub tick_interval: Duration,

    /// Seconds before end at which the freeze window opens (FREEZE_SEC)
    pub freeze_window_secs: u64,

    /// Minimum seconds before end for a freeze to be attempted (SAFETY_SEC)
    pub safety_margin_secs: u64,

    /// Duration of rounds after the first
    pub round_duration_secs: u64,

    /// Duration of the very first round, if different
    pub first_round_duration_secs: Option<u64>,

    /// Backdating applied to a new round's start
    pub start_skew_secs: u64,

    /// Offset mapping pool item ids into the ledger identifier space
    pub item_id_offset: U256,

    /// Log minutes remaining while a round is active
    pub log_remaining_time: bool,

    /// Request a draw once an ended round has a snapshot on record
    pub request_draw_after_end: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            freeze_window_secs: 180,
            safety_margin_secs: 30,
            round_duration_secs: 7 * 24 * 60 * 60,
            first_round_duration_secs: None,
            start_skew_secs: 5,
            item_id_offset: U256::from(1_000_000u64),
            log_remaining_time: true,
            request_draw_after_end: false,
        }
    }
}

impl OrchestratorConfig {
    /// Duration for the next round depending on whether any round was created before
    pub fn duration_for(&self, is_first_round: bool) -> u64 {
        match (is_first_round, self.first_round_duration_secs) {
            (true, Some(first)) => first,
            _ => self.round_duration_secs,
        }
    }
}

impl TryFrom<&RoundManagerSettings> for OrchestratorConfig {
    type Error = RoundError;

    fn try_from(settings: &RoundManagerSettings) -> Result<Self, Self::Error> {
        let timing = &settings.timing;
        let item_id_offset = U256::from_dec_str(settings.ledger.item_id_offset.trim()).map_err(
            |e| RoundError::Configuration {
                message: format!(
                    "Invalid item id offset '{}': {:?}",
                    settings.ledger.item_id_offset, e
                ),
            },
        )?;

        Ok(Self {
            tick_interval: Duration::from_secs(timing.tick_interval_secs),
            freeze_window_secs: timing.freeze_window_secs,
            safety_margin_secs: timing.safety_margin_secs,
            round_duration_secs: timing.round_duration_secs,
            first_round_duration_secs: timing.first_round_duration_secs,
            start_skew_secs: timing.start_skew_secs,
            item_id_offset,
            log_remaining_time: timing.log_remaining_time,
            request_draw_after_end: settings.ledger.request_draw_after_end,
        })
    }
}
