//! Service defaults
//!
//! Default values used when a setting is absent from every configuration layer.

/// Round timing defaults (seconds)
pub mod timing {
    /// Orchestrator tick cadence
    pub const TICK_INTERVAL_SECS: u64 = 10;

    /// Length of the freeze window before a round's end
    pub const FREEZE_WINDOW_SECS: u64 = 180;

    /// Minimum time left before end for a freeze to still be attempted
    pub const SAFETY_MARGIN_SECS: u64 = 30;

    /// Duration of every round after the first (7 days)
    pub const ROUND_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

    /// Backdating applied to a new round's start time
    pub const START_SKEW_SECS: u64 = 5;
}

/// Ledger defaults
pub mod ledger {
    /// Offset that maps pool item ids into the ledger identifier space
    pub const ITEM_ID_OFFSET: &str = "1000000";

    /// Confirmations awaited for every state-changing transaction
    pub const CONFIRMATIONS: usize = 1;

    /// Per-request timeout for JSON-RPC calls
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Pool service defaults
pub mod pool {
    pub const BASE_URL: &str = "http://127.0.0.1:3000";

    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Local state defaults
pub mod state {
    pub const STATE_FILE: &str = "./data/round_state.json";

    pub const LOCK_DIR: &str = "/tmp/raffle/locks";
}

/// Environment variable prefix for overrides (`RAFFLE__TIMING__FREEZE_WINDOW_SECS=120`)
pub const ENV_PREFIX: &str = "RAFFLE";

/// Separator between nested keys in environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Default base configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/round_manager.toml";

/// Directory holding `<environment>.toml` override files
pub const ENVIRONMENTS_DIR: &str = "config/environments";
