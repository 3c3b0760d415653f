//! # Raffle Round Configuration
//!
//! Centralized configuration loading and defaults for the round services.
//!
//! ## Layers (lowest to highest precedence)
//!
//! 1. Built-in defaults ([`service`])
//! 2. Base TOML file (`config/round_manager.toml` unless a path is given)
//! 3. `config/environments/<env>.toml`
//! 4. `RAFFLE__`-prefixed environment variables, e.g. `RAFFLE__LEDGER__PRIVATE_KEY`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use round_config::load_settings;
//!
//! let settings = load_settings(None, Some("staging"))?;
//! println!("freeze window: {}s", settings.timing.freeze_window_secs);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod service;
pub mod service_config;

// Re-export commonly used types
pub use service_config::{
    load_settings, LedgerSettings, LoggingSettings, PoolSettings, RoundManagerSettings,
    StateSettings, TimingSettings,
};
