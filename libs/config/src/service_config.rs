//! Service Configuration Module
//!
//! Loads the round manager settings from TOML files with environment-specific
//! overrides and `RAFFLE__`-prefixed environment variables.

use crate::service;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main round manager configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct RoundManagerSettings {
    /// Round timing policy
    pub timing: TimingSettings,

    /// Ledger connection and encoding
    pub ledger: LedgerSettings,

    /// Eligibility pool service
    pub pool: PoolSettings,

    /// Local durable state and locks
    pub state: StateSettings,

    /// Logging output
    pub logging: LoggingSettings,
}

/// Round timing policy (all values in seconds)
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TimingSettings {
    pub tick_interval_secs: u64,
    pub freeze_window_secs: u64,
    pub safety_margin_secs: u64,
    pub round_duration_secs: u64,
    /// Duration for the very first round; falls back to `round_duration_secs`
    pub first_round_duration_secs: Option<u64>,
    pub start_skew_secs: u64,
    /// Log minutes remaining while a round is active
    pub log_remaining_time: bool,
}

/// Ledger connection settings
#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LedgerSettings {
    pub rpc_url: String,
    pub contract_address: String,
    /// Signing key; normally supplied through `RAFFLE__LEDGER__PRIVATE_KEY`
    pub private_key: Option<String>,
    pub confirmations: usize,
    /// Per-request timeout for JSON-RPC calls (not the confirmation wait)
    pub request_timeout_secs: u64,
    /// Decimal offset added once to pool item ids before submission
    pub item_id_offset: String,
    /// Ask the ledger for a draw once a round has ended with a snapshot on record
    pub request_draw_after_end: bool,
}

/// Eligibility pool service settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PoolSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

/// Durable state settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StateSettings {
    pub state_file: PathBuf,
    pub lock_dir: PathBuf,
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: service::timing::TICK_INTERVAL_SECS,
            freeze_window_secs: service::timing::FREEZE_WINDOW_SECS,
            safety_margin_secs: service::timing::SAFETY_MARGIN_SECS,
            round_duration_secs: service::timing::ROUND_DURATION_SECS,
            first_round_duration_secs: None,
            start_skew_secs: service::timing::START_SKEW_SECS,
            log_remaining_time: true,
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            private_key: None,
            confirmations: service::ledger::CONFIRMATIONS,
            request_timeout_secs: service::ledger::REQUEST_TIMEOUT_SECS,
            item_id_offset: service::ledger::ITEM_ID_OFFSET.to_string(),
            request_draw_after_end: false,
        }
    }
}

impl fmt::Debug for LedgerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerSettings")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("confirmations", &self.confirmations)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("item_id_offset", &self.item_id_offset)
            .field("request_draw_after_end", &self.request_draw_after_end)
            .finish()
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            base_url: service::pool::BASE_URL.to_string(),
            request_timeout_secs: service::pool::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(service::state::STATE_FILE),
            lock_dir: PathBuf::from(service::state::LOCK_DIR),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl RoundManagerSettings {
    /// Load configuration from files with environment overrides
    ///
    /// An explicit `base_path` must exist; the default path is optional so that
    /// environment-only deployments work.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let (base, required) = match base_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(service::DEFAULT_CONFIG_PATH), false),
        };

        debug!("Loading base config {:?} (required: {})", base, required);
        let mut builder = Config::builder().add_source(File::from(base).required(required));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = PathBuf::from(service::ENVIRONMENTS_DIR).join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (RAFFLE__ prefix)
        builder = builder.add_source(
            Environment::with_prefix(service::ENV_PREFIX)
                .prefix_separator(service::ENV_SEPARATOR)
                .separator(service::ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Expand environment variables in paths and URLs
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let rpc = shellexpand::env(&self.ledger.rpc_url).context("Failed to expand RPC URL")?;
        self.ledger.rpc_url = rpc.to_string();

        let base = shellexpand::env(&self.pool.base_url).context("Failed to expand pool URL")?;
        self.pool.base_url = base.to_string();

        self.state.state_file = expand_path(&self.state.state_file)
            .context("Failed to expand state file path")?;
        self.state.lock_dir =
            expand_path(&self.state.lock_dir).context("Failed to expand lock directory")?;

        Ok(())
    }

    /// Reject timing combinations the orchestrator cannot honour
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;

        if t.tick_interval_secs == 0 {
            bail!("timing.tick_interval_secs must be greater than zero");
        }
        if t.safety_margin_secs >= t.freeze_window_secs {
            bail!(
                "timing.safety_margin_secs ({}) must be smaller than timing.freeze_window_secs ({})",
                t.safety_margin_secs,
                t.freeze_window_secs
            );
        }
        if t.freeze_window_secs >= t.round_duration_secs {
            bail!(
                "timing.freeze_window_secs ({}) must be smaller than timing.round_duration_secs ({})",
                t.freeze_window_secs,
                t.round_duration_secs
            );
        }
        if let Some(first) = t.first_round_duration_secs {
            if t.freeze_window_secs >= first {
                bail!(
                    "timing.freeze_window_secs ({}) must be smaller than timing.first_round_duration_secs ({})",
                    t.freeze_window_secs,
                    first
                );
            }
        }

        if self.ledger.request_timeout_secs == 0 {
            bail!("ledger.request_timeout_secs must be greater than zero");
        }
        if self.pool.request_timeout_secs == 0 {
            bail!("pool.request_timeout_secs must be greater than zero");
        }

        let offset = self.ledger.item_id_offset.trim();
        if offset.is_empty() || !offset.bytes().all(|b| b.is_ascii_digit()) {
            bail!(
                "ledger.item_id_offset must be a decimal integer, got '{}'",
                self.ledger.item_id_offset
            );
        }

        Ok(())
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Convenience function to load, expand and validate configuration
pub fn load_settings(
    base_path: Option<&Path>,
    environment: Option<&str>,
) -> Result<RoundManagerSettings> {
    let mut settings = RoundManagerSettings::load(base_path, environment)?;
    settings.expand_env_vars()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("round_manager.toml");

        let config_content = r#"
[timing]
tick_interval_secs = 5
freeze_window_secs = 120
safety_margin_secs = 20
round_duration_secs = 3600
first_round_duration_secs = 7200

[ledger]
rpc_url = "http://localhost:8545"
contract_address = "0x1111111111111111111111111111111111111111"
item_id_offset = "500"
request_timeout_secs = 15

[state]
state_file = "/tmp/test/state.json"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = RoundManagerSettings::load(Some(&config_path), None).unwrap();

        assert_eq!(config.timing.tick_interval_secs, 5);
        assert_eq!(config.timing.freeze_window_secs, 120);
        assert_eq!(config.timing.first_round_duration_secs, Some(7200));
        // Unset values keep their defaults
        assert_eq!(config.timing.start_skew_secs, service::timing::START_SKEW_SECS);
        assert_eq!(config.ledger.item_id_offset, "500");
        assert_eq!(config.ledger.request_timeout_secs, 15);
        assert_eq!(config.state.state_file, PathBuf::from("/tmp/test/state.json"));
        assert_eq!(config.state.lock_dir, PathBuf::from(service::state::LOCK_DIR));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(RoundManagerSettings::load(Some(&missing), None).is_err());
    }

    #[test]
    fn test_environment_variable_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("round_manager.toml");
        fs::write(&config_path, "[pool]\nrequest_timeout_secs = 10\n").unwrap();

        std::env::set_var("RAFFLE__POOL__REQUEST_TIMEOUT_SECS", "42");
        let config = RoundManagerSettings::load(Some(&config_path), None);
        std::env::remove_var("RAFFLE__POOL__REQUEST_TIMEOUT_SECS");

        assert_eq!(config.unwrap().pool.request_timeout_secs, 42);
    }

    #[test]
    fn test_validation_rejects_bad_timing() {
        let mut settings = RoundManagerSettings::default();
        assert!(settings.validate().is_ok());

        settings.timing.safety_margin_secs = settings.timing.freeze_window_secs;
        assert!(settings.validate().is_err());

        let mut settings = RoundManagerSettings::default();
        settings.timing.tick_interval_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = RoundManagerSettings::default();
        settings.timing.first_round_duration_secs = Some(60);
        assert!(settings.validate().is_err());

        let mut settings = RoundManagerSettings::default();
        settings.ledger.item_id_offset = "1e6".to_string();
        assert!(settings.validate().is_err());

        let mut settings = RoundManagerSettings::default();
        settings.ledger.request_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_private_key_is_redacted() {
        let mut settings = LedgerSettings::default();
        settings.private_key = Some("0xsecret".to_string());
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("0xsecret"));
        assert!(printed.contains("<redacted>"));
    }
}
