//! Logging setup

use anyhow::{anyhow, Result};
use round_config::LoggingSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&settings.level)))
        .map_err(|e| anyhow!("Invalid log level '{}': {}", settings.level, e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };

    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

fn default_directives(level: &str) -> String {
    format!("round_manager={level},round_config={level},warn", level = level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_crates() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("round_manager=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
