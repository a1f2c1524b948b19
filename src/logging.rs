//! Logging
//!
//! Optional `tracing` subscriber initialization for binaries and tests
//! embedding the editor. The library itself only emits events; installing a
//! subscriber is the caller's choice.

use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter: trace, debug, info, warn, error, off. Overridden
    /// by `STAGEFS_LOG` when set.
    pub level: String,
    /// Output format: "text" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Install a global subscriber. Returns an error string when one is already
/// installed or the filter does not parse.
pub fn init(config: &LoggingConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_env("STAGEFS_LOG")
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| format!("invalid log filter {:?}: {}", config.level, e))?;

    let builder = fmt().with_env_filter(filter);
    let result = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| format!("failed to install tracing subscriber: {}", e))
}
