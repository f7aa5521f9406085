//! Tracing subscriber setup for processes embedding Shipyard.
//!
//! Controllers call [`init_tracing_from_env`] once at startup. The global
//! subscriber can only be installed once per process; later calls are
//! no-ops.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable selecting the log format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "SHIPYARD_LOG_FORMAT";
/// Environment variable holding the default level when `RUST_LOG` is unset.
pub const LOG_LEVEL_ENV: &str = "SHIPYARD_LOG_LEVEL";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    /// Newline-delimited JSON, one object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is not set.
    pub level: Level,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            format: std::env::var(LOG_FORMAT_ENV)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            level: std::env::var(LOG_LEVEL_ENV)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(Level::INFO),
        }
    }
}

impl TelemetryConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

/// Install the global subscriber described by `config`.
pub fn init_with(config: &TelemetryConfig) {
    let registry = tracing_subscriber::registry().with(config.filter());
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().with_target(false).json().flatten_event(true))
            .try_init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(false)).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Install the global subscriber from `SHIPYARD_LOG_FORMAT` / `SHIPYARD_LOG_LEVEL`.
pub fn init_tracing_from_env() {
    init_with(&TelemetryConfig::from_env());
}

/// Install the global subscriber with an explicit format and default level.
pub fn init_tracing(json: bool, level: Level) {
    let format = if json { LogFormat::Json } else { LogFormat::Text };
    init_with(&TelemetryConfig { format, level });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" text ".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn init_tracing_twice_is_harmless() {
        init_tracing(false, Level::DEBUG);
        init_with(&TelemetryConfig {
            format: LogFormat::Json,
            level: Level::INFO,
        });
    }
}
