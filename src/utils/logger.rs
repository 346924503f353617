//! Logging utilities
//!
//! Provides logging configuration and helpers.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Crates whose events are shown when no RUST_LOG filter is given
const LOG_TARGETS: &[&str] = &["apcaccess_proxy", "tower_http"];

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("Invalid log level: {other}")),
        }
    }
}

/// Build the filter for a level, or from RUST_LOG when no level is given
fn build_filter(level: Option<LogLevel>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(directives(level)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directives(LogLevel::Info))),
    }
}

fn directives(level: LogLevel) -> String {
    let level = level.to_tracing_level();
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the logger.
///
/// Lines carry timestamp, level, target and message.
pub fn init_logger(level: Option<LogLevel>) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" warning ".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("unknown".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_directives() {
        assert_eq!(
            directives(LogLevel::Debug),
            "apcaccess_proxy=DEBUG,tower_http=DEBUG"
        );
    }
}
