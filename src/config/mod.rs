//! Configuration module
//!
//! Builds the immutable gateway configuration from defaults, an optional
//! config file, environment variables and command-line flags.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::query::{CommandSpec, DEFAULT_COMMAND, DEFAULT_TIMEOUT_SECS};

/// Default bind host (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_PORT: u16 = 8081;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("bind host must not be empty")]
    EmptyHost,

    #[error("bind port must be between 1 and 65535")]
    InvalidPort,

    #[error("timeout must be at least 1 second")]
    InvalidTimeout,

    #[error("status command must not be empty")]
    EmptyCommand,
}

/// Gateway configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind the HTTP listener to
    pub host: String,

    /// Port to bind the HTTP listener to
    pub port: u16,

    /// Status command line, without the trailing `status` argument
    pub command: String,

    /// Execution timeout for each status query in seconds
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            command: DEFAULT_COMMAND.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Optional values layered over a base configuration
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub command: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl From<&EnvConfig> for Overrides {
    fn from(env: &EnvConfig) -> Self {
        Self {
            host: env.host.clone(),
            port: env.port,
            command: env.command.clone(),
            timeout_secs: env.timeout,
        }
    }
}

impl GatewayConfig {
    /// Resolve the effective configuration.
    ///
    /// Precedence, highest first: `cli`, `env`, config file, defaults. The
    /// config file is `config_path`, else `env.config_file`, else the first
    /// existing standard location.
    pub fn resolve(config_path: Option<&Path>, env: &EnvConfig, cli: Overrides) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_ref().map(PathBuf::from))
            .or_else(ConfigFile::find);

        let mut config = match path {
            Some(path) => {
                let file = ConfigFile::load(&path)?;
                info!("Loaded configuration from {}", path.display());
                file.gateway
            }
            None => Self::default(),
        };

        config.apply(Overrides::from(env));
        config.apply(cli);
        config.validate()?;

        Ok(config)
    }

    /// Replace every field that has an override
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(command) = overrides.command {
            self.command = command;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        self.command_spec()?;
        Ok(())
    }

    /// Parsed status command
    pub fn command_spec(&self) -> Result<CommandSpec, ConfigError> {
        CommandSpec::parse(&self.command)
    }

    /// Listener address as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8081");
        assert_eq!(config.command, "apcaccess");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = GatewayConfig::default();
        config.apply(Overrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            ..Default::default()
        });

        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.command, "apcaccess");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_validate_config() {
        let config = GatewayConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort)));

        let config = GatewayConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));

        let config = GatewayConfig {
            command: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyCommand)));

        let config = GatewayConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyHost)));
    }

    #[test]
    fn test_resolve_precedence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apcaccess-proxy.yaml");
        std::fs::write(
            &path,
            "gateway:\n  host: 192.168.1.2\n  port: 9100\n  command: /sbin/apcaccess\n  timeout_secs: 5\n",
        )
        .unwrap();

        let env = EnvConfig {
            port: Some(9200),
            timeout: Some(7),
            ..Default::default()
        };
        let cli = Overrides {
            timeout_secs: Some(3),
            ..Default::default()
        };

        let config = GatewayConfig::resolve(Some(&path), &env, cli).unwrap();
        assert_eq!(config.host, "192.168.1.2");
        assert_eq!(config.port, 9200);
        assert_eq!(config.command, "/sbin/apcaccess");
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_resolve_uses_env_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"gateway": {"port": 9300}}"#).unwrap();

        let env = EnvConfig {
            config_file: Some(path.to_string_lossy().to_string()),
            ..Default::default()
        };

        let config = GatewayConfig::resolve(None, &env, Overrides::default()).unwrap();
        assert_eq!(config.port, 9300);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_resolve_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let cli = Overrides {
            command: Some(String::new()),
            ..Default::default()
        };
        assert!(GatewayConfig::resolve(Some(&path), &EnvConfig::default(), cli).is_err());
    }
}
