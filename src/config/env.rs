//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "APCACCESS_PROXY";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Bind host from APCACCESS_PROXY_HOST
    pub host: Option<String>,
    /// Bind port from APCACCESS_PROXY_PORT
    pub port: Option<u16>,
    /// Status command from APCACCESS_PROXY_COMMAND
    pub command: Option<String>,
    /// Query timeout from APCACCESS_PROXY_TIMEOUT
    pub timeout: Option<u64>,
    /// Config file from APCACCESS_PROXY_CONFIG
    pub config_file: Option<String>,
    /// Log level from APCACCESS_PROXY_LOG_LEVEL
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            host: get_env("HOST"),
            port: get_env_parse("PORT"),
            command: get_env("COMMAND"),
            timeout: get_env_parse("TIMEOUT"),
            config_file: get_env("CONFIG"),
            log_level: get_env("LOG_LEVEL"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.host.is_some()
            || self.port.is_some()
            || self.command.is_some()
            || self.timeout.is_some()
            || self.config_file.is_some()
            || self.log_level.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        if !self.has_any() {
            println!("  (no {ENV_PREFIX}_* variables set)");
            return;
        }
        println!("  {}_HOST:       {:?}", ENV_PREFIX, self.host);
        println!("  {}_PORT:       {:?}", ENV_PREFIX, self.port);
        println!("  {}_COMMAND:    {:?}", ENV_PREFIX, self.command);
        println!("  {}_TIMEOUT:    {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_CONFIG:     {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LOG_LEVEL:  {:?}", ENV_PREFIX, self.log_level);
    }
}

/// Get environment variable with prefix, ignoring empty values
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.trim().parse().ok())
}

/// Print all APCACCESS_PROXY environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_HOST        Bind address (default: 0.0.0.0)");
    println!("  {ENV_PREFIX}_PORT        Bind port (default: 8081)");
    println!("  {ENV_PREFIX}_COMMAND     Status command (default: apcaccess)");
    println!("  {ENV_PREFIX}_TIMEOUT     Query timeout in seconds (default: 10)");
    println!("  {ENV_PREFIX}_CONFIG      Path to configuration file");
    println!("  {ENV_PREFIX}_LOG_LEVEL   Log level (trace, debug, info, warn, error)");
    println!("  RUST_LOG                    Log filter directives (used when no level is set)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_HOST=127.0.0.1");
    println!("  export {ENV_PREFIX}_PORT=8081");
    println!("  apcaccess-proxy");
}


#[cfg(test)]
mod tests {
    use super::testing::EnvBuilder;
    use super::*;
    use std::sync::Mutex;

    // Tests below mutate the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.host.is_none());
        assert!(!config.has_any());
    }

    #[test]
    fn test_env_builder() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _guard = EnvBuilder::new()
            .var("HOST", "127.0.0.1")
            .var("PORT", "9090")
            .var("COMMAND", "/usr/sbin/apcaccess")
            .var("TIMEOUT", "15")
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.host, Some("127.0.0.1".to_string()));
        assert_eq!(config.port, Some(9090));
        assert_eq!(config.command, Some("/usr/sbin/apcaccess".to_string()));
        assert_eq!(config.timeout, Some(15));
        assert!(config.has_any());
    }

    #[test]
    fn test_env_invalid_numbers_ignored() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _guard = EnvBuilder::new()
            .var("PORT", "not-a-port")
            .var("TIMEOUT", "-1")
            .var("LOG_LEVEL", "")
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.port, None);
        assert_eq!(config.timeout, None);
        assert_eq!(config.log_level, None);
    }
}
