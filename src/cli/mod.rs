//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

/// HTTP gateway for apcaccess UPS status
#[derive(Parser, Debug)]
#[command(name = "apcaccess-proxy")]
#[command(version)]
#[command(about = "Expose apcaccess UPS status over HTTP")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage configuration
    Config(ConfigArgs),
}

/// Listener and query settings; these override file and environment values
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Status command line (e.g. "/sbin/apcaccess")
    #[arg(long = "status-command", global = true)]
    pub status_command: Option<String>,

    /// Query timeout in seconds
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl ServeArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            command: self.status_command.clone(),
            timeout_secs: self.timeout,
        }
    }
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Show environment variables instead
        #[arg(short, long)]
        env: bool,
    },

    /// Write a configuration file with default settings
    Init {
        /// Output path
        #[arg(short, long, default_value = "./apcaccess-proxy.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (default: first file found in standard locations)
        file: Option<String>,
    },

    /// List supported environment variables
    Env,
}
