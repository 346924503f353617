//! apcaccess-proxy - HTTP gateway for UPS status
//!
//! Runs on a host with access to apcupsd's `apcaccess` utility and republishes
//! its output over HTTP, so that containerized or remote consumers can read
//! UPS status without direct access to the utility.
//!
//! ## Usage
//!
//! ```bash
//! # Serve on 0.0.0.0:8081
//! apcaccess-proxy
//!
//! # Bind to localhost on a custom port
//! apcaccess-proxy --host 127.0.0.1 --port 9000
//!
//! # Query the local daemon, or a remote NIS server
//! curl http://localhost:8081/apcaccess
//! curl "http://localhost:8081/apcaccess?host=10.0.0.5&port=3551"
//!
//! # Show effective configuration
//! apcaccess-proxy config show
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;

mod cli;
mod config;
mod query;
mod server;
mod utils;

use cli::{Args, ConfigAction, ServeArgs};
use config::{ConfigFile, EnvConfig, GatewayConfig};
use server::Server;
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    init_logger(log_level(&args, &env)?);

    match args.command {
        Some(cli::Command::Config(config_args)) => manage_config(config_args, &args.serve, &env),
        None => serve(&args.serve, &env).await,
    }
}

/// Explicit level from flags or environment; None defers to RUST_LOG
fn log_level(args: &Args, env: &EnvConfig) -> Result<Option<LogLevel>> {
    if let Some(level) = &args.log_level {
        return level
            .parse::<LogLevel>()
            .map(Some)
            .map_err(anyhow::Error::msg);
    }

    if args.verbose {
        return Ok(Some(LogLevel::Debug));
    }

    Ok(env.log_level.as_deref().and_then(|level| level.parse().ok()))
}

async fn serve(args: &ServeArgs, env: &EnvConfig) -> Result<()> {
    let config = GatewayConfig::resolve(args.config.as_deref(), env, args.overrides())
        .context("Failed to load configuration")?;

    let server = Server::new(&config).context("Invalid configuration")?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        shutdown.cancel();
    });

    server.run(cancel).await?;
    Ok(())
}

fn manage_config(args: cli::ConfigArgs, serve: &ServeArgs, env: &EnvConfig) -> Result<()> {
    match args.action {
        ConfigAction::Show { format, env: show_env } => {
            if show_env {
                env.print_summary();
            } else {
                let config =
                    GatewayConfig::resolve(serve.config.as_deref(), env, serve.overrides())?;
                let output = ConfigFile::new(config).render(format != "json")?;
                println!("{output}");
            }
        }

        ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::default().save(path)?;
            println!("✓ Configuration file created: {output}");
        }

        ConfigAction::Validate { file } => {
            let path = file
                .map(Into::into)
                .or_else(ConfigFile::find)
                .ok_or_else(|| anyhow::anyhow!("No configuration file found"))?;

            match ConfigFile::load(&path) {
                Ok(_) => println!("✓ Configuration file is valid: {}", path.display()),
                Err(e) => {
                    println!("✗ Configuration file is invalid: {}", path.display());
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        ConfigAction::Env => config::print_env_help(),
    }

    Ok(())
}
