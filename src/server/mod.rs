//! HTTP listener for the status gateway
//!
//! ## Endpoints
//!
//! - `GET /apcaccess[?host=<host>[&port=<port>]]` - run apcaccess and return its output
//! - `GET /health` - health check
//!
//! Any other path responds with 404.

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

use crate::config::{ConfigError, GatewayConfig};
use crate::query::QueryRunner;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server failed unexpectedly: {0}")]
    Serve(#[source] std::io::Error),
}

/// State shared by all handlers
pub struct AppState {
    pub runner: QueryRunner,
}

/// Status gateway server
pub struct Server {
    bind_addr: String,
    state: Arc<AppState>,
}

impl Server {
    /// Create a server from a validated configuration
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let runner = QueryRunner::new(config.command_spec()?).timeout(config.timeout());

        Ok(Self {
            bind_addr: config.bind_addr(),
            state: Arc::new(AppState { runner }),
        })
    }

    /// Serve until `cancel` fires, then shut the listener down
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.bind_addr.clone(),
                source,
            })?;

        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind {
                addr: self.bind_addr.clone(),
                source,
            })?;
        self.log_banner(local_addr);

        let app = router(self.state);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                info!("Shutting down server...");
            })
            .await
            .map_err(ServerError::Serve)?;

        info!("Server shutdown complete");
        Ok(())
    }

    fn log_banner(&self, addr: SocketAddr) {
        info!("Starting apcaccess proxy server on {}", addr);
        info!("Command: {}", self.state.runner.command());
        info!("Endpoints:");
        info!(
            "  - http://{}/apcaccess - Execute apcaccess and return output",
            addr
        );
        info!("  - http://{}/health - Health check", addr);
    }
}

/// Build the router with all endpoints
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/apcaccess", get(handlers::apcaccess))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Resolve once Ctrl+C or SIGTERM is received
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
