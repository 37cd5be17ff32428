//! Number Duel web server.
//!
//! This crate provides the production server implementation using:
//! - Axum for HTTP and WebSocket transport
//! - Tokio for async runtime
//! - System time and OS randomness
//!
//! ## Architecture
//!
//! ```text
//! numduel-server
//!   ├─ router             (GET /, GET /healthz, GET /ws)
//!   ├─ serve_connection   (per-socket read loop + writer task)
//!   ├─ AppState           (RoomRegistry + ConnectionRegistry under one lock)
//!   ├─ execute_actions    (routes RoomActions to outboxes)
//!   └─ SystemEnv          (production Environment impl)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod executor;
mod registry;
mod socket;
mod state;
mod system_env;

use std::net::SocketAddr;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::{Html, Response},
    routing::get,
};
use futures::StreamExt;
pub use error::ServerError;
pub use executor::{ExecutionSummary, execute_actions};
use numduel_core::RegistryConfig;
pub use registry::{ConnectionRegistry, Outbox};
pub use socket::serve_connection;
pub use state::AppState;
pub use system_env::SystemEnv;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Single-page browser client.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Interface to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// TCP port; 0 picks a free one
    pub port: u16,
    /// Room registry limits
    pub registry: RegistryConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8000, registry: RegistryConfig::default() }
    }
}

impl ServerRuntimeConfig {
    fn validate(&self) -> Result<(), ServerError> {
        if self.registry.max_rooms == 0 {
            return Err(ServerError::Config("max_rooms must be at least 1".to_string()));
        }
        if self.host.is_empty() {
            return Err(ServerError::Config("host must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(health))
        .route("/ws", get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| {
        let (sink, stream) = socket.split();
        serve_connection(state, stream, sink)
    })
}

/// Production Number Duel server.
pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    /// Create and bind a new server.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The configuration is invalid
    /// - Binding to the address fails
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        let state = AppState::new(config.registry);

        Ok(Self { listener, state })
    }

    /// Shared state, for inspection.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.local_addr()?);

        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
