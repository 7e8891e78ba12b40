//! Relay HTTP server
//!
//! Two POST routes share one forwarding path, parameterized by [`Mode`]:
//!
//! - `POST /api/chat/stream` -- plain chat
//! - `POST /api/chat/generate` -- tool-augmented generation
//!
//! plus `GET /health` for liveness checks.

pub mod forwarder;
pub mod relay;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::config::Config;
use crate::error::{Result, RelayError};
use crate::mode::Mode;
use crate::upstream::UpstreamClient;

/// Shared state handed to every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    upstream: Arc<UpstreamClient>,
}

impl AppState {
    /// Wrap an upstream client for sharing across handlers
    pub fn new(upstream: UpstreamClient) -> Self {
        Self {
            upstream: Arc::new(upstream),
        }
    }
}

/// Build the relay router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(Mode::Chat.route(), post(chat_stream))
        .route(Mode::Tools.route(), post(chat_generate))
        .route("/health", get(health))
        .with_state(state)
}

async fn chat_stream(State(state): State<AppState>, body: Bytes) -> Response {
    forwarder::forward(&state.upstream, Mode::Chat, body).await
}

async fn chat_generate(State(state): State<AppState>, body: Bytes) -> Response {
    forwarder::forward(&state.upstream, Mode::Tools, body).await
}

async fn health() -> &'static str {
    "ok"
}

/// Bind the configured address and serve until the process is stopped
///
/// # Errors
///
/// Returns error if the upstream client cannot be built, the address is
/// invalid, or the listener fails
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.bind_address()?;
    let upstream = UpstreamClient::new(&config.upstream)?;
    let app = router(AppState::new(upstream));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RelayError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(
        "Relay listening on {} (upstream {})",
        addr,
        config.upstream.base_url
    );

    axum::serve(listener, app).await?;
    Ok(())
}
