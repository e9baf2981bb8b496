//! HTTP transport: one JSON-RPC message per `POST /mcp`, plus `GET /health`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::handlers::{self, health};
use crate::registry::ToolRegistry;

#[derive(Debug, Clone)]
pub struct AppState {
    registry: Arc<ToolRegistry>,
}

pub fn router(registry: Arc<ToolRegistry>) -> Router {
    Router::new()
        .route("/mcp", post(mcp))
        .route("/health", get(health::handle))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { registry })
}

/// Notifications get `202 Accepted` with no body; everything else is a
/// `200` carrying the JSON-RPC response, protocol errors included.
async fn mcp(State(state): State<AppState>, body: Bytes) -> Response {
    match handlers::handle_message(&body, Arc::clone(&state.registry)).await {
        Some(resp) => Json(resp).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Bind `0.0.0.0:{http_port}` and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, registry: Arc<ToolRegistry>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, tools = registry.list().len(), "listening");

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
