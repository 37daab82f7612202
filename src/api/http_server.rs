// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::caption::caption_handler;
use crate::config::{ErrorMode, ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::vision::{CaptionModel, CaptionModelManager};

/// Shared state handed to every request
pub struct AppState {
    pub caption_model_manager: Arc<CaptionModelManager>,
    pub error_mode: ErrorMode,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(caption_model_manager: Arc<CaptionModelManager>, config: &ServerConfig) -> Self {
        Self {
            caption_model_manager,
            error_mode: config.error_mode,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// No model loaded, legacy error mode
    pub fn new_for_test() -> Self {
        Self {
            caption_model_manager: Arc::new(CaptionModelManager::empty()),
            error_mode: ErrorMode::Legacy,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn CaptionModel>) -> Self {
        self.caption_model_manager = Arc::new(CaptionModelManager::from_model(model, "test"));
        self
    }

    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build the router: `POST /caption` and nothing else
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/caption", post(caption_handler))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}

/// Bind the configured address and serve until Ctrl+C
pub async fn start_server(config: &ServerConfig, manager: Arc<CaptionModelManager>) -> Result<()> {
    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(manager, config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        "Caption server listening on {} (error mode: {}, upload limit: {} bytes)",
        listener.local_addr()?,
        config.error_mode,
        config.max_upload_bytes
    );

    serve(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server");
}
