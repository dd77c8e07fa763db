// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::handlers::{health_handler, info_handler};
use super::outputs::{fetch_output_handler, find_all_handler};
use super::process::{detect_handler, extract_text_handler, remove_background_handler};
use crate::config::NodeConfig;
use crate::dispatcher::Dispatcher;
use crate::storage::{spawn_retention_task, OutputResolver, RetentionSweeper, StagingArea};
use crate::vision::VisionServices;

/// Multipart framing on top of the file itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub staging: StagingArea,
    pub resolver: OutputResolver,
    pub config: Arc<NodeConfig>,
}

impl AppState {
    pub fn new(config: NodeConfig, services: Arc<VisionServices>) -> Self {
        Self {
            dispatcher: Dispatcher::from_config(services, &config),
            staging: StagingArea::new(&config.upload_dir, &config.allowed_extensions),
            resolver: OutputResolver::new(&config.output_dir),
            config: Arc::new(config),
        }
    }
}

/// Build the router with every route and layer
pub fn create_app(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(info_handler))
        .route("/health", get(health_handler))
        // Processing
        .route("/detect", post(detect_handler))
        .route("/remove-bg", post(remove_background_handler))
        .route("/extract-text", post(extract_text_handler))
        // Outputs
        .route("/find-all", post(find_all_handler))
        .route("/outputs/*path", get(fetch_output_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the node: directories, collaborators, retention and the HTTP server
pub async fn run_node(config: NodeConfig) -> Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("creating upload dir {:?}", config.upload_dir))?;
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("creating output dir {:?}", config.output_dir))?;

    let services = Arc::new(VisionServices::from_config(&config).await?);

    let retention = config.retention().map(|max_age| {
        spawn_retention_task(
            RetentionSweeper::new(&config.output_dir, max_age),
            config.sweep_interval(),
        )
    });

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen_addr))?;
    let app = create_app(AppState::new(config, services));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("🚀 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = retention {
        task.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
