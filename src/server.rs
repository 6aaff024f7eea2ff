//! HTTP server exposing the rendered dashboard.
//!
//! This module provides an HTTP server that:
//! - Serves the last rendered payload via GET /api/dashboard and /api/overall
//! - Reports refresh statistics via GET /api/stats
//! - Optionally serves raw samples via GET /api/latest and /api/history, in
//!   the same shape [`crate::upstream::HttpUpstream`] consumes
//!
//! # Architecture
//!
//! ```text
//! Upstream ──→ RefreshOrchestrator ──→ RenderHandle ──→ GET /api/dashboard ──→ browser
//!                                                        (RenderView)
//! ```

use crate::core::{default_locations, Location};
use crate::refresh::{RenderView, SharedRefreshStats};
use crate::upstream::{HistoryResponse, LatestResponse, Upstream};
use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Shared server state
pub struct ServerState {
    /// Read side of the render slot
    view: RenderView,
    /// Refresh statistics
    stats: SharedRefreshStats,
    /// Sample source for the data API
    data_source: Option<Arc<dyn Upstream>>,
    /// Window used when /api/history has no `minutes` parameter
    default_history_minutes: u32,
    /// Order of samples in /api/latest
    locations: Vec<Location>,
}

impl ServerState {
    /// Create new server state
    pub fn new(view: RenderView, stats: SharedRefreshStats) -> Self {
        Self {
            view,
            stats,
            data_source: None,
            default_history_minutes: 60,
            locations: default_locations(),
        }
    }

    /// Emit /api/latest samples in this location order.
    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    /// Also serve raw samples from `source`.
    pub fn with_data_source(mut self, source: Arc<dyn Upstream>, history_minutes: u32) -> Self {
        self.data_source = Some(source);
        self.default_history_minutes = history_minutes;
        self
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Query parameters for GET /api/history
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub minutes: Option<u32>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_ready() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "No dashboard data rendered yet".to_string(),
            code: "NOT_READY".to_string(),
        }),
    )
}

fn upstream_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Data API upstream failure: {}", e);
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: format!("Failed to fetch data: {e}"),
            code: "UPSTREAM_ERROR".to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/dashboard
async fn dashboard(State(state): State<Arc<ServerState>>) -> Result<Response, ApiError> {
    let payload = state.view.current().ok_or_else(not_ready)?;
    Ok(Json(payload.as_ref()).into_response())
}

/// GET /api/overall
async fn overall(State(state): State<Arc<ServerState>>) -> Result<Response, ApiError> {
    let payload = state.view.current().ok_or_else(not_ready)?;
    Ok(Json(&payload.overall).into_response())
}

/// GET /api/stats
async fn stats(State(state): State<Arc<ServerState>>) -> Response {
    Json(state.stats.stats()).into_response()
}

/// GET /api/latest
async fn latest(State(state): State<Arc<ServerState>>) -> Result<Json<LatestResponse>, ApiError> {
    let source = state
        .data_source
        .as_ref()
        .ok_or_else(|| upstream_error("no data source attached"))?;

    let snapshot = source.fetch_latest_snapshot().await.map_err(upstream_error)?;
    Ok(Json(LatestResponse {
        locations: snapshot.into_ordered_samples(&state.locations),
    }))
}

/// GET /api/history
async fn history(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let source = state
        .data_source
        .as_ref()
        .ok_or_else(|| upstream_error("no data source attached"))?;

    let minutes = params.minutes.unwrap_or(state.default_history_minutes);
    let window = source
        .fetch_history_window(minutes)
        .await
        .map_err(upstream_error)?;
    Ok(Json(HistoryResponse {
        points: window.into_samples(),
    }))
}

/// Build the router for the given state.
pub fn router(state: ServerState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/dashboard", get(dashboard))
        .route("/api/overall", get(overall))
        .route("/api/stats", get(stats));

    if state.data_source.is_some() {
        router = router
            .route("/api/latest", get(latest))
            .route("/api/history", get(history));
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers(Any),
        )
        .with_state(Arc::new(state))
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    state: ServerState,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Dashboard server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
