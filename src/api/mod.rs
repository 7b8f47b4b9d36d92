use crate::engine::RuleProvider;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{error::TrySendError, Sender};
use tokio_util::sync::CancellationToken;

pub const PROVIDER_PATH: &str = "/clash/provider/gfwlist";

struct ApiState {
    provider: Arc<RuleProvider>,
    refresh_sender: Sender<()>,
}

pub fn router(provider: Arc<RuleProvider>, refresh_sender: Sender<()>) -> Router {
    let state = Arc::new(ApiState {
        provider,
        refresh_sender,
    });

    Router::new()
        .route(PROVIDER_PATH, get(get_rules))
        .route("/api/status", get(get_status))
        .route("/api/refresh", post(trigger_refresh))
        .with_state(state)
}

pub async fn start_api_server(
    provider: Arc<RuleProvider>,
    refresh_sender: Sender<()>,
    addr: SocketAddr,
    cancel: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server on {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    serve(listener, router(provider, refresh_sender), cancel).await
}

/// Serves `app` on an already bound listener until `cancel` fires.
pub async fn serve(listener: TcpListener, app: Router, cancel: CancellationToken) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("API server failed")
}

async fn get_rules(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/yaml"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        state.provider.serve(),
    )
}

async fn get_status(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let snapshot = state.provider.snapshot();
    Json(serde_json::json!({
        "rules": snapshot.counts,
        "built_at": snapshot.built_at,
        "interval_secs": state.provider.interval().as_secs(),
        "refresh": state.provider.stats().snapshot(),
    }))
}

async fn trigger_refresh(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.refresh_sender.try_send(()) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "refresh_triggered" })),
        ),
        // One request is already queued; it covers this one too.
        Err(TrySendError::Full(())) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "refresh_pending" })),
        ),
        Err(TrySendError::Closed(())) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "refresh_unavailable" })),
        ),
    }
}
