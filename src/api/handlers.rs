//! Request Handlers
//!
//! Read-only REST handlers over the round engine's state.

use super::errors::ApiError;
use super::middleware::RequestId;
use super::models::*;
use super::monitoring::MetricsRegistry;
use crate::broadcast::Broadcaster;
use crate::engine::GameEngine;
use axum::{extract::State, http::Uri, Extension, Json};
use std::sync::{atomic::Ordering, Arc};

/// Shared application state
pub struct AppState {
    pub engine: Arc<GameEngine>,
    pub broadcaster: Arc<Broadcaster>,
    pub metrics: Arc<MetricsRegistry>,
}

/// Current round snapshot
/// GET /state
pub async fn state_handler(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    state.metrics.http_requests_total.fetch_add(1, Ordering::SeqCst);
    let snapshot = state.engine.snapshot().await;
    Json(StateResponse {
        phase: snapshot.phase,
        multiplier: snapshot.multiplier,
        round_id: snapshot.round_id,
        players_online: snapshot.players_online,
        history: snapshot.history,
    })
}

/// Full history ring, newest first
/// GET /history
pub async fn history_handler(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    state.metrics.http_requests_total.fetch_add(1, Ordering::SeqCst);
    Json(HistoryResponse {
        history: state.engine.full_history().await,
    })
}

/// Liveness probe - minimal response time
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    state.metrics.http_requests_total.fetch_add(1, Ordering::SeqCst);
    Json(HealthResponse {
        status: "ok".to_string(),
        round_id: state.engine.current_round_id().await,
    })
}

/// Structured 404 for unknown routes
pub async fn not_found_handler(Extension(request_id): Extension<RequestId>, uri: Uri) -> ApiError {
    ApiError::not_found(request_id.0, format!("No route for {}", uri))
}
