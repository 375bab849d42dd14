//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::{handlers::*, monitoring::metrics_handler, websocket::websocket_handler};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Liveness probe (high priority)
        .route("/health", get(health_handler))
        // Read-only projections of the round state
        .route("/state", get(state_handler))
        .route("/history", get(history_handler))
        // WebSocket endpoint for the game protocol
        .route("/ws", get(websocket_handler))
        // Metrics endpoint for Prometheus
        .route("/metrics", get(metrics_handler))
        // Structured 404 for everything else
        .fallback(not_found_handler)
        // Attach shared state
        .with_state(state)
}
