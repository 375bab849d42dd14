//! API Server
//!
//! HTTP/WebSocket server setup: middleware stack, route wiring and graceful
//! shutdown around the shared game state.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    monitoring::MetricsRegistry,
    routes::create_router,
};
use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::engine::GameEngine;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// HTTP/WebSocket server for the crash game.
pub struct ApiServer {
    config: ServerConfig,
    engine: Arc<GameEngine>,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<MetricsRegistry>,
}

impl ApiServer {
    pub fn new(
        config: ServerConfig,
        engine: Arc<GameEngine>,
        broadcaster: Arc<Broadcaster>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            config,
            engine,
            broadcaster,
            metrics,
        }
    }

    /// Start the API server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.get_socket_addr()?;
        let app = self.create_app();

        info!("🌐 Starting Crashpoint API server");
        info!("   Listen: http://{}", addr);
        self.log_server_info();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("✅ API server running");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("🛑 API server stopped gracefully");
        Ok(())
    }

    /// Create the application with the middleware stack
    fn create_app(&self) -> axum::Router {
        let state = Arc::new(AppState {
            engine: self.engine.clone(),
            broadcaster: self.broadcaster.clone(),
            metrics: self.metrics.clone(),
        });

        create_router(state)
            // Request ID middleware (first for tracing)
            .layer(axum::middleware::from_fn(request_id_middleware))
            // CORS layer (before timeout to handle preflight)
            .layer(create_cors_layer(self.config.allowed_origins.clone()))
            // Timeout layer; does not apply to established WebSocket streams
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.request_timeout_secs,
            )))
            // Tracing layer (last for complete request tracing)
            .layer(TraceLayer::new_for_http())
    }

    /// Get socket address from config
    fn get_socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.host.parse::<std::net::IpAddr>()?,
            self.config.port,
        )))
    }

    /// Log server information
    fn log_server_info(&self) {
        info!("📋 Server configuration:");
        info!("   CORS: {:?}", self.config.allowed_origins);
        info!("   Request timeout: {}s", self.config.request_timeout_secs);

        info!("📊 Available endpoints:");
        info!("   GET  /health   - Liveness probe");
        info!("   GET  /state    - Current round snapshot");
        info!("   GET  /history  - Recent round history");
        info!("   GET  /ws       - Game WebSocket");
        info!("   GET  /metrics  - Prometheus metrics");
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
