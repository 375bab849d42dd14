//! Metrics collection and Prometheus text exposition.
//!
//! Lightweight atomic counters updated by the engine and the WebSocket
//! layer, exported at `GET /metrics` in Prometheus text format.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Atomic counter registry shared across the engine and the API.
pub struct MetricsRegistry {
    /// Completed rounds since process start.
    pub rounds_total: AtomicU64,
    /// Accepted bets since process start.
    pub bets_placed_total: AtomicU64,
    /// Resolved cashouts (explicit and auto).
    pub cashouts_total: AtomicU64,

    /// WebSocket metrics
    pub websocket_connections_active: AtomicU64,
    pub websocket_messages_sent: AtomicU64,
    pub websocket_messages_received: AtomicU64,

    /// REST metrics
    pub http_requests_total: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rounds_total: AtomicU64::new(0),
            bets_placed_total: AtomicU64::new(0),
            cashouts_total: AtomicU64::new(0),
            websocket_connections_active: AtomicU64::new(0),
            websocket_messages_sent: AtomicU64::new(0),
            websocket_messages_received: AtomicU64::new(0),
            http_requests_total: AtomicU64::new(0),
        })
    }

    /// Generate Prometheus metrics format.
    pub fn to_prometheus_format(&self) -> String {
        let mut output = String::new();

        let counters: [(&str, &str, &AtomicU64); 6] = [
            (
                "crashpoint_rounds_total",
                "Completed rounds since process start",
                &self.rounds_total,
            ),
            (
                "crashpoint_bets_placed_total",
                "Accepted bets since process start",
                &self.bets_placed_total,
            ),
            (
                "crashpoint_cashouts_total",
                "Resolved cashouts (explicit and auto)",
                &self.cashouts_total,
            ),
            (
                "crashpoint_websocket_messages_sent_total",
                "WebSocket messages sent to clients",
                &self.websocket_messages_sent,
            ),
            (
                "crashpoint_websocket_messages_received_total",
                "WebSocket messages received from clients",
                &self.websocket_messages_received,
            ),
            (
                "crashpoint_http_requests_total",
                "REST requests served",
                &self.http_requests_total,
            ),
        ];

        for (name, help, counter) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n\n",
                counter.load(Ordering::SeqCst)
            ));
        }

        output.push_str(&format!(
            "# HELP crashpoint_websocket_connections_active Currently connected clients\n\
             # TYPE crashpoint_websocket_connections_active gauge\n\
             crashpoint_websocket_connections_active {}\n",
            self.websocket_connections_active.load(Ordering::SeqCst)
        ));

        output
    }
}

/// Axum handler for the Prometheus metrics endpoint.
pub async fn metrics_handler(
    axum::extract::State(state): axum::extract::State<Arc<super::handlers::AppState>>,
) -> axum::response::Response<String> {
    let metrics = state.metrics.to_prometheus_format();

    axum::response::Response::builder()
        .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
        .body(metrics)
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prometheus_format_contains_all_series() {
        let metrics = MetricsRegistry::new();
        metrics.rounds_total.store(5, Ordering::SeqCst);
        metrics
            .websocket_connections_active
            .store(3, Ordering::SeqCst);

        let output = metrics.to_prometheus_format();
        assert!(output.contains("crashpoint_rounds_total 5"));
        assert!(output.contains("crashpoint_websocket_connections_active 3"));
        assert!(output.contains("# TYPE crashpoint_rounds_total counter"));
        assert!(output.contains("# TYPE crashpoint_websocket_connections_active gauge"));
    }
}
