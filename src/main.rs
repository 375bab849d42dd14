//! Crashpoint Server Binary
//!
//! Boots the round engine and the HTTP/WebSocket API around one shared game
//! state.

use clap::Parser;
use crashpoint::api::monitoring::MetricsRegistry;
use crashpoint::api::server::ApiServer;
use crashpoint::{Broadcaster, CrashConfig, GameEngine};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crashpoint")]
#[command(about = "Crashpoint real-time crash game server", long_about = None)]
struct Args {
    /// Server host
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long, default_value = "*")]
    cors_origins: String,

    /// Optional TOML configuration file (CLI flags override it)
    #[arg(long)]
    config: Option<String>,

    /// Betting window length in milliseconds
    #[arg(long)]
    betting_window_ms: Option<u64>,

    /// Multiplier tick interval in milliseconds
    #[arg(long)]
    tick_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crashpoint=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CrashConfig::load_from_file(path)?,
        None => CrashConfig::default(),
    };
    config.server.host = args.host;
    config.server.port = args.port;
    config.server.allowed_origins = args
        .cors_origins
        .split(',')
        .map(|s| s.trim().to_string())
        .collect();
    if let Some(window) = args.betting_window_ms {
        config.game.betting_window_ms = window;
    }
    if let Some(tick) = args.tick_interval_ms {
        config.game.tick_interval_ms = tick;
    }
    config.validate()?;

    info!("🔱 Starting Crashpoint backend");

    let broadcaster = Broadcaster::new();
    let metrics = MetricsRegistry::new();
    let engine = GameEngine::new(&config, broadcaster.clone(), metrics.clone());

    // The round loop runs for the life of the process; it has no exit path.
    tokio::spawn(engine.clone().run());

    let server = ApiServer::new(config.server.clone(), engine, broadcaster, metrics);
    server.run().await
}
