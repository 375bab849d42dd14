//! Configuration management with validation and defaults
//!
//! Centralized configuration for the round engine and API server.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the crash-game backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrashConfig {
    pub game: GameConfig,
    pub fairness: FairnessConfig,
    pub server: ServerConfig,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            fairness: FairnessConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Round timing and history settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Betting window length (milliseconds).
    pub betting_window_ms: u64,
    /// Multiplier recomputation interval during a running round (milliseconds).
    pub tick_interval_ms: u64,
    /// Cool-down after a crash before the next betting window (milliseconds).
    pub cooldown_ms: u64,
    /// Exponential growth base; multiplier = base ^ (elapsed_secs * 10).
    pub growth_base: f64,
    /// Maximum entries retained in the round history ring.
    pub history_cap: usize,
    /// Entries exposed in the "recent history" window sent to clients.
    pub recent_history: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            betting_window_ms: 7_000,
            tick_interval_ms: 100,
            cooldown_ms: 3_000,
            growth_base: 1.0024,
            history_cap: 20,
            recent_history: 7,
        }
    }
}

impl GameConfig {
    pub fn betting_window(&self) -> Duration {
        Duration::from_millis(self.betting_window_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Crash-point generation settings.
///
/// The secret key seeds the HMAC and must never be exposed to clients; it is
/// excluded from serialized output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FairnessConfig {
    #[serde(skip_serializing, default = "default_secret_key")]
    pub secret_key: String,
    /// Hard cap on the crash point.
    pub max_crash_point: f64,
}

fn default_secret_key() -> String {
    std::env::var("CRASHPOINT_SECRET").unwrap_or_else(|_| "crashpoint_dev_secret".to_string())
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            max_crash_point: 10_000.0,
        }
    }
}

/// HTTP/WebSocket server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

impl CrashConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path, e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.game.tick_interval_ms == 0 {
            return Err("game.tick_interval_ms must be greater than zero".to_string());
        }
        if self.game.growth_base <= 1.0 {
            return Err("game.growth_base must be greater than 1.0".to_string());
        }
        if self.game.history_cap == 0 {
            return Err("game.history_cap must be greater than zero".to_string());
        }
        if self.game.recent_history > self.game.history_cap {
            return Err("game.recent_history cannot exceed game.history_cap".to_string());
        }
        if self.fairness.secret_key.is_empty() {
            return Err("fairness.secret_key must not be empty".to_string());
        }
        if self.fairness.max_crash_point < 1.0 {
            return Err("fairness.max_crash_point must be at least 1.0".to_string());
        }
        if self.server.port == 0 {
            return Err("server.port must be non-zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CrashConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let mut config = CrashConfig::default();
        config.game.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_history_cap_rejected() {
        let mut config = CrashConfig::default();
        config.game.history_cap = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recent_window_bounded_by_cap() {
        let mut config = CrashConfig::default();
        config.game.recent_history = config.game.history_cap + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_key_not_serialized() {
        let config = CrashConfig::default();
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains(&config.fairness.secret_key));
    }
}
