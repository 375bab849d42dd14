//! API Response Models
//!
//! Response types for the read-only REST endpoints. All of these are
//! projections of the round engine's state and carry no side effects.

use crate::engine::state::{HistoryEntry, Phase};
use serde::{Deserialize, Serialize};

/// Current round snapshot
/// GET /state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    pub phase: Phase,
    pub multiplier: f64,
    pub round_id: u64,
    pub players_online: usize,
    pub history: Vec<HistoryEntry>,
}

/// Full history ring
/// GET /history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

/// Liveness probe
/// GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub round_id: u64,
}
