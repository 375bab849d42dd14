//! Round state, bet ledger storage and round history.
//!
//! All of this lives behind one lock owned by the engine; nothing here is
//! shared directly.

use crate::fairness::round2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tokio::time::Instant;

/// Lifecycle phase of the single advancing round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Betting,
    Running,
    Crashed,
}

/// A participant's bet for the current round, keyed by user id in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub amount: f64,
    pub auto_cashout: Option<f64>,
    pub cashed_out: bool,
    pub cashout_at: Option<f64>,
    pub username: String,
}

/// Completed-round record kept in the bounded history ring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub round_id: u64,
    pub crash_point: f64,
    pub timestamp: i64,
}

/// The process-wide game state: one round, its ledger, and recent history.
#[derive(Debug)]
pub struct GameState {
    pub phase: Phase,
    pub round_id: u64,
    pub multiplier: f64,
    pub crash_point: f64,
    pub started_at: Option<Instant>,
    pub bets: HashMap<u64, Bet>,
    history: VecDeque<HistoryEntry>,
    history_cap: usize,
}

impl GameState {
    pub fn new(history_cap: usize) -> Self {
        Self {
            phase: Phase::Waiting,
            round_id: 0,
            multiplier: 1.0,
            crash_point: 1.0,
            started_at: None,
            bets: HashMap::new(),
            history: VecDeque::new(),
            history_cap,
        }
    }

    /// Enter the betting phase: bump the round id, clear the ledger and pin
    /// the crash point for the round.
    pub fn enter_betting(&mut self, crash_point: f64) {
        self.phase = Phase::Betting;
        self.round_id += 1;
        self.bets.clear();
        self.crash_point = crash_point;
    }

    /// Enter the running phase: reset the multiplier and start the clock.
    pub fn enter_running(&mut self, now: Instant) {
        self.phase = Phase::Running;
        self.multiplier = 1.0;
        self.started_at = Some(now);
    }

    /// Enter the crashed phase: pin the displayed multiplier to the crash
    /// point and record the round in history.
    pub fn enter_crashed(&mut self) {
        self.phase = Phase::Crashed;
        self.multiplier = self.crash_point;
        self.push_history(HistoryEntry {
            round_id: self.round_id,
            crash_point: self.crash_point,
            timestamp: chrono::Utc::now().timestamp(),
        });
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_front(entry);
        self.history.truncate(self.history_cap);
    }

    /// Newest-first history, at most `limit` entries.
    pub fn recent_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history.iter().take(limit).cloned().collect()
    }

    /// The full history ring, newest first.
    pub fn full_history(&self) -> Vec<HistoryEntry> {
        self.history.iter().cloned().collect()
    }
}

/// Displayed multiplier after `elapsed_secs` of a running round.
///
/// Exponential growth rounded to 2 decimal places; starts at 1.00 and is
/// non-decreasing in elapsed time for any base > 1.
pub fn multiplier_at(elapsed_secs: f64, growth_base: f64) -> f64 {
    round2(growth_base.powf(elapsed_secs * 10.0))
}
