//! Wire protocol for the game WebSocket.
//!
//! Server → client events and client → server commands are tagged JSON
//! objects; the `type` field selects the variant. Decoding a command is
//! exhaustive: an unknown `type` or a missing field yields a structured
//! decode error instead of a partial read.

use crate::engine::bets::{AutoCashout, BetResult, CashoutOutcome, PlacedBet};
use crate::engine::state::{HistoryEntry, Phase};
use serde::{Deserialize, Serialize};

/// Events broadcast (or privately sent) to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum WsEvent {
    /// Private snapshot sent once on connect.
    #[serde(rename = "state")]
    State {
        phase: Phase,
        multiplier: f64,
        round_id: u64,
        history: Vec<HistoryEntry>,
        players_online: usize,
    },

    /// Betting window opened for a new round.
    #[serde(rename = "betting_start")]
    BettingStart { round_id: u64, duration_ms: u64 },

    /// Multiplier started growing; lists all bets placed during the window.
    #[serde(rename = "round_start")]
    RoundStart {
        round_id: u64,
        bets: Vec<PlacedBet>,
    },

    /// One multiplier update, with any auto-cashouts it triggered.
    #[serde(rename = "tick")]
    Tick {
        multiplier: f64,
        cashouts: Vec<AutoCashout>,
    },

    /// Round ended at the crash point.
    #[serde(rename = "crashed")]
    Crashed {
        multiplier: f64,
        round_id: u64,
        results: Vec<BetResult>,
        history: Vec<HistoryEntry>,
    },

    /// A participant's bet was accepted.
    #[serde(rename = "bet_placed")]
    BetPlaced {
        user_id: u64,
        username: String,
        amount: f64,
    },

    /// A participant cashed out explicitly.
    #[serde(rename = "cashout")]
    Cashout {
        user_id: u64,
        username: String,
        multiplier: f64,
        winnings: f64,
    },

    /// Private validation or decode error.
    #[serde(rename = "error")]
    Error { message: String },
}

impl WsEvent {
    pub fn cashout(outcome: CashoutOutcome) -> Self {
        WsEvent::Cashout {
            user_id: outcome.user_id,
            username: outcome.username,
            multiplier: outcome.multiplier,
            winnings: outcome.winnings,
        }
    }

    pub fn bet_placed(placed: PlacedBet) -> Self {
        WsEvent::BetPlaced {
            user_id: placed.user_id,
            username: placed.username,
            amount: placed.amount,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WsEvent::Error {
            message: message.into(),
        }
    }
}

/// Commands accepted from clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    PlaceBet {
        user_id: u64,
        amount: f64,
        #[serde(default)]
        auto_cashout: Option<f64>,
        #[serde(default)]
        username: Option<String>,
    },
    Cashout { user_id: u64 },
}
