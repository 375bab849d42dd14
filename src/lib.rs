//! Crashpoint - Real-Time Provably-Fair Crash Game Backend
//!
//! A perpetual round loop grows a payout multiplier from 1.0 until a
//! precomputed crash point; connected players bet during a betting window and
//! cash out before the crash. Crash points come from a keyed HMAC over a
//! per-round seed, so every outcome is deterministic and verifiable
//! server-side. State deltas fan out to all live WebSocket connections.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fairness;

pub use broadcast::Broadcaster;
pub use config::CrashConfig;
pub use engine::{GameEngine, StateSnapshot};
pub use errors::{GameError, GameResult};
pub use fairness::FairnessEngine;
