//! Round engine: the perpetual state machine driving the game.
//!
//! One engine instance owns the game state and advances it through
//! Betting → Running → Crashed on fixed timers, broadcasting deltas to every
//! live connection. Connection handlers call into [`GameEngine::place_bet`]
//! and [`GameEngine::request_cashout`]; each of those takes the state write
//! lock, so every ledger mutation is a single atomic step relative to the
//! loop's own transitions. The loop has no exit path: a round's failures are
//! logged and the next round starts regardless.

pub mod bets;
pub mod state;

use crate::api::events::WsEvent;
use crate::api::monitoring::MetricsRegistry;
use crate::broadcast::Broadcaster;
use crate::config::{CrashConfig, FairnessConfig, GameConfig};
use crate::errors::GameResult;
use crate::fairness::FairnessEngine;
use serde::Serialize;
use state::{multiplier_at, GameState, HistoryEntry, Phase};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Read-only projection of the current round, served on connect and at
/// `GET /state`.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub phase: Phase,
    pub multiplier: f64,
    pub round_id: u64,
    pub players_online: usize,
    pub history: Vec<HistoryEntry>,
}

/// What a single running-phase tick produced.
enum TickOutcome {
    Tick {
        multiplier: f64,
        cashouts: Vec<bets::AutoCashout>,
    },
    Crashed {
        crash_point: f64,
        results: Vec<bets::BetResult>,
        history: Vec<HistoryEntry>,
    },
}

/// The state machine and broadcast driver for the single advancing round.
pub struct GameEngine {
    state: RwLock<GameState>,
    fairness: FairnessEngine,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<MetricsRegistry>,
    config: GameConfig,
}

impl GameEngine {
    pub fn new(
        config: &CrashConfig,
        broadcaster: Arc<Broadcaster>,
        metrics: Arc<MetricsRegistry>,
    ) -> Arc<Self> {
        let FairnessConfig {
            secret_key,
            max_crash_point,
        } = &config.fairness;

        Arc::new(Self {
            state: RwLock::new(GameState::new(config.game.history_cap)),
            fairness: FairnessEngine::new(secret_key, *max_crash_point),
            broadcaster,
            metrics,
            config: config.game.clone(),
        })
    }

    /// Drive rounds forever. Spawned once at process start.
    pub async fn run(self: Arc<Self>) {
        info!(
            "🎲 Round engine started (betting {}ms, tick {}ms, cooldown {}ms)",
            self.config.betting_window_ms, self.config.tick_interval_ms, self.config.cooldown_ms
        );
        loop {
            self.run_round().await;
        }
    }

    async fn run_round(&self) {
        // ── Betting window ──
        let round_id = {
            let mut state = self.state.write().await;
            let seed = self.fairness.compose_seed(state.round_id + 1);
            let crash_point = self.fairness.generate_crash_point(&seed);
            state.enter_betting(crash_point);
            state.round_id
        };
        // The crash point is already fixed here but stays server-side until
        // the crashed broadcast.
        debug!("Round {} betting open", round_id);
        self.broadcaster.broadcast(&WsEvent::BettingStart {
            round_id,
            duration_ms: self.config.betting_window_ms,
        });
        sleep(self.config.betting_window()).await;

        // ── Running ──
        let bets = {
            let mut state = self.state.write().await;
            state.enter_running(Instant::now());
            state.bet_summaries()
        };
        debug!("Round {} running with {} bets", round_id, bets.len());
        self.broadcaster.broadcast(&WsEvent::RoundStart { round_id, bets });

        let (crash_point, bet_count) = loop {
            sleep(self.config.tick_interval()).await;
            match self.advance_tick().await {
                TickOutcome::Tick {
                    multiplier,
                    cashouts,
                } => {
                    self.metrics
                        .cashouts_total
                        .fetch_add(cashouts.len() as u64, Ordering::SeqCst);
                    self.broadcaster
                        .broadcast(&WsEvent::Tick { multiplier, cashouts });
                }
                TickOutcome::Crashed {
                    crash_point,
                    results,
                    history,
                } => {
                    let bet_count = results.len();
                    self.broadcaster.broadcast(&WsEvent::Crashed {
                        multiplier: crash_point,
                        round_id,
                        results,
                        history,
                    });
                    break (crash_point, bet_count);
                }
            }
        };

        // ── Crashed cool-down ──
        info!(
            "💥 Round {} crashed at {:.2}x ({} bets)",
            round_id, crash_point, bet_count
        );
        self.metrics.rounds_total.fetch_add(1, Ordering::SeqCst);
        sleep(self.config.cooldown()).await;
    }

    /// Recompute the multiplier from elapsed time and either resolve
    /// auto-cashouts or, if the crash point has been reached, perform the
    /// crash transition in the same critical section.
    ///
    /// The tick that reaches the crash point is never broadcast; clients jump
    /// from the last sub-crash tick straight to the exact crash point.
    async fn advance_tick(&self) -> TickOutcome {
        let mut state = self.state.write().await;
        let elapsed = state
            .started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let next = multiplier_at(elapsed, self.config.growth_base);

        if next >= state.crash_point {
            state.enter_crashed();
            return TickOutcome::Crashed {
                crash_point: state.crash_point,
                results: state.round_results(),
                history: state.recent_history(self.config.recent_history),
            };
        }

        state.multiplier = next;
        TickOutcome::Tick {
            multiplier: next,
            cashouts: state.sweep_auto_cashouts(),
        }
    }

    /// Accept or reject a bet for the current round, broadcasting acceptance.
    pub async fn place_bet(
        &self,
        user_id: u64,
        amount: f64,
        auto_cashout: Option<f64>,
        username: Option<String>,
    ) -> GameResult<()> {
        let placed = self
            .state
            .write()
            .await
            .place_bet(user_id, amount, auto_cashout, username)?;
        debug!(
            "Bet placed: user {} amount {} auto_cashout {:?}",
            placed.user_id, placed.amount, auto_cashout
        );
        self.metrics.bets_placed_total.fetch_add(1, Ordering::SeqCst);
        self.broadcaster.broadcast(&WsEvent::bet_placed(placed));
        Ok(())
    }

    /// Resolve a participant's bet at the current multiplier, broadcasting
    /// the cashout.
    pub async fn request_cashout(&self, user_id: u64) -> GameResult<()> {
        let outcome = self.state.write().await.request_cashout(user_id)?;
        debug!(
            "Cashout: user {} at {:.2}x for {}",
            outcome.user_id, outcome.multiplier, outcome.winnings
        );
        self.metrics.cashouts_total.fetch_add(1, Ordering::SeqCst);
        self.broadcaster.broadcast(&WsEvent::cashout(outcome));
        Ok(())
    }

    /// Current round snapshot, including the recent history window.
    pub async fn snapshot(&self) -> StateSnapshot {
        let state = self.state.read().await;
        StateSnapshot {
            phase: state.phase,
            multiplier: state.multiplier,
            round_id: state.round_id,
            players_online: self.broadcaster.client_count(),
            history: state.recent_history(self.config.recent_history),
        }
    }

    /// The full history ring, newest first.
    pub async fn full_history(&self) -> Vec<HistoryEntry> {
        self.state.read().await.full_history()
    }

    /// Liveness probe payload.
    pub async fn current_round_id(&self) -> u64 {
        self.state.read().await.round_id
    }
}
