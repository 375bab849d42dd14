//! Bet ledger operations.
//!
//! Every mutation here runs under the engine's state lock, so each operation
//! is one atomic step relative to phase transitions. That is what makes the
//! "at most one cashout per bet" and "bets only while betting" invariants
//! hold under concurrent connections.

use super::state::{Bet, GameState, Phase};
use crate::errors::{GameError, GameResult};
use crate::fairness::round4;
use serde::{Deserialize, Serialize};

/// Display label used when a client places a bet without a username.
pub const DEFAULT_USERNAME: &str = "Player";

/// Accepted bet, as announced to all clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedBet {
    pub user_id: u64,
    pub username: String,
    pub amount: f64,
}

/// A resolved cashout (explicit request), with computed winnings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashoutOutcome {
    pub user_id: u64,
    pub username: String,
    pub multiplier: f64,
    pub winnings: f64,
}

/// An auto-cashout resolved during a tick sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoCashout {
    pub user_id: u64,
    pub username: String,
    pub multiplier: f64,
}

/// Per-participant outcome reported when the round crashes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetResult {
    pub user_id: u64,
    pub username: String,
    pub amount: f64,
    pub cashed_out: bool,
    pub cashout_at: Option<f64>,
}

impl GameState {
    /// Insert or replace the participant's bet for the current round.
    ///
    /// A second placement by the same participant in the same betting window
    /// overwrites the first (last write wins).
    pub fn place_bet(
        &mut self,
        user_id: u64,
        amount: f64,
        auto_cashout: Option<f64>,
        username: Option<String>,
    ) -> GameResult<PlacedBet> {
        if self.phase != Phase::Betting {
            return Err(GameError::BettingClosed);
        }
        if amount <= 0.0 || !amount.is_finite() {
            return Err(GameError::InvalidAmount(amount));
        }
        if let Some(threshold) = auto_cashout {
            if threshold < 1.0 || !threshold.is_finite() {
                return Err(GameError::InvalidAutoCashout(threshold));
            }
        }

        let username = username.unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        self.bets.insert(
            user_id,
            Bet {
                amount,
                auto_cashout,
                cashed_out: false,
                cashout_at: None,
                username: username.clone(),
            },
        );

        Ok(PlacedBet {
            user_id,
            username,
            amount,
        })
    }

    /// Resolve the participant's bet at the current multiplier.
    pub fn request_cashout(&mut self, user_id: u64) -> GameResult<CashoutOutcome> {
        if self.phase != Phase::Running {
            return Err(GameError::RoundNotRunning);
        }
        let multiplier = self.multiplier;
        let bet = self.bets.get_mut(&user_id).ok_or(GameError::NoActiveBet)?;
        if bet.cashed_out {
            return Err(GameError::AlreadyCashedOut);
        }

        bet.cashed_out = true;
        bet.cashout_at = Some(multiplier);

        Ok(CashoutOutcome {
            user_id,
            username: bet.username.clone(),
            multiplier,
            winnings: round4(bet.amount * multiplier),
        })
    }

    /// Resolve every bet whose auto-cashout threshold has been reached.
    ///
    /// Each qualifying bet transitions to cashed-out exactly once; bets
    /// already resolved (by either path) are skipped.
    pub fn sweep_auto_cashouts(&mut self) -> Vec<AutoCashout> {
        let multiplier = self.multiplier;
        let mut cashouts = Vec::new();
        for (&user_id, bet) in self.bets.iter_mut() {
            if bet.cashed_out {
                continue;
            }
            let Some(threshold) = bet.auto_cashout else {
                continue;
            };
            if multiplier >= threshold {
                bet.cashed_out = true;
                bet.cashout_at = Some(multiplier);
                cashouts.push(AutoCashout {
                    user_id,
                    username: bet.username.clone(),
                    multiplier,
                });
            }
        }
        cashouts
    }

    /// Bets placed during the betting window, announced at round start.
    pub fn bet_summaries(&self) -> Vec<PlacedBet> {
        self.bets
            .iter()
            .map(|(&user_id, bet)| PlacedBet {
                user_id,
                username: bet.username.clone(),
                amount: bet.amount,
            })
            .collect()
    }

    /// Per-participant outcomes for the crashed broadcast.
    pub fn round_results(&self) -> Vec<BetResult> {
        self.bets
            .iter()
            .map(|(&user_id, bet)| BetResult {
                user_id,
                username: bet.username.clone(),
                amount: bet.amount,
                cashed_out: bet.cashed_out,
                cashout_at: bet.cashout_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn betting_state() -> GameState {
        let mut state = GameState::new(20);
        state.enter_betting(3.0);
        state
    }

    #[test]
    fn test_place_bet_outside_betting_rejected() {
        let mut state = GameState::new(20);
        assert_eq!(
            state.place_bet(1, 10.0, None, None),
            Err(GameError::BettingClosed)
        );

        state.enter_betting(3.0);
        state.enter_running(Instant::now());
        assert_eq!(
            state.place_bet(1, 10.0, None, None),
            Err(GameError::BettingClosed)
        );
        assert!(state.bets.is_empty());
    }

    #[test]
    fn test_place_bet_invalid_amount_rejected() {
        let mut state = betting_state();
        assert_eq!(
            state.place_bet(1, 0.0, None, None),
            Err(GameError::InvalidAmount(0.0))
        );
        assert_eq!(
            state.place_bet(1, -3.0, None, None),
            Err(GameError::InvalidAmount(-3.0))
        );
        assert!(state.bets.is_empty());
    }

    #[test]
    fn test_place_bet_invalid_auto_cashout_rejected() {
        let mut state = betting_state();
        assert_eq!(
            state.place_bet(1, 10.0, Some(0.5), None),
            Err(GameError::InvalidAutoCashout(0.5))
        );
    }

    #[test]
    fn test_place_bet_defaults_username() {
        let mut state = betting_state();
        let placed = state.place_bet(1, 10.0, None, None).unwrap();
        assert_eq!(placed.username, DEFAULT_USERNAME);
    }

    #[test]
    fn test_replacing_bet_overwrites() {
        let mut state = betting_state();
        state
            .place_bet(1, 10.0, Some(2.0), Some("alice".to_string()))
            .unwrap();
        state.place_bet(1, 25.0, None, Some("alice".to_string())).unwrap();

        assert_eq!(state.bets.len(), 1);
        let bet = &state.bets[&1];
        assert_eq!(bet.amount, 25.0);
        assert_eq!(bet.auto_cashout, None);
    }

    #[test]
    fn test_cashout_requires_running_phase() {
        let mut state = betting_state();
        state.place_bet(1, 10.0, None, None).unwrap();
        assert_eq!(state.request_cashout(1), Err(GameError::RoundNotRunning));
    }

    #[test]
    fn test_cashout_requires_active_bet() {
        let mut state = betting_state();
        state.enter_running(Instant::now());
        assert_eq!(state.request_cashout(99), Err(GameError::NoActiveBet));
    }

    #[test]
    fn test_cashout_at_most_once() {
        let mut state = betting_state();
        state.place_bet(1, 10.0, None, Some("bob".to_string())).unwrap();
        state.enter_running(Instant::now());
        state.multiplier = 1.5;

        let outcome = state.request_cashout(1).unwrap();
        assert_eq!(outcome.multiplier, 1.5);
        assert_eq!(outcome.winnings, 15.0);

        assert_eq!(state.request_cashout(1), Err(GameError::AlreadyCashedOut));
    }

    #[test]
    fn test_auto_cashout_resolves_exactly_once() {
        let mut state = betting_state();
        state.place_bet(1, 10.0, Some(2.0), None).unwrap();
        state.place_bet(2, 5.0, Some(5.0), None).unwrap();
        state.enter_running(Instant::now());

        state.multiplier = 1.5;
        assert!(state.sweep_auto_cashouts().is_empty());

        state.multiplier = 2.1;
        let swept = state.sweep_auto_cashouts();
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].user_id, 1);
        assert_eq!(swept[0].multiplier, 2.1);
        assert_eq!(state.bets[&1].cashout_at, Some(2.1));

        // Already-resolved bet never qualifies again.
        state.multiplier = 3.0;
        assert!(state.sweep_auto_cashouts().is_empty());

        // And an explicit cashout after auto-resolution is rejected.
        assert_eq!(state.request_cashout(1), Err(GameError::AlreadyCashedOut));
    }

    #[test]
    fn test_manual_cashout_excluded_from_sweep() {
        let mut state = betting_state();
        state.place_bet(1, 10.0, Some(2.0), None).unwrap();
        state.enter_running(Instant::now());
        state.multiplier = 1.2;
        state.request_cashout(1).unwrap();

        state.multiplier = 2.5;
        assert!(state.sweep_auto_cashouts().is_empty());
    }

    #[test]
    fn test_round_results_won_and_lost() {
        let mut state = betting_state();
        state.place_bet(1, 10.0, None, Some("winner".to_string())).unwrap();
        state.place_bet(2, 10.0, None, Some("loser".to_string())).unwrap();
        state.enter_running(Instant::now());
        state.multiplier = 1.5;
        state.request_cashout(1).unwrap();
        state.enter_crashed();

        let mut results = state.round_results();
        results.sort_by_key(|r| r.user_id);
        assert!(results[0].cashed_out);
        assert_eq!(results[0].cashout_at, Some(1.5));
        assert!(!results[1].cashed_out);
        assert_eq!(results[1].cashout_at, None);
    }

    #[test]
    fn test_winnings_rounded_to_4dp() {
        let mut state = betting_state();
        state.place_bet(1, 0.07, None, None).unwrap();
        state.enter_running(Instant::now());
        state.multiplier = 1.33;

        let outcome = state.request_cashout(1).unwrap();
        assert_eq!(outcome.winnings, 0.0931);
    }
}
