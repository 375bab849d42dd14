//! Domain error types for game operations.
//!
//! These are validation errors in the taxonomy of the protocol: reported
//! privately to the offending connection, never broadcast, and never
//! mutating game state.

/// Errors produced by bet-ledger operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("Bets are only accepted during the betting window")]
    BettingClosed,

    #[error("Invalid bet amount: {0}")]
    InvalidAmount(f64),

    #[error("Auto-cashout must be at least 1.0 (got {0})")]
    InvalidAutoCashout(f64),

    #[error("Cashout is only available while the round is running")]
    RoundNotRunning,

    #[error("No active bet for this round")]
    NoActiveBet,

    #[error("Bet already cashed out")]
    AlreadyCashedOut,
}

/// Convenience alias for ledger operation results.
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(GameError::InvalidAmount(-5.0).to_string().contains("-5"));
        assert!(GameError::BettingClosed
            .to_string()
            .contains("betting window"));
    }
}
