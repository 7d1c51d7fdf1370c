//! Error types for the trading game core.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::game::SessionState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("Insufficient funds: {player} needs {required} but has {available}")]
    InsufficientFunds {
        player: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Trade amount overflows the balance of {player}")]
    Overflow { player: String },

    #[error("Trading session is not active (state: {0})")]
    SessionNotActive(SessionState),

    #[error("Cannot move session from {from} to {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("Game has already been settled")]
    AlreadySettled,

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl GameError {
    /// Whether this error rejected a trade (as opposed to a lifecycle violation).
    pub fn is_trade_rejection(&self) -> bool {
        matches!(
            self,
            GameError::UnknownPlayer(_)
                | GameError::InsufficientFunds { .. }
                | GameError::Overflow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
