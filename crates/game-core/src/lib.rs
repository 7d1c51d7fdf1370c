//! Game Core
//!
//! In-memory state for the sealed-number trading game: players, trade
//! matching, balance and position bookkeeping, and settlement.
//!
//! # Example
//!
//! ```
//! use game_core::{GameConfig, TradingGame};
//! use rust_decimal::Decimal;
//!
//! let mut game = TradingGame::with_numbers(GameConfig::default(), &[3, 4], 1, Decimal::new(20, 0))?;
//! game.start_session()?;
//! game.match_trade("Player 1", "Player 2", Decimal::new(5, 0), Decimal::new(10, 0))?;
//! let settlement = game.end_session()?;
//! assert_eq!(settlement.final_price, Decimal::new(7, 0));
//! # Ok::<(), game_core::GameError>(())
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod player;

pub use config::GameConfig;
pub use error::{GameError, Result};
pub use game::{
    MarketState, SessionState, Settlement, SettlementEntry, TradeConfirmation, TradingGame,
};
pub use player::{Player, PlayerSnapshot, Position, Side};
