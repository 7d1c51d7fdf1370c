//! Application state shared across handlers.

use game_core::{GameConfig, MarketState, Settlement, TradeConfirmation, TradingGame};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::ApiResult;

/// Shared application state.
///
/// The whole game sits behind one mutex; every operation holds it for its
/// full duration.
#[derive(Clone)]
pub struct AppState {
    /// The current game instance. Replaced wholesale on `start_game`.
    pub game: Arc<Mutex<TradingGame>>,
    /// Settings used to deal each new game.
    pub game_config: GameConfig,
}

impl AppState {
    /// Create state holding a dealt but not yet started game.
    pub fn new(game_config: GameConfig) -> anyhow::Result<Self> {
        let game = TradingGame::new(game_config.clone())?;
        Ok(Self::with_game(game_config, game))
    }

    /// Create state around an existing game.
    pub fn with_game(game_config: GameConfig, game: TradingGame) -> Self {
        Self {
            game: Arc::new(Mutex::new(game)),
            game_config,
        }
    }

    /// Deal a fresh game, replacing the current one, and open trading.
    pub async fn start_game(&self) -> ApiResult<()> {
        let mut game = self.game.lock().await;
        let mut fresh = TradingGame::new(self.game_config.clone())?;
        fresh.start_session()?;
        *game = fresh;
        Ok(())
    }

    pub async fn market_state(&self) -> MarketState {
        self.game.lock().await.get_market_state()
    }

    pub async fn submit_trade(
        &self,
        buyer: &str,
        seller: &str,
        price: Decimal,
        quantity: Decimal,
    ) -> ApiResult<TradeConfirmation> {
        let mut game = self.game.lock().await;
        Ok(game.match_trade(buyer, seller, price, quantity)?)
    }

    pub async fn end_game(&self) -> ApiResult<Settlement> {
        let mut game = self.game.lock().await;
        Ok(game.end_session()?)
    }
}
