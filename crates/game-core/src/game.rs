//! The trading game: a fixed table of players, the trade log, and the
//! session lifecycle that ends in settlement.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::player::{Player, PlayerSnapshot, Position, Side};
use crate::{GameError, Result};

/// Lifecycle of a trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Game created, trading not yet open.
    NotStarted,
    /// Trades are accepted.
    Active,
    /// Settled; no further trading or settlement.
    Ended,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::NotStarted => "not_started",
            SessionState::Active => "active",
            SessionState::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Result of a matched trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeConfirmation {
    pub buyer: String,
    pub seller: String,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Human-readable summary.
    pub message: String,
}

/// One player's line in the settlement report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEntry {
    pub name: String,
    /// Balance after all positions were unwound.
    pub balance: Decimal,
    pub profit_loss: Decimal,
}

/// Settlement report produced when the session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub final_price: Decimal,
    pub players: Vec<SettlementEntry>,
}

/// Read-only view of the market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub last_trade_price: Decimal,
    pub session: SessionState,
    /// Executed trade prices, oldest first.
    pub trading_prices: Vec<Decimal>,
    pub players: Vec<PlayerSnapshot>,
}

/// A single game instance.
#[derive(Debug, Clone)]
pub struct TradingGame {
    config: GameConfig,
    players: Vec<Player>,
    /// Drawn at creation but not part of settlement.
    hidden_number: u32,
    trading_prices: Vec<Decimal>,
    last_trade_price: Decimal,
    session: SessionState,
}

impl TradingGame {
    /// Deal a new game using the thread-local RNG.
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_rng(config, &mut rand::rng())
    }

    /// Deal a new game drawing every random value from `rng`.
    pub fn with_rng<R: Rng>(config: GameConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let numbers: Vec<u32> = (0..config.num_players)
            .map(|_| rng.random_range(1..=config.number_range))
            .collect();
        let hidden_number = rng.random_range(1..=config.number_range);
        let initial_price =
            rng.random_range(config.initial_price_min..=config.initial_price_max);

        Self::with_numbers(config, &numbers, hidden_number, Decimal::from(initial_price))
    }

    /// Build a game with fixed sealed numbers, one player per number.
    pub fn with_numbers(
        config: GameConfig,
        numbers: &[u32],
        hidden_number: u32,
        initial_price: Decimal,
    ) -> Result<Self> {
        if numbers.is_empty() {
            return Err(GameError::Config {
                message: "a game needs at least one player".to_string(),
            });
        }

        let players = numbers
            .iter()
            .enumerate()
            .map(|(i, &number)| {
                Player::new(format!("Player {}", i + 1), number, config.starting_balance)
            })
            .collect();

        debug!(
            players = numbers.len(),
            initial_price = %initial_price,
            "Dealt new game"
        );

        Ok(Self {
            config: config.with_players(numbers.len()),
            players,
            hidden_number,
            trading_prices: Vec::new(),
            last_trade_price: initial_price,
            session: SessionState::NotStarted,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// First player with the given name.
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name() == name)
    }

    pub fn hidden_number(&self) -> u32 {
        self.hidden_number
    }

    pub fn trading_prices(&self) -> &[Decimal] {
        &self.trading_prices
    }

    pub fn last_trade_price(&self) -> Decimal {
        self.last_trade_price
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Open trading. Only valid for a freshly dealt game.
    pub fn start_session(&mut self) -> Result<()> {
        if self.session != SessionState::NotStarted {
            return Err(GameError::InvalidTransition {
                from: self.session,
                to: SessionState::Active,
            });
        }
        self.session = SessionState::Active;
        info!(players = self.players.len(), "Trading session started");
        Ok(())
    }

    /// Match a trade between two players.
    ///
    /// Both legs are checked before either is applied, so a rejected trade
    /// leaves every player untouched. A trade is also refused if either
    /// player's positions could no longer be unwound at the final price.
    pub fn match_trade(
        &mut self,
        buyer_name: &str,
        seller_name: &str,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<TradeConfirmation> {
        self.try_match(buyer_name, seller_name, price, quantity)
            .inspect_err(|e| {
                warn!(
                    buyer = buyer_name,
                    seller = seller_name,
                    price = %price,
                    quantity = %quantity,
                    error = %e,
                    "Trade rejected"
                );
            })
    }

    fn try_match(
        &mut self,
        buyer_name: &str,
        seller_name: &str,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<TradeConfirmation> {
        if self.session != SessionState::Active {
            return Err(GameError::SessionNotActive(self.session));
        }

        let buyer = self.seat(buyer_name)?;
        let seller = self.seat(seller_name)?;

        self.players[buyer].check_leg(Side::Buy, price, quantity)?;
        self.players[seller].check_leg(Side::Sell, price, quantity)?;

        let final_price = self.settlement_price();
        let buy = Position::new(Side::Buy, price, quantity);
        let sell = Position::new(Side::Sell, price, quantity);
        if buyer == seller {
            self.players[buyer].check_settlement(&[buy, sell], final_price)?;
        } else {
            self.players[buyer].check_settlement(&[buy], final_price)?;
            self.players[seller].check_settlement(&[sell], final_price)?;
        }

        self.players[buyer].apply_leg(Side::Buy, price, quantity)?;
        self.players[seller].apply_leg(Side::Sell, price, quantity)?;

        self.trading_prices.push(price);
        self.last_trade_price = price;

        info!(
            buyer = buyer_name,
            seller = seller_name,
            price = %price,
            quantity = %quantity,
            "Trade matched"
        );

        Ok(TradeConfirmation {
            buyer: buyer_name.to_string(),
            seller: seller_name.to_string(),
            price,
            quantity,
            message: format!(
                "Trade matched: {buyer_name} bought from {seller_name} at {price} for {quantity} contracts."
            ),
        })
    }

    fn seat(&self, name: &str) -> Result<usize> {
        self.players
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| GameError::UnknownPlayer(name.to_string()))
    }

    /// Final price: the sum of every player's sealed number.
    pub fn settlement_price(&self) -> Decimal {
        self.players.iter().map(|p| Decimal::from(p.number())).sum()
    }

    /// Unwind every player's positions at the settlement price.
    ///
    /// Every player is priced before any balance moves, so an error leaves
    /// the game untouched. Does not touch the session state; a second call
    /// finds no open positions and reports zero profit/loss for everyone.
    pub fn settle_trades(&mut self) -> Result<Settlement> {
        let final_price = self.settlement_price();

        for p in &self.players {
            p.unwind_preview(final_price)?;
        }

        let players = self
            .players
            .iter_mut()
            .map(|p| {
                let profit_loss = p.unwind_positions(final_price)?;
                Ok(SettlementEntry {
                    name: p.name().to_string(),
                    balance: p.balance(),
                    profit_loss,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            final_price = %final_price,
            hidden_number = self.hidden_number,
            trades = self.trading_prices.len(),
            "Trades settled"
        );

        Ok(Settlement {
            final_price,
            players,
        })
    }

    /// Close the session and settle. Settlement happens exactly once; the
    /// session only moves to `Ended` once every player has been settled.
    pub fn end_session(&mut self) -> Result<Settlement> {
        match self.session {
            SessionState::Active => {
                let settlement = self.settle_trades()?;
                self.session = SessionState::Ended;
                Ok(settlement)
            }
            SessionState::Ended => Err(GameError::AlreadySettled),
            SessionState::NotStarted => Err(GameError::SessionNotActive(self.session)),
        }
    }

    pub fn get_market_state(&self) -> MarketState {
        MarketState {
            last_trade_price: self.last_trade_price,
            session: self.session,
            trading_prices: self.trading_prices.clone(),
            players: self.players.iter().map(Player::snapshot).collect(),
        }
    }
}
