//! Game configuration.

use crate::{GameError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;

/// Parameters used to build a new game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of players seated at game start.
    pub num_players: usize,
    /// Upper bound (inclusive) for sealed numbers and the hidden number.
    pub number_range: u32,
    /// Balance every player starts with.
    pub starting_balance: Decimal,
    /// Lower bound (inclusive) for the opening market price.
    pub initial_price_min: u32,
    /// Upper bound (inclusive) for the opening market price.
    pub initial_price_max: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: 9,
            number_range: 10,
            starting_balance: Decimal::new(1000, 0),
            initial_price_min: 10,
            initial_price_max: 50,
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            num_players: parse_var("GAME_NUM_PLAYERS")?.unwrap_or(defaults.num_players),
            number_range: parse_var("GAME_NUMBER_RANGE")?.unwrap_or(defaults.number_range),
            starting_balance: parse_var("GAME_STARTING_BALANCE")?
                .unwrap_or(defaults.starting_balance),
            initial_price_min: parse_var("GAME_INITIAL_PRICE_MIN")?
                .unwrap_or(defaults.initial_price_min),
            initial_price_max: parse_var("GAME_INITIAL_PRICE_MAX")?
                .unwrap_or(defaults.initial_price_max),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the configured ranges can actually be sampled.
    pub fn validate(&self) -> Result<()> {
        if self.num_players == 0 {
            return Err(config_error("num_players must be at least 1"));
        }
        if self.number_range == 0 {
            return Err(config_error("number_range must be at least 1"));
        }
        if self.initial_price_min > self.initial_price_max {
            return Err(config_error(format!(
                "initial_price_min ({}) exceeds initial_price_max ({})",
                self.initial_price_min, self.initial_price_max
            )));
        }
        if self.starting_balance.is_sign_negative() {
            return Err(config_error("starting_balance must not be negative"));
        }
        Ok(())
    }

    /// Same settings with a different seat count.
    pub fn with_players(mut self, num_players: usize) -> Self {
        self.num_players = num_players;
        self
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| config_error(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}

fn config_error(message: impl Into<String>) -> GameError {
    GameError::Config {
        message: message.into(),
    }
}
