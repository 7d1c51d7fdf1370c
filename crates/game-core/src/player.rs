//! Player accounts: balance, open positions, and settlement unwinding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GameError, Result};

/// Side of a trade leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// A single open position, recorded in trade order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl Position {
    pub fn new(side: Side, price: Decimal, quantity: Decimal) -> Self {
        Self {
            side,
            price,
            quantity,
        }
    }

    /// Notional value of the position at entry, or `None` if it cannot be
    /// represented.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }

    /// Signed profit/loss of this position if unwound at `settlement_price`,
    /// or `None` if it cannot be represented.
    pub fn pnl_at(&self, settlement_price: Decimal) -> Option<Decimal> {
        let spread = match self.side {
            Side::Buy => settlement_price.checked_sub(self.price)?,
            Side::Sell => self.price.checked_sub(settlement_price)?,
        };
        spread.checked_mul(self.quantity)
    }
}

/// Total profit/loss of `positions` at `settlement_price`, summed in order.
fn total_pnl<'a>(
    positions: impl IntoIterator<Item = &'a Position>,
    settlement_price: Decimal,
) -> Option<Decimal> {
    positions
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.pnl_at(settlement_price)?))
}

/// Public view of a player, without the sealed number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub balance: Decimal,
    pub positions: Vec<Position>,
}

/// A seat at the table.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    number: u32,
    balance: Decimal,
    positions: Vec<Position>,
}

impl Player {
    pub fn new(name: impl Into<String>, number: u32, starting_balance: Decimal) -> Self {
        Self {
            name: name.into(),
            number,
            balance: starting_balance,
            positions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sealed number; contributes to the final settlement price.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Check whether a trade leg would be accepted, without applying it.
    ///
    /// Buys must be covered by the current balance. Sells are always
    /// accepted: there is no margin requirement on the short side. Either
    /// side is refused if the cash movement cannot be represented.
    pub fn check_leg(&self, side: Side, price: Decimal, quantity: Decimal) -> Result<()> {
        self.balance_after_leg(self.balance, &Position::new(side, price, quantity))
            .map(|_| ())
    }

    /// Balance left once `leg` is applied to `balance`.
    fn balance_after_leg(&self, balance: Decimal, leg: &Position) -> Result<Decimal> {
        let notional = leg.notional().ok_or_else(|| self.overflow())?;

        let balance_after = match leg.side {
            Side::Buy => {
                if balance < notional {
                    return Err(GameError::InsufficientFunds {
                        player: self.name.clone(),
                        required: notional,
                        available: balance,
                    });
                }
                balance.checked_sub(notional)
            }
            Side::Sell => balance.checked_add(notional),
        };

        balance_after.ok_or_else(|| self.overflow())
    }

    /// Check that, after taking on `legs` in order, every open position can
    /// still be unwound at `settlement_price`.
    ///
    /// `unwind_positions` performs the same arithmetic in the same order, so
    /// a player that passes this check always settles.
    pub fn check_settlement(&self, legs: &[Position], settlement_price: Decimal) -> Result<()> {
        let balance = legs
            .iter()
            .try_fold(self.balance, |balance, leg| self.balance_after_leg(balance, leg))?;

        total_pnl(self.positions.iter().chain(legs), settlement_price)
            .and_then(|pnl| balance.checked_add(pnl))
            .map(|_| ())
            .ok_or_else(|| self.overflow())
    }

    fn overflow(&self) -> GameError {
        GameError::Overflow {
            player: self.name.clone(),
        }
    }

    /// Check and commit a trade leg: record the position and move the cash.
    pub fn apply_leg(&mut self, side: Side, price: Decimal, quantity: Decimal) -> Result<()> {
        let position = Position::new(side, price, quantity);
        self.balance = self.balance_after_leg(self.balance, &position)?;
        self.positions.push(position);
        Ok(())
    }

    /// Buy `quantity` contracts at `price`. Fails without side effects if
    /// the balance cannot cover the cost.
    pub fn buy(&mut self, price: Decimal, quantity: Decimal) -> Result<()> {
        self.apply_leg(Side::Buy, price, quantity)
    }

    /// Sell `quantity` contracts at `price`. Only an unrepresentable amount
    /// is refused.
    pub fn sell(&mut self, price: Decimal, quantity: Decimal) -> Result<()> {
        self.apply_leg(Side::Sell, price, quantity)
    }

    /// Close every open position at `settlement_price`, credit the total
    /// profit/loss to the balance, and return it.
    ///
    /// Fails with `Overflow`, leaving the player untouched, if the result
    /// cannot be represented.
    pub fn unwind_positions(&mut self, settlement_price: Decimal) -> Result<Decimal> {
        let (profit_loss, balance) = self.unwind_preview(settlement_price)?;

        debug!(
            player = %self.name,
            positions = self.positions.len(),
            settlement_price = %settlement_price,
            profit_loss = %profit_loss,
            "Unwinding positions"
        );

        self.balance = balance;
        self.positions.clear();
        Ok(profit_loss)
    }

    /// Profit/loss and resulting balance of unwinding at `settlement_price`,
    /// without touching the player.
    pub fn unwind_preview(&self, settlement_price: Decimal) -> Result<(Decimal, Decimal)> {
        total_pnl(&self.positions, settlement_price)
            .and_then(|pnl| Some((pnl, self.balance.checked_add(pnl)?)))
            .ok_or_else(|| self.overflow())
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            name: self.name.clone(),
            balance: self.balance,
            positions: self.positions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn player() -> Player {
        Player::new("Player 1", 5, dec(1000))
    }

    #[test]
    fn test_buy_debits_balance_and_records_position() {
        let mut p = player();
        p.buy(dec(5), dec(10)).unwrap();

        assert_eq!(p.balance(), dec(950));
        assert_eq!(p.positions(), &[Position::new(Side::Buy, dec(5), dec(10))]);
    }

    #[test]
    fn test_buy_exactly_full_balance() {
        let mut p = player();
        p.buy(dec(100), dec(10)).unwrap();
        assert_eq!(p.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_buy_rejected_when_underfunded() {
        let mut p = player();
        let err = p.buy(dec(101), dec(10)).unwrap_err();

        assert_eq!(
            err,
            GameError::InsufficientFunds {
                player: "Player 1".to_string(),
                required: dec(1010),
                available: dec(1000),
            }
        );
        assert_eq!(p.balance(), dec(1000));
        assert!(p.positions().is_empty());
    }

    #[test]
    fn test_sell_always_applies() {
        let mut p = Player::new("Player 2", 1, Decimal::ZERO);
        p.sell(dec(500), dec(10)).unwrap();

        assert_eq!(p.balance(), dec(5000));
        assert_eq!(p.positions(), &[Position::new(Side::Sell, dec(500), dec(10))]);
    }

    #[test]
    fn test_check_leg_is_pure() {
        let p = player();
        assert!(p.check_leg(Side::Buy, dec(1), dec(1)).is_ok());
        assert!(p.check_leg(Side::Buy, dec(2000), dec(1)).is_err());
        assert!(p.check_leg(Side::Sell, dec(2000), dec(1000)).is_ok());
        assert_eq!(p.balance(), dec(1000));
        assert!(p.positions().is_empty());
    }

    #[test]
    fn test_unrepresentable_notional_rejected() {
        let p = player();
        let err = p.check_leg(Side::Sell, Decimal::MAX, dec(2)).unwrap_err();
        assert_eq!(
            err,
            GameError::Overflow {
                player: "Player 1".to_string()
            }
        );
    }

    #[test]
    fn test_unrepresentable_sell_rejected() {
        let mut p = player();
        let err = p.sell(Decimal::MAX, dec(2)).unwrap_err();
        assert!(matches!(err, GameError::Overflow { .. }));
        assert_eq!(p.balance(), dec(1000));
        assert!(p.positions().is_empty());
    }

    #[test]
    fn test_settlement_check_catches_pnl_overflow() {
        let tiny = Decimal::new(1, 28);
        let huge = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
        let mut p = player();
        p.buy(tiny, huge).unwrap();

        // One position at 7 is worth about 7e28; a second one overflows the sum.
        let leg = Position::new(Side::Buy, tiny, huge);
        assert!(p.check_settlement(&[], dec(7)).is_ok());
        assert!(matches!(
            p.check_settlement(&[leg], dec(7)),
            Err(GameError::Overflow { .. })
        ));
    }

    #[test]
    fn test_failed_unwind_leaves_player_untouched() {
        let mut p = player();
        p.sell(dec(1), dec(1)).unwrap();
        // 7 - Decimal::MIN cannot be represented.
        p.positions.push(Position::new(Side::Buy, Decimal::MIN, dec(2)));
        let before = p.snapshot();

        assert!(matches!(
            p.unwind_positions(dec(7)),
            Err(GameError::Overflow { .. })
        ));
        assert_eq!(p.snapshot(), before);
    }

    #[test]
    fn test_negative_quantity_buy_credits_cash() {
        let mut p = player();
        p.buy(dec(5), dec(-10)).unwrap();
        assert_eq!(p.balance(), dec(1050));

        // (7 - 5) * -10
        assert_eq!(p.unwind_positions(dec(7)).unwrap(), dec(-20));
        assert_eq!(p.balance(), dec(1030));
    }

    #[test]
    fn test_positions_keep_trade_order() {
        let mut p = player();
        p.buy(dec(5), dec(1)).unwrap();
        p.sell(dec(7), dec(2)).unwrap();
        p.buy(dec(3), dec(3)).unwrap();

        let sides: Vec<Side> = p.positions().iter().map(|pos| pos.side).collect();
        assert_eq!(sides, vec![Side::Buy, Side::Sell, Side::Buy]);
    }

    #[test]
    fn test_unwind_mixed_positions() {
        let mut p = player();
        p.buy(dec(5), dec(10)).unwrap(); // balance 950
        p.sell(dec(12), dec(4)).unwrap(); // balance 998

        // (9 - 5) * 10 + (12 - 9) * 4 = 40 + 12 = 52
        let pnl = p.unwind_positions(dec(9)).unwrap();
        assert_eq!(pnl, dec(52));
        assert_eq!(p.balance(), dec(1050));
        assert!(p.positions().is_empty());
    }

    #[test]
    fn test_unwind_loss() {
        let mut p = player();
        p.buy(dec(20), dec(5)).unwrap(); // balance 900

        let pnl = p.unwind_positions(dec(8)).unwrap();
        assert_eq!(pnl, dec(-60));
        assert_eq!(p.balance(), dec(840));
    }

    #[test]
    fn test_unwind_twice_is_zero() {
        let mut p = player();
        p.sell(dec(5), dec(10)).unwrap();
        p.unwind_positions(dec(7)).unwrap();
        let balance = p.balance();

        assert_eq!(p.unwind_positions(dec(7)).unwrap(), Decimal::ZERO);
        assert_eq!(p.balance(), balance);
    }

    #[test]
    fn test_fractional_prices() {
        let mut p = player();
        p.buy(Decimal::new(125, 1), dec(4)).unwrap(); // 12.5 * 4 = 50
        assert_eq!(p.balance(), dec(950));
        assert_eq!(p.unwind_positions(dec(13)).unwrap(), dec(2));
    }

    #[test]
    fn test_snapshot_hides_number() {
        let mut p = player();
        p.buy(dec(5), dec(1)).unwrap();
        let json = serde_json::to_value(p.snapshot()).unwrap();

        assert_eq!(json["name"], "Player 1");
        assert_eq!(json["positions"][0]["side"], "buy");
        assert!(json.get("number").is_none());
    }
}
