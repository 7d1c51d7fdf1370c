//! Integration tests for the game lifecycle.
//!
//! These tests drive the core through the same sequence of operations the
//! HTTP layer uses: start, trade, snapshot, end.

use game_core::{GameConfig, GameError, SessionState, Side, TradingGame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// Two players with sealed numbers fixed at 3 and 4.
fn two_player_game() -> TradingGame {
    let config = GameConfig::default().with_players(2);
    let mut game = TradingGame::with_numbers(config, &[3, 4], 6, dec(30)).unwrap();
    game.start_session().unwrap();
    game
}

/// Player 1 buys 10 from Player 2 at 5, then the game ends at 3 + 4 = 7.
#[test]
fn test_two_player_end_to_end() {
    let mut game = two_player_game();

    let confirmation = game
        .match_trade("Player 1", "Player 2", dec(5), dec(10))
        .unwrap();
    assert_eq!(confirmation.price, dec(5));

    let state = game.get_market_state();
    assert_eq!(state.players[0].balance, dec(950));
    assert_eq!(state.players[1].balance, dec(1050));
    assert_eq!(state.players[0].positions[0].side, Side::Buy);
    assert_eq!(state.players[1].positions[0].side, Side::Sell);

    let settlement = game.end_session().unwrap();
    assert_eq!(settlement.final_price, dec(7));

    let p1 = &settlement.players[0];
    assert_eq!(p1.name, "Player 1");
    assert_eq!(p1.profit_loss, dec(20));
    assert_eq!(p1.balance, dec(970));

    let p2 = &settlement.players[1];
    assert_eq!(p2.name, "Player 2");
    assert_eq!(p2.profit_loss, dec(-20));
    assert_eq!(p2.balance, dec(1030));

    let state = game.get_market_state();
    assert_eq!(state.session, SessionState::Ended);
    assert!(state.players.iter().all(|p| p.positions.is_empty()));
}

/// A rejected trade leaves both counterparties exactly as they were.
#[test]
fn test_rejected_trades_are_atomic() {
    let mut game = two_player_game();
    game.match_trade("Player 2", "Player 1", dec(10), dec(10))
        .unwrap();
    let before = game.get_market_state();

    let cases = [
        ("Player 3", "Player 1", dec(1), dec(1)),
        ("Player 1", "Player 3", dec(1), dec(1)),
        ("Player 2", "Player 1", dec(100), dec(10)),
    ];
    for (buyer, seller, price, quantity) in cases {
        assert!(game.match_trade(buyer, seller, price, quantity).is_err());
        assert_eq!(game.get_market_state(), before);
    }
}

/// Trades that would leave a player's settlement unrepresentable are
/// refused, so the game can always be ended afterwards.
#[test]
fn test_settlement_never_overflows() {
    let mut game = two_player_game();
    let tiny = Decimal::new(1, 28);
    let huge = Decimal::from_i128_with_scale(10_i128.pow(28), 0);

    game.match_trade("Player 1", "Player 2", tiny, huge).unwrap();
    let before = game.get_market_state();
    let err = game
        .match_trade("Player 1", "Player 2", tiny, huge)
        .unwrap_err();
    assert!(matches!(err, GameError::Overflow { .. }));
    assert_eq!(game.get_market_state(), before);

    let settlement = game.end_session().unwrap();
    assert_eq!(game.session(), SessionState::Ended);
    assert!(game.players().iter().all(|p| p.positions().is_empty()));
    let pnl: Decimal = settlement.players.iter().map(|p| p.profit_loss).sum();
    assert!(pnl.is_zero());
}

/// Negative quantities flip the cash flow and the settlement sign.
#[test]
fn test_negative_quantity_round_trip() {
    let mut game = two_player_game();
    game.match_trade("Player 1", "Player 2", dec(5), dec(-10))
        .unwrap();

    let settlement = game.end_session().unwrap();
    assert_eq!(settlement.players[0].balance, dec(1030));
    assert_eq!(settlement.players[1].balance, dec(970));
}

/// Snapshots never change balances, positions, or the trade log.
#[test]
fn test_snapshot_does_not_mutate() {
    let mut game = two_player_game();
    game.match_trade("Player 1", "Player 2", dec(4), dec(2))
        .unwrap();

    let snapshots: Vec<_> = (0..5).map(|_| game.get_market_state()).collect();
    assert!(snapshots.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(game.trading_prices(), &[dec(4)]);
}

/// Final price is the sum of sealed numbers whatever the hidden number is.
#[test]
fn test_final_price_is_sum_of_sealed_numbers() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let mut game = TradingGame::with_rng(GameConfig::default(), &mut rng).unwrap();
        game.start_session().unwrap();
        let expected: u32 = game.players().iter().map(|p| p.number()).sum();

        let settlement = game.end_session().unwrap();
        assert_eq!(settlement.final_price, Decimal::from(expected));
    }
}

/// Random trading never drives a balance negative through a buy, and the
/// table's total cash is conserved through trading and settlement.
#[test]
fn test_random_session_invariants() {
    let mut rng = StdRng::seed_from_u64(2024);
    let config = GameConfig::default().with_players(5);
    let mut game = TradingGame::with_rng(config, &mut rng).unwrap();
    game.start_session().unwrap();

    let mut matched = 0;
    for _ in 0..500 {
        let buyer = format!("Player {}", rng.random_range(1..=5));
        let seller = format!("Player {}", rng.random_range(1..=5));
        let price = dec(rng.random_range(1..=60));
        let quantity = dec(rng.random_range(1..=20));

        let before = game
            .player(&buyer)
            .map(|p| p.balance())
            .unwrap_or_default();
        match game.match_trade(&buyer, &seller, price, quantity) {
            Ok(_) => {
                matched += 1;
                assert!(before >= price * quantity);
            }
            Err(GameError::InsufficientFunds { required, available, .. }) => {
                assert!(available < required);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(matched > 0);
    assert_eq!(game.trading_prices().len(), matched);

    let total: Decimal = game.players().iter().map(|p| p.balance()).sum();
    assert_eq!(total, dec(5000));

    let settlement = game.end_session().unwrap();
    let total: Decimal = settlement.players.iter().map(|p| p.balance).sum();
    assert_eq!(total, dec(5000));
}

/// The session is a one-way street: NotStarted -> Active -> Ended.
#[test]
fn test_session_lifecycle() {
    let config = GameConfig::default().with_players(2);
    let mut game = TradingGame::with_numbers(config, &[1, 2], 1, dec(10)).unwrap();
    assert_eq!(game.session(), SessionState::NotStarted);
    assert!(game.match_trade("Player 1", "Player 2", dec(1), dec(1)).is_err());

    game.start_session().unwrap();
    assert_eq!(game.session(), SessionState::Active);

    game.end_session().unwrap();
    assert_eq!(game.session(), SessionState::Ended);
    assert_eq!(game.end_session().unwrap_err(), GameError::AlreadySettled);
    assert!(game.start_session().is_err());
}

/// Market state serializes with JSON numbers for money fields.
#[test]
fn test_market_state_json_shape() {
    let mut game = two_player_game();
    game.match_trade("Player 1", "Player 2", dec(5), dec(10))
        .unwrap();

    let json = serde_json::to_value(game.get_market_state()).unwrap();
    assert_eq!(json["last_trade_price"], 5.0);
    assert_eq!(json["session"], "active");
    assert_eq!(json["players"][0]["name"], "Player 1");
    assert_eq!(json["players"][0]["positions"][0]["side"], "buy");
    assert_eq!(json["players"][0]["positions"][0]["quantity"], 10.0);
}
