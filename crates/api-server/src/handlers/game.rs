//! Game lifecycle and trading handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use game_core::{
    MarketState, PlayerSnapshot, Position, SessionState, Settlement, SettlementEntry, Side,
    TradeConfirmation,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MISSING_PARAMETERS: &str = "Missing parameters!";

/// Plain confirmation message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Request to match a trade between two players.
///
/// All four fields are required. Empty names and zero price or quantity
/// count as missing.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TradeRequest {
    /// Name of the buying player.
    #[serde(default)]
    pub buyer: Option<String>,
    /// Name of the selling player.
    #[serde(default)]
    pub seller: Option<String>,
    /// Price per contract.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Number of contracts.
    #[serde(default)]
    pub quantity: Option<Decimal>,
}

/// A trade with every field present.
#[derive(Debug, PartialEq)]
struct ValidTrade {
    buyer: String,
    seller: String,
    price: Decimal,
    quantity: Decimal,
}

impl TradeRequest {
    fn validate(self) -> ApiResult<ValidTrade> {
        let missing = || ApiError::BadRequest(MISSING_PARAMETERS.to_string());

        let buyer = self.buyer.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let seller = self.seller.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let price = self.price.filter(|d| !d.is_zero()).ok_or_else(missing)?;
        let quantity = self.quantity.filter(|d| !d.is_zero()).ok_or_else(missing)?;

        Ok(ValidTrade {
            buyer,
            seller,
            price,
            quantity,
        })
    }
}

/// Matched trade.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TradeResponse {
    pub message: String,
    pub buyer: String,
    pub seller: String,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl From<TradeConfirmation> for TradeResponse {
    fn from(t: TradeConfirmation) -> Self {
        Self {
            message: t.message,
            buyer: t.buyer,
            seller: t.seller,
            price: t.price,
            quantity: t.quantity,
        }
    }
}

/// Open position as reported in the market snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PositionResponse {
    /// "buy" or "sell".
    #[schema(value_type = String)]
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl From<Position> for PositionResponse {
    fn from(p: Position) -> Self {
        Self {
            side: p.side,
            price: p.price,
            quantity: p.quantity,
        }
    }
}

/// One player's public state.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayerStateResponse {
    pub name: String,
    pub balance: Decimal,
    pub positions: Vec<PositionResponse>,
}

impl From<PlayerSnapshot> for PlayerStateResponse {
    fn from(p: PlayerSnapshot) -> Self {
        Self {
            name: p.name,
            balance: p.balance,
            positions: p.positions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Market snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GameStateResponse {
    pub last_trade_price: Decimal,
    /// "not_started", "active" or "ended".
    #[schema(value_type = String)]
    pub session: SessionState,
    /// Executed trade prices, oldest first.
    pub trading_prices: Vec<Decimal>,
    pub players: Vec<PlayerStateResponse>,
}

impl From<MarketState> for GameStateResponse {
    fn from(m: MarketState) -> Self {
        Self {
            last_trade_price: m.last_trade_price,
            session: m.session,
            trading_prices: m.trading_prices,
            players: m.players.into_iter().map(Into::into).collect(),
        }
    }
}

/// One player's settlement line.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayerSettlementResponse {
    pub name: String,
    /// Balance after positions were unwound.
    pub balance: Decimal,
    pub profit_loss: Decimal,
}

impl From<SettlementEntry> for PlayerSettlementResponse {
    fn from(e: SettlementEntry) -> Self {
        Self {
            name: e.name,
            balance: e.balance,
            profit_loss: e.profit_loss,
        }
    }
}

/// Settlement results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettlementResponse {
    /// Sum of all players' sealed numbers.
    pub final_price: Decimal,
    pub players: Vec<PlayerSettlementResponse>,
}

impl From<Settlement> for SettlementResponse {
    fn from(s: Settlement) -> Self {
        Self {
            final_price: s.final_price,
            players: s.players.into_iter().map(Into::into).collect(),
        }
    }
}

/// Start a new game, replacing the current one.
#[utoipa::path(
    post,
    path = "/start_game",
    tag = "game",
    responses(
        (status = 200, description = "Trading session started", body = MessageResponse),
        (status = 500, description = "Game could not be dealt")
    )
)]
pub async fn start_game(State(state): State<Arc<AppState>>) -> ApiResult<Json<MessageResponse>> {
    state.start_game().await?;
    info!(
        num_players = state.game_config.num_players,
        "New game dealt"
    );

    Ok(Json(MessageResponse {
        message: "Trading session started!".to_string(),
    }))
}

/// Get the current market snapshot.
#[utoipa::path(
    get,
    path = "/game_state",
    tag = "game",
    responses(
        (status = 200, description = "Current market state", body = GameStateResponse)
    )
)]
pub async fn game_state(State(state): State<Arc<AppState>>) -> Json<GameStateResponse> {
    let snapshot = state.market_state().await;
    debug!(
        session = %snapshot.session,
        trades = snapshot.trading_prices.len(),
        "Market snapshot"
    );
    Json(snapshot.into())
}

/// Match a trade between a buyer and a seller.
#[utoipa::path(
    post,
    path = "/trade",
    tag = "game",
    request_body = TradeRequest,
    responses(
        (status = 200, description = "Trade matched", body = TradeResponse),
        (status = 400, description = "Missing parameters or malformed JSON", body = crate::error::ErrorResponse),
        (status = 409, description = "Trading session is not active", body = crate::error::ErrorResponse),
        (status = 422, description = "Trade failed: unknown player or insufficient balance", body = crate::error::ErrorResponse)
    )
)]
pub async fn trade(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TradeRequest>, JsonRejection>,
) -> ApiResult<Json<TradeResponse>> {
    let Json(request) = payload?;
    let trade = request.validate()?;

    let confirmation = state
        .submit_trade(&trade.buyer, &trade.seller, trade.price, trade.quantity)
        .await?;

    Ok(Json(confirmation.into()))
}

/// End the session and settle every position.
#[utoipa::path(
    post,
    path = "/end_game",
    tag = "game",
    responses(
        (status = 200, description = "Settlement results", body = SettlementResponse),
        (status = 409, description = "Session not active or already settled", body = crate::error::ErrorResponse)
    )
)]
pub async fn end_game(State(state): State<Arc<AppState>>) -> ApiResult<Json<SettlementResponse>> {
    let settlement = state.end_game().await?;
    Ok(Json(settlement.into()))
}
