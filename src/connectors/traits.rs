// src/connectors/traits.rs
use crate::types::{BalanceSnapshot, Candle, OrderBook, OrderResponse, Side, Ticker};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Gateway fault taxonomy. `RateLimited` is the one the orchestration layer
/// treats specially (pause and retry the unit of work once); everything else
/// is either logged-and-dropped at the order boundary or escalated per call
/// site.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExchangeError::Parse(err.to_string())
        } else {
            ExchangeError::Network(err.to_string())
        }
    }
}

/// The exchange as the rest of the system sees it: balance/ticker/OHLCV/book
/// fetches plus order placement. Opaque; may fail or be rate-limited.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Loads the set of tradable markets. Must be called before `has_market`.
    async fn load_markets(&mut self) -> ExchangeResult<()>;

    /// Whether `symbol` ("ETH/KRW") is tradable on the exchange.
    fn has_market(&self, symbol: &str) -> bool;

    async fn fetch_balance(&self) -> ExchangeResult<BalanceSnapshot>;

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker>;

    /// Daily candles, oldest first, at most `days` bars.
    async fn fetch_ohlcv(&self, symbol: &str, days: u32) -> ExchangeResult<Vec<Candle>>;

    async fn fetch_order_book(&self, symbol: &str) -> ExchangeResult<OrderBook>;

    async fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> ExchangeResult<OrderResponse>;

    /// Market sell of `amount` base units. Liquidation mode only.
    async fn create_market_sell(
        &self,
        symbol: &str,
        amount: Decimal,
    ) -> ExchangeResult<OrderResponse>;
}

/// Accessor for the free KRW balance as of *now*, not as of the run's shared
/// snapshot. Buy sizing takes this instead of a snapshot so the mandatory
/// refresh cannot be skipped.
#[async_trait]
pub trait FreshKrw: Send + Sync {
    async fn free_krw(&self) -> ExchangeResult<Decimal>;
}
