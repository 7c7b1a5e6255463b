// src/types.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    /// Last traded price in KRW.
    pub last: Decimal,
    pub timestamp: u64,
}

/// One daily OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Top of book only. The connector owns which end of the raw book is "best".
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    pub best_ask: Option<Decimal>,
    pub best_bid: Option<Decimal>,
}

/// Free/used balance of a single asset.
#[derive(Debug, Clone, Default)]
pub struct Balance {
    pub free: Decimal,
    pub used: Decimal,
}

impl Balance {
    pub fn total(&self) -> Decimal {
        self.free + self.used
    }
}

/// Account balances keyed by asset code, taken at one instant.
///
/// Shared read-only across a whole run. Buy sizing must never read KRW from
/// here (earlier orders in the same run make it stale); it goes through a
/// `FreshKrw` accessor instead.
#[derive(Debug, Clone, Default)]
pub struct BalanceSnapshot(HashMap<String, Balance>);

impl BalanceSnapshot {
    pub fn new(balances: HashMap<String, Balance>) -> Self {
        Self(balances)
    }

    pub fn asset(&self, code: &str) -> Option<&Balance> {
        self.0.get(code)
    }

    pub fn assets(&self) -> impl Iterator<Item = (&String, &Balance)> {
        self.0.iter()
    }
}

/// Everything fetched for one symbol in one pass. `None` means the fetch
/// failed; the decision engine turns that into a missing-data skip.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub candles: Option<Vec<Candle>>,
    pub ticker: Option<Ticker>,
    pub order_book: Option<OrderBook>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingData,
    ShortfallBelowMinimum { shortfall: Decimal },
    InsufficientKrw { free: Decimal },
    NoHoldings,
    NoLiquidity,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingData => write!(f, "missing OHLCV/ticker/orderbook data"),
            SkipReason::ShortfallBelowMinimum { shortfall } => {
                write!(f, "shortfall ({shortfall} KRW) below minimum order threshold")
            }
            SkipReason::InsufficientKrw { free } => {
                write!(f, "not enough KRW (available: {free} KRW)")
            }
            SkipReason::NoHoldings => write!(f, "no holdings to sell"),
            SkipReason::NoLiquidity => write!(f, "no liquidity on either side of the book"),
        }
    }
}

/// Outcome of the per-symbol decision engine. Derived per pass, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Buy { amount: Decimal, price: Decimal },
    Sell { amount: Decimal, price: Decimal },
    Skip(SkipReason),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub symbol: String,
    pub status: String,
}

/// "ETH/KRW" -> "ETH". Symbols are always quoted in KRW.
pub fn base_asset(symbol: &str) -> &str {
    symbol.split('/').next().unwrap_or(symbol)
}

/// "ETH" -> "ETH/KRW".
pub fn krw_market(asset: &str) -> String {
    format!("{asset}/KRW")
}
