// src/connectors/mock.rs
//
// Scriptable in-memory exchange for tests: fixed market data, per-endpoint
// fault injection (consumed FIFO), and a record of every placed order.

use crate::connectors::traits::{ExchangeClient, ExchangeError, ExchangeResult, FreshKrw};
use crate::types::{
    Balance, BalanceSnapshot, Candle, OrderBook, OrderResponse, Side, Ticker,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Mutex;

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn candle_with_open(open: i64) -> Candle {
    Candle {
        open: Decimal::from(open),
        high: Decimal::from(open),
        low: Decimal::from(open),
        close: Decimal::from(open),
        volume: Decimal::ONE,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacedOrder {
    Limit {
        symbol: String,
        side: Side,
        amount: Decimal,
        price: Decimal,
    },
    Market {
        symbol: String,
        amount: Decimal,
    },
}

#[derive(Default)]
pub struct MockExchange {
    markets: HashSet<String>,
    balances: HashMap<String, Balance>,
    tickers: HashMap<String, Decimal>,
    candles: HashMap<String, Vec<Candle>>,
    books: HashMap<String, OrderBook>,
    fresh_krw: Decimal,
    ticker_faults: Mutex<HashMap<String, Vec<ExchangeError>>>,
    ohlcv_faults: Mutex<HashMap<String, Vec<ExchangeError>>>,
    order_faults: Mutex<Vec<ExchangeError>>,
    placed: Mutex<Vec<PlacedOrder>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(mut self, symbol: &str) -> Self {
        self.markets.insert(symbol.to_string());
        self
    }

    pub fn with_balance(mut self, asset: &str, free: &str, used: &str) -> Self {
        self.balances
            .insert(asset.to_string(), Balance { free: d(free), used: d(used) });
        self
    }

    pub fn with_ticker(mut self, symbol: &str, last: &str) -> Self {
        self.tickers.insert(symbol.to_string(), d(last));
        self
    }

    pub fn with_opens(mut self, symbol: &str, opens: &[i64]) -> Self {
        let candles = opens.iter().copied().map(candle_with_open).collect();
        self.candles.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_book(mut self, symbol: &str, ask: Option<&str>, bid: Option<&str>) -> Self {
        self.books.insert(
            symbol.to_string(),
            OrderBook { best_ask: ask.map(d), best_bid: bid.map(d) },
        );
        self
    }

    pub fn with_fresh_krw(mut self, free: &str) -> Self {
        self.fresh_krw = d(free);
        self
    }

    pub fn fail_ticker(self, symbol: &str, err: ExchangeError) -> Self {
        self.ticker_faults
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push(err);
        self
    }

    pub fn fail_ohlcv(self, symbol: &str, err: ExchangeError) -> Self {
        self.ohlcv_faults
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push(err);
        self
    }

    pub fn fail_next_order(self, err: ExchangeError) -> Self {
        self.order_faults.lock().unwrap().push(err);
        self
    }

    pub fn placed(&self) -> Vec<PlacedOrder> {
        self.placed.lock().unwrap().clone()
    }

    fn pop_fault(
        queue: &Mutex<HashMap<String, Vec<ExchangeError>>>,
        symbol: &str,
    ) -> Option<ExchangeError> {
        let mut queue = queue.lock().unwrap();
        let faults = queue.get_mut(symbol)?;
        if faults.is_empty() {
            None
        } else {
            Some(faults.remove(0))
        }
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    async fn load_markets(&mut self) -> ExchangeResult<()> {
        Ok(())
    }

    fn has_market(&self, symbol: &str) -> bool {
        self.markets.contains(symbol)
    }

    async fn fetch_balance(&self) -> ExchangeResult<BalanceSnapshot> {
        Ok(BalanceSnapshot::new(self.balances.clone()))
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        if let Some(err) = Self::pop_fault(&self.ticker_faults, symbol) {
            return Err(err);
        }
        let last = self.tickers.get(symbol).ok_or(ExchangeError::Api {
            status: 404,
            message: format!("no ticker for {symbol}"),
        })?;
        Ok(Ticker { symbol: symbol.to_string(), last: *last, timestamp: 0 })
    }

    async fn fetch_ohlcv(&self, symbol: &str, days: u32) -> ExchangeResult<Vec<Candle>> {
        if let Some(err) = Self::pop_fault(&self.ohlcv_faults, symbol) {
            return Err(err);
        }
        let candles = self.candles.get(symbol).cloned().unwrap_or_default();
        let keep = candles.len().min(days as usize);
        Ok(candles[candles.len() - keep..].to_vec())
    }

    async fn fetch_order_book(&self, symbol: &str) -> ExchangeResult<OrderBook> {
        Ok(self.books.get(symbol).cloned().unwrap_or_default())
    }

    async fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> ExchangeResult<OrderResponse> {
        let mut faults = self.order_faults.lock().unwrap();
        if !faults.is_empty() {
            return Err(faults.remove(0));
        }
        drop(faults);

        self.placed.lock().unwrap().push(PlacedOrder::Limit {
            symbol: symbol.to_string(),
            side,
            amount,
            price,
        });
        Ok(OrderResponse {
            id: format!("order-{}", self.placed.lock().unwrap().len()),
            symbol: symbol.to_string(),
            status: "wait".to_string(),
        })
    }

    async fn create_market_sell(
        &self,
        symbol: &str,
        amount: Decimal,
    ) -> ExchangeResult<OrderResponse> {
        let mut faults = self.order_faults.lock().unwrap();
        if !faults.is_empty() {
            return Err(faults.remove(0));
        }
        drop(faults);

        self.placed.lock().unwrap().push(PlacedOrder::Market {
            symbol: symbol.to_string(),
            amount,
        });
        Ok(OrderResponse {
            id: format!("order-{}", self.placed.lock().unwrap().len()),
            symbol: symbol.to_string(),
            status: "done".to_string(),
        })
    }
}

#[async_trait]
impl FreshKrw for MockExchange {
    async fn free_krw(&self) -> ExchangeResult<Decimal> {
        Ok(self.fresh_krw)
    }
}
