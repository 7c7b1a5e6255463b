// src/connectors/upbit.rs
use crate::connectors::traits::{ExchangeClient, ExchangeError, ExchangeResult, FreshKrw};
use crate::config::RESERVE_ASSET;
use crate::types::{Balance, BalanceSnapshot, Candle, OrderBook, OrderResponse, Side, Ticker};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// REST client for the Upbit spot API.
///
/// Private endpoints are authenticated with a JWT (HS256) carrying a SHA512
/// hash of the urlencoded query. Symbols cross this boundary in "ETH/KRW"
/// form and are converted to Upbit's "KRW-ETH" wire codes here.
pub struct UpbitClient {
    access_key: String,
    secret_key: String,
    http_client: Client,
    base_rest_url: String,
    markets: HashSet<String>,
}

/// "ETH/KRW" -> "KRW-ETH".
fn market_code(symbol: &str) -> String {
    match symbol.split_once('/') {
        Some((base, quote)) => format!("{quote}-{base}"),
        None => symbol.to_string(),
    }
}

fn classify(status: StatusCode, body: String) -> ExchangeError {
    match status.as_u16() {
        429 => ExchangeError::RateLimited,
        401 | 403 => ExchangeError::Unauthorized(body),
        s => ExchangeError::Api { status: s, message: body },
    }
}

fn parse_decimal(s: &str) -> ExchangeResult<Decimal> {
    Decimal::from_str(s).map_err(|e| ExchangeError::Parse(format!("{s:?}: {e}")))
}

impl UpbitClient {
    pub fn new(access_key: String, secret_key: String) -> Self {
        Self {
            access_key,
            secret_key,
            http_client: Client::new(),
            base_rest_url: "https://api.upbit.com".to_string(),
            markets: HashSet::new(),
        }
    }

    fn auth_header(&self, query: Option<&str>) -> ExchangeResult<String> {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);

        let nonce = Uuid::new_v4().to_string();
        let payload = match query {
            Some(q) => {
                let mut hasher = Sha512::new();
                hasher.update(q.as_bytes());
                let query_hash = hex::encode(hasher.finalize());
                serde_json::json!({
                    "access_key": self.access_key,
                    "nonce": nonce,
                    "query_hash": query_hash,
                    "query_hash_alg": "SHA512",
                })
            }
            None => serde_json::json!({
                "access_key": self.access_key,
                "nonce": nonce,
            }),
        };
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&payload).map_err(|e| ExchangeError::Parse(e.to_string()))?,
        );

        let signing_input = format!("{header}.{payload}");
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|_| ExchangeError::Unauthorized("invalid secret key length".into()))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("Bearer {signing_input}.{signature}"))
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ExchangeError::Parse(e.to_string()))
    }

    async fn get_public<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = format!("{}{}", self.base_rest_url, endpoint);
        let response = self.http_client.get(&url).query(query).send().await?;
        Self::decode(response).await
    }

    async fn send_private<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> ExchangeResult<T> {
        let (url, auth) = if params.is_empty() {
            let url = format!("{}{}", self.base_rest_url, endpoint);
            (url, self.auth_header(None)?)
        } else {
            let query = serde_urlencoded::to_string(&params)
                .map_err(|e| ExchangeError::Parse(e.to_string()))?;
            let url = format!("{}{}?{}", self.base_rest_url, endpoint, query);
            (url, self.auth_header(Some(&query))?)
        };

        let response = self
            .http_client
            .request(method, &url)
            .header("Authorization", auth)
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[derive(Deserialize)]
struct UpbitAccount {
    currency: String,
    balance: String,
    locked: String,
}

#[derive(Deserialize)]
struct UpbitMarket {
    market: String,
}

#[derive(Deserialize)]
struct UpbitTicker {
    trade_price: Decimal,
    timestamp: u64,
}

#[derive(Deserialize)]
struct UpbitDayCandle {
    opening_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    trade_price: Decimal,
    candle_acc_trade_volume: Decimal,
}

#[derive(Deserialize)]
struct UpbitOrderbookUnit {
    ask_price: Decimal,
    bid_price: Decimal,
}

#[derive(Deserialize)]
struct UpbitOrderbook {
    orderbook_units: Vec<UpbitOrderbookUnit>,
}

#[derive(Deserialize)]
struct UpbitOrder {
    uuid: String,
    market: String,
    state: String,
}

#[async_trait]
impl ExchangeClient for UpbitClient {
    async fn load_markets(&mut self) -> ExchangeResult<()> {
        let resp: Vec<UpbitMarket> = self
            .get_public("/v1/market/all", &[("isDetails", "false".to_string())])
            .await?;
        self.markets = resp.into_iter().map(|m| m.market).collect();
        info!("[LOAD] {} tradable markets on Upbit", self.markets.len());
        Ok(())
    }

    fn has_market(&self, symbol: &str) -> bool {
        self.markets.contains(&market_code(symbol))
    }

    async fn fetch_balance(&self) -> ExchangeResult<BalanceSnapshot> {
        let resp: Vec<UpbitAccount> = self
            .send_private(Method::GET, "/v1/accounts", vec![])
            .await?;

        let mut balances = HashMap::new();
        for account in resp {
            let balance = Balance {
                free: parse_decimal(&account.balance)?,
                used: parse_decimal(&account.locked)?,
            };
            balances.insert(account.currency, balance);
        }
        Ok(BalanceSnapshot::new(balances))
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        let resp: Vec<UpbitTicker> = self
            .get_public("/v1/ticker", &[("markets", market_code(symbol))])
            .await?;
        let ticker = resp
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Parse(format!("empty ticker response for {symbol}")))?;

        Ok(Ticker {
            symbol: symbol.to_string(),
            last: ticker.trade_price,
            timestamp: ticker.timestamp,
        })
    }

    async fn fetch_ohlcv(&self, symbol: &str, days: u32) -> ExchangeResult<Vec<Candle>> {
        let resp: Vec<UpbitDayCandle> = self
            .get_public(
                "/v1/candles/days",
                &[
                    ("market", market_code(symbol)),
                    ("count", days.to_string()),
                ],
            )
            .await?;

        // Upbit serves newest first; callers expect oldest first.
        let mut candles: Vec<Candle> = resp
            .into_iter()
            .map(|c| Candle {
                open: c.opening_price,
                high: c.high_price,
                low: c.low_price,
                close: c.trade_price,
                volume: c.candle_acc_trade_volume,
            })
            .collect();
        candles.reverse();
        Ok(candles)
    }

    async fn fetch_order_book(&self, symbol: &str) -> ExchangeResult<OrderBook> {
        let resp: Vec<UpbitOrderbook> = self
            .get_public("/v1/orderbook", &[("markets", market_code(symbol))])
            .await?;
        let book = resp
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Parse(format!("empty orderbook for {symbol}")))?;

        // The first unit carries the best prices on both sides.
        let best = book.orderbook_units.first();
        Ok(OrderBook {
            best_ask: best.map(|u| u.ask_price),
            best_bid: best.map(|u| u.bid_price),
        })
    }

    async fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> ExchangeResult<OrderResponse> {
        let side_str = match side {
            Side::Buy => "bid",
            Side::Sell => "ask",
        };
        let params = vec![
            ("market", market_code(symbol)),
            ("side", side_str.to_string()),
            ("ord_type", "limit".to_string()),
            ("volume", amount.to_string()),
            ("price", price.to_string()),
        ];

        let resp: UpbitOrder = self.send_private(Method::POST, "/v1/orders", params).await?;
        Ok(OrderResponse {
            id: resp.uuid,
            symbol: resp.market,
            status: resp.state,
        })
    }

    async fn create_market_sell(
        &self,
        symbol: &str,
        amount: Decimal,
    ) -> ExchangeResult<OrderResponse> {
        let params = vec![
            ("market", market_code(symbol)),
            ("side", "ask".to_string()),
            ("ord_type", "market".to_string()),
            ("volume", amount.to_string()),
        ];

        let resp: UpbitOrder = self.send_private(Method::POST, "/v1/orders", params).await?;
        Ok(OrderResponse {
            id: resp.uuid,
            symbol: resp.market,
            status: resp.state,
        })
    }
}

#[async_trait]
impl FreshKrw for UpbitClient {
    async fn free_krw(&self) -> ExchangeResult<Decimal> {
        let snapshot = self.fetch_balance().await?;
        Ok(snapshot
            .asset(RESERVE_ASSET)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO))
    }
}
