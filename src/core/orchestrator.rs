// src/core/orchestrator.rs
use crate::config::SymbolConfig;
use crate::connectors::traits::{ExchangeClient, ExchangeError, ExchangeResult, FreshKrw};
use crate::core::engine::{self, Holdings};
use crate::core::executor;
use crate::core::pacing::{with_rate_limit_retry, Pacer};
use crate::core::valuator;
use crate::storage;
use crate::types::{base_asset, BalanceSnapshot, MarketSnapshot};
use anyhow::Context;
use chrono::Local;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{error, info, warn};

/// One full rebalancing pass: value the account, record the valuation, then
/// walk the symbol list sequentially. Per-symbol faults are isolated — a
/// degraded pass beats an aborted one. The completion line always logs,
/// however the loop ended.
pub async fn run<C>(
    client: &C,
    symbols: &[SymbolConfig],
    pacer: &Pacer,
    valuation_path: &Path,
) -> anyhow::Result<()>
where
    C: ExchangeClient + FreshKrw,
{
    let result = run_pass(client, symbols, pacer, valuation_path).await;
    info!("[END] Trading bot finished execution.");
    result
}

async fn run_pass<C>(
    client: &C,
    symbols: &[SymbolConfig],
    pacer: &Pacer,
    valuation_path: &Path,
) -> anyhow::Result<()>
where
    C: ExchangeClient + FreshKrw,
{
    // One snapshot for the whole run. Only buy sizing re-reads the live
    // balance, through the FreshKrw accessor.
    let snapshot = client
        .fetch_balance()
        .await
        .context("failed to fetch account balance")?;

    let portfolio_value = valuator::value_portfolio(client, &snapshot, pacer)
        .await
        .context("portfolio valuation failed")?;
    info!("[BALANCE] Total portfolio value: {} KRW (KRW + all coins)", portfolio_value.round());

    let date_str = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if let Err(e) = storage::append_valuation(valuation_path, &date_str, portfolio_value) {
        warn!("[VALUATION] Could not record valuation: {e}");
    }

    for cfg in symbols {
        match process_symbol(client, cfg, &snapshot, portfolio_value, pacer).await {
            Ok(()) => {}
            Err(ExchangeError::RateLimited) => {
                warn!(
                    "[RATE-LIMIT] {} still throttled after retry. Moving to next symbol.",
                    cfg.symbol
                );
            }
            Err(e) => error!("[{}] ERROR: {e}", cfg.symbol),
        }
    }

    Ok(())
}

async fn process_symbol<C>(
    client: &C,
    cfg: &SymbolConfig,
    snapshot: &BalanceSnapshot,
    portfolio_value: Decimal,
    pacer: &Pacer,
) -> ExchangeResult<()>
where
    C: ExchangeClient + FreshKrw,
{
    let market = fetch_market_snapshot(client, cfg, pacer).await?;

    let holdings = snapshot
        .asset(base_asset(&cfg.symbol))
        .map(|b| Holdings { free: b.free, total: b.total() })
        .unwrap_or_default();

    let decision = engine::decide(cfg, &market, holdings, portfolio_value, client).await?;

    // A throttled placement never reached the exchange, so one resubmission
    // after the fixed pause cannot duplicate the order.
    with_rate_limit_retry(pacer, || executor::execute(client, &cfg.symbol, &decision)).await
}

/// Gathers candles, ticker, and order book for one symbol. Rate-limit faults
/// propagate (pause-and-retry already spent); any other fetch fault leaves
/// that field empty so the engine skips the symbol as missing data.
async fn fetch_market_snapshot<C: ExchangeClient>(
    client: &C,
    cfg: &SymbolConfig,
    pacer: &Pacer,
) -> ExchangeResult<MarketSnapshot> {
    let symbol = cfg.symbol.as_str();

    let candles =
        match with_rate_limit_retry(pacer, || client.fetch_ohlcv(symbol, cfg.avg_days)).await {
            Ok(candles) => Some(candles),
            Err(ExchangeError::RateLimited) => return Err(ExchangeError::RateLimited),
            Err(e) => {
                warn!("[{symbol}] OHLCV unavailable: {e}");
                None
            }
        };
    pacer.breathe().await;

    let ticker = match with_rate_limit_retry(pacer, || client.fetch_ticker(symbol)).await {
        Ok(ticker) => Some(ticker),
        Err(ExchangeError::RateLimited) => return Err(ExchangeError::RateLimited),
        Err(e) => {
            warn!("[{symbol}] Ticker unavailable: {e}");
            None
        }
    };
    pacer.breathe().await;

    let order_book = match with_rate_limit_retry(pacer, || client.fetch_order_book(symbol)).await {
        Ok(book) => Some(book),
        Err(ExchangeError::RateLimited) => return Err(ExchangeError::RateLimited),
        Err(e) => {
            warn!("[{symbol}] Order book unavailable: {e}");
            None
        }
    };
    pacer.breathe().await;

    Ok(MarketSnapshot { candles, ticker, order_book })
}
