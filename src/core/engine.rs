// src/core/engine.rs
use crate::config::{buy_balance_margin, min_order_krw, SymbolConfig};
use crate::connectors::traits::{ExchangeResult, FreshKrw};
use crate::types::{Candle, Decision, MarketSnapshot, SkipReason};
use rust_decimal::Decimal;
use tracing::info;

/// The run's snapshot view of one base asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Holdings {
    pub free: Decimal,
    pub total: Decimal,
}

/// Arithmetic mean of the open prices. Callers guarantee a non-empty window.
pub fn average_open(candles: &[Candle]) -> Decimal {
    let sum = candles
        .iter()
        .fold(Decimal::ZERO, |acc, candle| acc + candle.open);
    sum / Decimal::from(candles.len() as u64)
}

/// Per-symbol rebalancing decision.
///
/// Business conditions never error; every non-buy, non-sell outcome is an
/// explicit `Skip` with its reason. The only await is the mandatory fresh
/// KRW lookup before sizing a buy, which can surface a gateway fault.
///
/// The buy condition (`last > avg_open × target_ratio`, ask present) is
/// checked strictly before the sell condition; trading exactly at target
/// falls into the sell branch.
pub async fn decide(
    cfg: &SymbolConfig,
    market: &MarketSnapshot,
    holdings: Holdings,
    portfolio_value: Decimal,
    krw: &dyn FreshKrw,
) -> ExchangeResult<Decision> {
    let (Some(candles), Some(ticker), Some(book)) =
        (&market.candles, &market.ticker, &market.order_book)
    else {
        return Ok(Decision::Skip(SkipReason::MissingData));
    };
    if candles.is_empty() {
        return Ok(Decision::Skip(SkipReason::MissingData));
    }

    // Mean over however many bars came back; a short window is not a skip.
    let avg_open = average_open(candles);
    let target_price = avg_open * cfg.target_ratio;
    info!(
        "[{}] {}-day average open: {avg_open} KRW | Current: {} KRW | Buy target: {target_price} KRW",
        cfg.symbol, cfg.avg_days, ticker.last
    );

    let current_valuation = holdings.total * ticker.last;

    if ticker.last > target_price {
        if let Some(best_ask) = book.best_ask {
            let target_valuation = portfolio_value * cfg.buy_ratio;
            let shortfall = target_valuation - current_valuation;

            if shortfall < min_order_krw() {
                return Ok(Decision::Skip(SkipReason::ShortfallBelowMinimum { shortfall }));
            }

            // The shared snapshot may be stale after earlier symbols spent
            // KRW; sizing always reads the balance as of now.
            let free_krw = krw.free_krw().await?;
            if free_krw < min_order_krw() {
                return Ok(Decision::Skip(SkipReason::InsufficientKrw { free: free_krw }));
            }

            let max_affordable = free_krw / best_ask * buy_balance_margin();
            let amount = (shortfall / best_ask).min(max_affordable);
            return Ok(Decision::Buy { amount, price: best_ask });
        }
    }

    if let Some(best_bid) = book.best_bid {
        if holdings.free > Decimal::ZERO {
            return Ok(Decision::Sell { amount: holdings.free, price: best_bid });
        }
        return Ok(Decision::Skip(SkipReason::NoHoldings));
    }

    Ok(Decision::Skip(SkipReason::NoLiquidity))
}
