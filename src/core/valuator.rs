// src/core/valuator.rs
use crate::config::RESERVE_ASSET;
use crate::connectors::traits::{ExchangeClient, ExchangeError, ExchangeResult};
use crate::core::pacing::{with_rate_limit_retry, Pacer};
use crate::types::{krw_market, BalanceSnapshot};
use rust_decimal::Decimal;
use tracing::warn;

/// Values the whole account in KRW: KRW free+used, plus `total × last` for
/// every other held asset that has a KRW market. Assets without a KRW market
/// are excluded with a log line, never an error. An asset whose price lookup
/// stays rate-limited after one retry is excluded the same way; the
/// valuation degrades instead of aborting.
pub async fn value_portfolio<C: ExchangeClient>(
    client: &C,
    snapshot: &BalanceSnapshot,
    pacer: &Pacer,
) -> ExchangeResult<Decimal> {
    let mut total = snapshot
        .asset(RESERVE_ASSET)
        .map(|b| b.total())
        .unwrap_or(Decimal::ZERO);

    for (asset, balance) in snapshot.assets() {
        if asset == RESERVE_ASSET || balance.total().is_zero() {
            continue;
        }
        let symbol = krw_market(asset);
        if !client.has_market(&symbol) {
            warn!("[SKIP] Market {symbol} does not exist on Upbit. Excluded from valuation.");
            continue;
        }

        let ticker = match with_rate_limit_retry(pacer, || client.fetch_ticker(&symbol)).await {
            Ok(ticker) => ticker,
            Err(ExchangeError::RateLimited) => {
                warn!("[RATE-LIMIT] {symbol} still throttled after retry. Excluded from valuation.");
                continue;
            }
            Err(e) => return Err(e),
        };
        total += balance.total() * ticker.last;
        pacer.breathe().await;
    }

    Ok(total)
}
