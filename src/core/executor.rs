// src/core/executor.rs
use crate::connectors::traits::{ExchangeClient, ExchangeError, ExchangeResult};
use crate::logging::TRADE_TARGET;
use crate::types::{Decision, Side};
use tracing::{error, info};

/// Submits a decided order as a limit order at the computed price.
///
/// Success and failure both land on the trade log. A rate-limit fault is
/// handed back for the orchestrator's pause policy; any other placement
/// fault is reported and the order abandoned for this run — blind retries
/// of a limit order risk duplicates.
pub async fn execute<C: ExchangeClient>(
    client: &C,
    symbol: &str,
    decision: &Decision,
) -> ExchangeResult<()> {
    let (side, amount, price) = match decision {
        Decision::Buy { amount, price } => (Side::Buy, *amount, *price),
        Decision::Sell { amount, price } => (Side::Sell, *amount, *price),
        Decision::Skip(reason) => {
            info!("[{symbol}] SKIP: {reason}");
            return Ok(());
        }
    };

    info!("[{symbol}] {}: Placing limit order for {amount} at {price} KRW", side.as_str());
    match client.create_limit_order(symbol, side, amount, price).await {
        Ok(order) => {
            info!(
                target: TRADE_TARGET,
                "[{symbol}] {} SUCCESS: Limit order {} placed for {amount} at {price} KRW",
                side.as_str(),
                order.id
            );
            Ok(())
        }
        Err(ExchangeError::RateLimited) => Err(ExchangeError::RateLimited),
        Err(e) => {
            error!(
                target: TRADE_TARGET,
                "[{symbol}] {} ERROR: Failed to place order - {e}",
                side.as_str()
            );
            Ok(())
        }
    }
}
