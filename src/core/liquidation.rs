// src/core/liquidation.rs
use crate::config::{EXEMPT_ASSET, RESERVE_ASSET};
use crate::connectors::traits::{ExchangeClient, ExchangeResult};
use crate::core::pacing::Pacer;
use crate::logging::TRADE_TARGET;
use crate::types::krw_market;
use rust_decimal::Decimal;
use tracing::{error, info};

/// Emergency mode: market-sells the entire free balance of every asset
/// except the reserve currency and the exempt store-of-value asset.
/// Allocation targets are ignored. Each sell is independent; a failed order
/// is reported and the rest still go out. The inter-order delay is pacing
/// only, not ordering.
pub async fn sell_all_assets<C: ExchangeClient>(client: &C, pacer: &Pacer) -> ExchangeResult<()> {
    let snapshot = client.fetch_balance().await?;

    for (asset, balance) in snapshot.assets() {
        if asset == RESERVE_ASSET || asset == EXEMPT_ASSET {
            continue;
        }
        if balance.free <= Decimal::ZERO {
            continue;
        }
        let symbol = krw_market(asset);
        if !client.has_market(&symbol) {
            continue;
        }

        let amount = balance.free;
        info!("[SELL-ALL] Market sell order: {amount} {symbol} (ALL holdings)");
        match client.create_market_sell(&symbol, amount).await {
            Ok(_) => {
                info!(
                    target: TRADE_TARGET,
                    "[SELL-ALL] SUCCESS: Sold {amount} {symbol} at market price"
                );
            }
            Err(e) => {
                error!(
                    target: TRADE_TARGET,
                    "[SELL-ALL] ERROR: Could not sell {symbol} - {e}"
                );
            }
        }
        pacer.breathe().await;
    }

    Ok(())
}
