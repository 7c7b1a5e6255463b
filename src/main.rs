// src/main.rs
use crate::config::AppConfig;
use crate::connectors::traits::ExchangeClient;
use crate::connectors::upbit::UpbitClient;
use crate::core::liquidation;
use crate::core::orchestrator;
use crate::core::pacing::Pacer;
use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use std::path::Path;
use tracing::info;

mod config;
mod connectors;
mod core;
mod logging;
mod storage;
mod types;

#[derive(Debug, Parser)]
#[command(name = "rebalancer", about = "Periodic KRW portfolio rebalancer for Upbit")]
struct Cli {
    /// Sell all coins (except KRW and BTC) at market price and exit
    #[arg(long)]
    sell_all: bool,

    /// Settings file (TOML; defaults to ./Settings, which may be absent)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init();

    info!("{}", "*".repeat(100));
    info!("[START] Trading bot is starting up.");

    // Any startup fault below aborts before a single order goes out. An
    // explicitly passed settings path must exist; the default may not.
    let app = match &cli.config {
        Some(path) => AppConfig::new(path, true),
        None => AppConfig::new("Settings", false),
    }
    .context("failed to load configuration")?;
    let pacer = Pacer::new(&app.pacing);

    let mut client = UpbitClient::new(app.access_key.clone(), app.secret_key.clone());
    client
        .load_markets()
        .await
        .context("failed to load the Upbit market list")?;

    if cli.sell_all {
        info!("[MODE] Sell-all mode activated. Selling all assets except KRW and BTC.");
        liquidation::sell_all_assets(&client, &pacer).await?;
        info!("[EXIT] All assets have been sold. Bot is exiting.");
        return Ok(());
    }

    info!("[LOAD] Loading trading symbols and parameters from CSV: {}", app.symbols_csv);
    let symbols = config::load_symbols(Path::new(&app.symbols_csv))?;

    orchestrator::run(&client, &symbols, &pacer, Path::new(&app.valuation_csv)).await
}
