// src/config.rs

use anyhow::Context;
use config::{Config, ConfigError, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Upbit's practical minimum order size in KRW. Shortfalls and free-KRW
/// checks below this are skipped rather than submitted.
pub const MIN_ORDER_KRW: i64 = 5000;

/// Fraction of free KRW a buy may commit, reserving margin against
/// price/fee slippage between sizing and execution.
pub const BUY_BALANCE_MARGIN_PCT: i64 = 99;

/// Settlement currency. Never traded, never liquidated.
pub const RESERVE_ASSET: &str = "KRW";

/// Store-of-value asset exempted from liquidation mode.
pub const EXEMPT_ASSET: &str = "BTC";

pub fn min_order_krw() -> Decimal {
    Decimal::from(MIN_ORDER_KRW)
}

pub fn buy_balance_margin() -> Decimal {
    Decimal::new(BUY_BALANCE_MARGIN_PCT, 2)
}

#[derive(Debug, Deserialize, Clone)]
pub struct PacingConfig {
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub rate_limit_pause_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub access_key: String,
    pub secret_key: String,
    pub symbols_csv: String,
    pub valuation_csv: String,
    pub pacing: PacingConfig,
}

impl AppConfig {
    /// `required` marks the settings file as mandatory: an explicitly given
    /// path that does not exist is a startup fault, while the implicit
    /// default may be absent (keys then come from the environment).
    pub fn new(settings_path: &str, required: bool) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("symbols_csv", "symbols.csv")?
            .set_default("valuation_csv", "portfolio_valuation.csv")?
            .set_default("pacing.jitter_min_ms", 100u64)?
            .set_default("pacing.jitter_max_ms", 200u64)?
            .set_default("pacing.rate_limit_pause_ms", 1000u64)?
            .add_source(File::with_name(settings_path).required(required))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

/// One row of the symbol table. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolConfig {
    pub symbol: String,
    pub avg_days: u32,
    pub target_ratio: Decimal,
    pub buy_ratio: Decimal,
}

/// Loads the per-pair trading parameters. A malformed row is a fatal
/// load-time error; no trading happens on a partially read table.
pub fn load_symbols(path: &Path) -> anyhow::Result<Vec<SymbolConfig>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open symbol table {}", path.display()))?;

    let mut symbols = Vec::new();
    for row in reader.deserialize() {
        let cfg: SymbolConfig =
            row.with_context(|| format!("malformed row in {}", path.display()))?;
        symbols.push(cfg);
    }
    Ok(symbols)
}
