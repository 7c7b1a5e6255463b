// src/logging.rs
//
// Two sinks: everything to stdout (filtered by RUST_LOG, default info), and a
// durable trade log receiving only events emitted with target `TRADE_TARGET`
// (orders placed, succeeded, failed). Routing by target replaces ad hoc
// per-call handler metadata.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Event target for trade-affecting events. Routed to `trade_logs.log`.
pub const TRADE_TARGET: &str = "trade";

/// Must be held for the lifetime of the process; dropping it loses buffered
/// trade-log lines.
pub struct LogGuard {
    _trade_file: WorkerGuard,
}

pub fn init() -> LogGuard {
    let appender = tracing_appender::rolling::never(".", "trade_logs.log");
    let (trade_writer, guard) = tracing_appender::non_blocking(appender);

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let trade_layer = fmt::layer()
        .with_writer(trade_writer)
        .with_ansi(false)
        .with_filter(filter_fn(|meta| meta.target() == TRADE_TARGET));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(trade_layer)
        .init();

    LogGuard { _trade_file: guard }
}
