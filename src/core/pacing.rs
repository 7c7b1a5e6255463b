// src/core/pacing.rs
//
// Rate-limit policy, decoupled from business logic. Two behaviors:
// a jittered courtesy delay after gateway calls, and a fixed pause when the
// gateway reports throttling. `Pacer::zero()` lets tests run with no delay.

use crate::config::PacingConfig;
use crate::connectors::traits::{ExchangeError, ExchangeResult};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub struct Pacer {
    jitter_min: Duration,
    jitter_max: Duration,
    rate_limit_pause: Duration,
}

impl Pacer {
    pub fn new(cfg: &PacingConfig) -> Self {
        Self {
            jitter_min: Duration::from_millis(cfg.jitter_min_ms),
            jitter_max: Duration::from_millis(cfg.jitter_max_ms.max(cfg.jitter_min_ms)),
            rate_limit_pause: Duration::from_millis(cfg.rate_limit_pause_ms),
        }
    }

    pub fn zero() -> Self {
        Self {
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
            rate_limit_pause: Duration::ZERO,
        }
    }

    /// Courtesy delay after an external call. No ordering guarantee beyond
    /// "the next call happens no earlier than this".
    pub async fn breathe(&self) {
        if self.jitter_max.is_zero() {
            return;
        }
        let span_ms = (self.jitter_max - self.jitter_min).as_millis() as u64;
        let extra_ms = if span_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=span_ms)
        };
        tokio::time::sleep(self.jitter_min + Duration::from_millis(extra_ms)).await;
    }

    /// Fixed pause after a rate-limit fault.
    pub async fn pause(&self) {
        if !self.rate_limit_pause.is_zero() {
            tokio::time::sleep(self.rate_limit_pause).await;
        }
    }
}

/// Runs one unit of work; on a rate-limit fault, pauses once and retries
/// once. A second rate-limit fault is returned to the caller, which abandons
/// the unit and moves on. No bounded backoff loop.
pub async fn with_rate_limit_retry<T, F, Fut>(pacer: &Pacer, mut op: F) -> ExchangeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ExchangeResult<T>>,
{
    match op().await {
        Err(ExchangeError::RateLimited) => {
            warn!("[RATE-LIMIT] Rate limit exceeded. Waiting before retry...");
            pacer.pause().await;
            op().await
        }
        other => other,
    }
}
