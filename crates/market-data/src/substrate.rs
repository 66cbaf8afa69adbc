//! Cross-cutting collector substrate: a process-wide circuit breaker per
//! upstream and an optional Redis-compatible cache.
//! Both collector families (fundamentals, technical) wrap a
//! [`PolygonClient`](crate::polygon::PolygonClient) with this substrate
//! rather than calling it directly.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
const CIRCUIT_COOLDOWN_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Counts consecutive failures; opens after [`CIRCUIT_FAILURE_THRESHOLD`]
/// and rejects requests for [`CIRCUIT_COOLDOWN_SECS`]; a successful call in
/// the half-open state resets it.
pub struct CircuitBreaker {
    consecutive_failures: AtomicU32,
    opened_at: AtomicU64,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self { consecutive_failures: AtomicU32::new(0), opened_at: AtomicU64::new(0) }
    }
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CircuitState {
        let opened_at = self.opened_at.load(Ordering::SeqCst);
        if opened_at == 0 {
            return CircuitState::Closed;
        }
        if now_secs().saturating_sub(opened_at) >= CIRCUIT_COOLDOWN_SECS {
            CircuitState::HalfOpen
        } else {
            CircuitState::Open
        }
    }

    /// Returns `true` if a call may proceed; `false` if the breaker is open
    /// and the cooldown has not yet elapsed.
    pub fn allow(&self) -> bool {
        !matches!(self.state(), CircuitState::Open)
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.opened_at.store(0, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= CIRCUIT_FAILURE_THRESHOLD {
            self.opened_at.store(now_secs(), Ordering::SeqCst);
        }
    }
}

/// Redis-compatible cache, keyed `kind:symbol:today:period`. Absence (no
/// `REDIS_URL`) degrades silently to direct fetch: every caller treats a
/// cache miss and a disabled cache identically.
#[derive(Clone)]
pub struct Cache {
    manager: Option<Arc<tokio::sync::Mutex<redis::aio::ConnectionManager>>>,
}

impl Cache {
    pub async fn from_env() -> Self {
        match std::env::var("REDIS_URL") {
            Ok(url) => match redis::Client::open(url) {
                Ok(client) => match client.get_connection_manager().await {
                    Ok(manager) => Self { manager: Some(Arc::new(tokio::sync::Mutex::new(manager))) },
                    Err(e) => {
                        tracing::warn!("market-data cache disabled: {e}");
                        Self { manager: None }
                    }
                },
                Err(e) => {
                    tracing::warn!("market-data cache disabled: {e}");
                    Self { manager: None }
                }
            },
            Err(_) => Self { manager: None },
        }
    }

    pub fn disabled() -> Self {
        Self { manager: None }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let manager = self.manager.as_ref()?;
        let mut conn = manager.lock().await;
        redis::AsyncCommands::get(&mut *conn, key).await.ok()
    }

    pub async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) {
        let Some(manager) = self.manager.as_ref() else { return };
        let mut conn = manager.lock().await;
        let _: Result<(), redis::RedisError> =
            redis::AsyncCommands::set_ex(&mut *conn, key, value, ttl_secs).await;
    }
}

pub const FUNDAMENTALS_TTL_SECS: u64 = 90 * 24 * 60 * 60;
pub const INDICATORS_TTL_SECS: u64 = 24 * 60 * 60;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_opens_after_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new();
        for _ in 0..CIRCUIT_FAILURE_THRESHOLD {
            assert!(breaker.allow());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow());
    }

    #[test]
    fn circuit_resets_on_success() {
        let breaker = CircuitBreaker::new();
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
