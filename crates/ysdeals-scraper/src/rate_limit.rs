//! Per-source politeness: a GCRA token bucket plus retry with exponential
//! backoff and jitter.
//!
//! Every attempt, including each retry, waits for a limiter permit before the
//! adapter is invoked, so a retry storm can never exceed the source's quota.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use ysdeals_core::{ConfigError, SourcePolicy};

use crate::error::FetchError;

/// Token bucket admitting up to `burst` requests, refilling at
/// `requests_per_minute / 60` per second. Callers over the limit wait.
pub struct SourceLimiter {
    source_id: String,
    limiter: DefaultDirectRateLimiter,
}

impl SourceLimiter {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the rate or burst is zero.
    pub fn new(source_id: &str, policy: &SourcePolicy) -> Result<Self, ConfigError> {
        let rpm = NonZeroU32::new(policy.requests_per_minute).ok_or_else(|| {
            ConfigError::Validation(format!(
                "source '{source_id}' requests_per_minute must be at least 1"
            ))
        })?;
        let burst = NonZeroU32::new(policy.burst).ok_or_else(|| {
            ConfigError::Validation(format!("source '{source_id}' burst must be at least 1"))
        })?;
        let quota = Quota::per_minute(rpm).allow_burst(burst);
        Ok(Self {
            source_id: source_id.to_string(),
            limiter: RateLimiter::direct(quota),
        })
    }

    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Suspends until a token is available. Never drops the call.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Takes a token if one is available right now.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

/// Delay before retry number `retry` (0-based).
///
/// `base_ms * 2^retry`, capped at `max`, scaled by `jitter`. A server-supplied
/// `retry_after` raises the delay to at least that value, still capped.
pub(crate) fn backoff_delay(
    base_ms: u64,
    retry: u32,
    max: Duration,
    retry_after: Option<Duration>,
    jitter: f64,
) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    let computed = base_ms.saturating_mul(1u64 << retry.min(62)).min(max_ms);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = Duration::from_millis((computed as f64 * jitter) as u64);
    match retry_after {
        Some(after) => jittered.max(after).min(max),
        None => jittered,
    }
}

/// Uniform in `[0.75, 1.25)`.
fn jitter() -> f64 {
    rand::random::<f64>() * 0.5 + 0.75
}

/// Runs `operation` under `limiter`, retrying transient failures up to
/// `policy.max_retries` times.
///
/// `attempts` is incremented before every invocation so an observer can read
/// progress even if this future is dropped mid-flight.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once retries are
/// exhausted.
pub async fn retry_with_backoff<T, F, Fut>(
    limiter: &SourceLimiter,
    policy: &SourcePolicy,
    max_backoff: Duration,
    attempts: &AtomicU32,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut retry = 0u32;
    loop {
        limiter.acquire().await;
        attempts.fetch_add(1, Ordering::SeqCst);

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_retryable() || retry >= policy.max_retries {
            return Err(err);
        }

        let delay = backoff_delay(
            policy.base_backoff_ms,
            retry,
            max_backoff,
            err.retry_after(),
            jitter(),
        );
        tracing::warn!(
            source = %limiter.source_id(),
            attempt = retry + 1,
            max_retries = policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}
