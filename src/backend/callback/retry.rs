//! Bounded retry for storage writes
//!
//! The host's storage can refuse a write while someone else holds its
//! write lock. The policy retries only the errors the caller marks as
//! transient, sleeps between attempts, and hands back the last error
//! unchanged once the attempts run out.

use std::future::Future;
use std::time::Duration;

/// Delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Same interval before every retry
    Fixed { interval: Duration },
    /// Interval doubling per retry, capped at `max`
    Exponential { base: Duration, max: Duration },
}

impl BackoffStrategy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed { interval } => interval,
            Self::Exponential { base, max } => base
                .checked_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
                .unwrap_or(max)
                .min(max),
        }
    }
}

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    /// Four attempts, half a second apart
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff: BackoffStrategy::Fixed {
                interval: Duration::from_millis(500),
            },
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Fixed { interval },
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of
    /// attempts
    pub async fn run<T, E, F, Fut>(&self, mut operation: F, is_transient: impl Fn(&E) -> bool) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max_attempts && is_transient(&error) => {
                    let delay = self.backoff.delay(attempt);
                    tracing::debug!(
                        "[Track] Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt,
                        max_attempts,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
