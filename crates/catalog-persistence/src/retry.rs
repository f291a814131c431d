//! Bounded exponential backoff shared by the cache and search call sites.
//!
//! [`RetryPolicy::run`] is the only place retry logic lives: both the Redis
//! store and the Elasticsearch client wrap their I/O in it rather than
//! looping on their own.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::error::{PersistenceError, Result};

/// Retry configuration for transient I/O failures.
///
/// Delays grow as `initial_delay * 2^attempt`, capped at `max_delay`. The
/// policy stops at whichever comes first: `max_attempts` calls, or the next
/// sleep would carry the total wait past `max_elapsed`.
///
/// ```rust
/// # use catalog_persistence::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::new()
///     .max_attempts(4)
///     .initial_delay(Duration::from_millis(50))
///     .max_elapsed(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. Default: 5.
    pub max_attempts: u32,
    /// Delay before the first retry. Default: 100ms.
    pub initial_delay: Duration,
    /// Cap on a single delay. Default: 2s.
    pub max_delay: Duration,
    /// Cap on the total time spent sleeping between attempts. Default: 10s.
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            max_elapsed: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub const fn max_elapsed(mut self, limit: Duration) -> Self {
        self.max_elapsed = limit;
        self
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Run `f` until it succeeds, fails permanently, or the policy is spent.
    ///
    /// Only errors for which [`PersistenceError::is_transient`] holds are
    /// retried; anything else is returned immediately.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `f`.
    pub async fn run<F, Fut, T>(&self, operation: &str, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    attempt += 1;
                    let delay = self.delay_for_attempt(attempt - 1);
                    let spent = started.elapsed();
                    if attempt >= self.max_attempts || spent + delay > self.max_elapsed {
                        return Err(e);
                    }
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
