//! Retry policy with exponential backoff for result page fetches.
//!
//! The default policy makes a single attempt, matching the soft-fail
//! behaviour of the harvester: a failed page contributes no records and the
//! worker moves on. Raising `max_attempts` retries transient failures
//! (see [`FetchError::is_transient`]) before giving up on the page.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::transport::FetchError;

/// Default number of attempts per page (no retry).
pub const DEFAULT_PAGE_ATTEMPTS: u32 = 1;

/// Default base delay for exponential backoff (1 second).
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap (32 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Upper bound of the random jitter added to non-zero delays.
const MAX_JITTER_MS: u64 = 500;

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed).
        attempt: u32,
    },

    /// Give up on this page.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Configuration for page fetch retries.
///
/// Delays follow `min(base_delay * 2^(attempt-1), max_delay) + jitter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_PAGE_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Creates a policy with a custom attempt count and default delays.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Decides whether to retry after `attempt` (1-indexed) failed with `error`.
    #[must_use]
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);
        debug!(attempt, delay_ms = delay.as_millis(), "will retry page fetch");
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if delay.is_zero() {
            return delay;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
        delay + Duration::from_millis(jitter_ms)
    }
}
