//! Retry policy for queued operations.
//!
//! Bounds the replay of failing operations: each failure bumps the
//! operation's attempt count and schedules its next eligibility from the
//! backoff strategy; operations that exhaust the budget move to the
//! dead-letter sink instead of retrying forever.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Delay schedule between replay attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Retry on every drain cycle with no delay.
    None,
    /// Fixed delay between attempts.
    Fixed { delay_secs: u64 },
    /// Doubling delay starting at `base_secs`, capped at `cap_secs`.
    Exponential { base_secs: u64, cap_secs: u64 },
}

impl BackoffStrategy {
    /// Delay to apply after the given number of failed attempts.
    pub fn delay_after(&self, attempts: u32) -> Option<Duration> {
        match *self {
            BackoffStrategy::None => None,
            BackoffStrategy::Fixed { delay_secs } => Some(Duration::seconds(delay_secs as i64)),
            BackoffStrategy::Exponential {
                base_secs,
                cap_secs,
            } => {
                let exp = attempts.saturating_sub(1).min(16);
                let secs = base_secs.saturating_mul(1u64 << exp).min(cap_secs);
                Some(Duration::seconds(secs as i64))
            }
        }
    }
}

/// Bounded-retry policy for the offline queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts allowed before an operation is dead-lettered.
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: BackoffStrategy::Exponential {
                base_secs: 30,
                cap_secs: 900,
            },
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately and never gives up an operation
    /// before `max_attempts`.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::None,
        }
    }

    /// True once an operation has used its full attempt budget.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    /// Next instant a failed operation becomes eligible again.
    pub fn next_eligible(&self, attempts: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.backoff.delay_after(attempts).map(|d| now + d)
    }
}
