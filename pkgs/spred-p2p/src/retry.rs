//! Retry schedules for bridge operations.
//!
//! Each flaky flow (discovery, send, receive) owns a policy describing how
//! many retries it gets and how long to back off before each one. Keeping
//! the schedule as data lets tests assert on it without driving a bridge.

use std::time::Duration;

/// Backoff between a failed attempt and its retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed(Duration),
    /// `base + step * retries_so_far`.
    Linear { base: Duration, step: Duration },
}

/// A retry schedule: how many retries after the first attempt, and the
/// delay before each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn linear(max_retries: u32, base: Duration, step: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Linear { base, step },
        }
    }

    /// Whether another retry is allowed after `retries_so_far` retries.
    pub fn allows_retry(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }

    /// Delay to sleep before retry number `retries_so_far + 1`.
    pub fn delay_for(&self, retries_so_far: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Linear { base, step } => base + step * retries_so_far,
        }
    }
}
