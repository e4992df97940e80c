//! Bounded Polling
//!
//! Synchronous initialization paths (chip reset) busy-poll a status bit. This
//! module bounds every such loop by an explicit [`PollTimeout`] so a stuck
//! chip surfaces as an error instead of a hang.

use embedded_hal::delay::DelayNs;

use crate::driver::error::{IoError, IoResult};
use crate::internal::constants::{RESET_POLL_INTERVAL_US, RESET_TIMEOUT_US};

// =============================================================================
// Poll Timeout
// =============================================================================

/// Total budget and step of a bounded poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollTimeout {
    /// Total time budget in microseconds
    pub timeout_us: u32,
    /// Delay between attempts in microseconds
    pub interval_us: u32,
}

impl PollTimeout {
    /// Create a timeout with the given budget and interval
    #[must_use]
    pub const fn new(timeout_us: u32, interval_us: u32) -> Self {
        Self {
            timeout_us,
            interval_us,
        }
    }

    /// Default budget for a chip soft reset
    #[must_use]
    pub const fn reset() -> Self {
        Self::new(RESET_TIMEOUT_US, RESET_POLL_INTERVAL_US)
    }

    /// Number of attempts the budget allows (at least one)
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        if self.interval_us == 0 {
            1
        } else {
            let n = self.timeout_us / self.interval_us;
            if n == 0 { 1 } else { n }
        }
    }
}

impl Default for PollTimeout {
    fn default() -> Self {
        Self::reset()
    }
}

// =============================================================================
// Bounded Poll
// =============================================================================

/// Bounded-retry helper over a [`DelayNs`] provider
#[derive(Debug)]
pub struct BoundedPoll<D: DelayNs> {
    /// Delay provider
    delay: D,
    /// Budget
    timeout: PollTimeout,
}

impl<D: DelayNs> BoundedPoll<D> {
    /// Create a poller with the default reset budget
    pub fn new(delay: D) -> Self {
        Self {
            delay,
            timeout: PollTimeout::reset(),
        }
    }

    /// Create a poller with a custom budget
    pub fn with_timeout(delay: D, timeout: PollTimeout) -> Self {
        Self { delay, timeout }
    }

    /// Poll `done` until it returns `true` or the budget runs out.
    ///
    /// Returns the number of attempts used, or [`IoError::Timeout`].
    pub fn until<F>(&mut self, mut done: F) -> IoResult<u32>
    where
        F: FnMut() -> bool,
    {
        let max_attempts = self.timeout.max_attempts();
        for attempt in 1..=max_attempts {
            if done() {
                return Ok(attempt);
            }
            self.delay.delay_us(self.timeout.interval_us);
        }

        Err(IoError::Timeout)
    }

    /// Get the current budget
    pub fn timeout(&self) -> PollTimeout {
        self.timeout
    }

    /// Release the delay provider
    pub fn into_inner(self) -> D {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDelay;

    #[test]
    fn succeeds_immediately() {
        let mut poll = BoundedPoll::new(MockDelay::new());
        assert_eq!(poll.until(|| true), Ok(1));
        assert_eq!(poll.into_inner().total_ns(), 0);
    }

    #[test]
    fn succeeds_after_retries() {
        let mut poll = BoundedPoll::with_timeout(MockDelay::new(), PollTimeout::new(1_000, 100));
        let mut remaining = 3;
        let result = poll.until(|| {
            if remaining == 0 {
                true
            } else {
                remaining -= 1;
                false
            }
        });
        assert_eq!(result, Ok(4));
        assert_eq!(poll.into_inner().total_ns(), 300_000);
    }

    #[test]
    fn times_out_within_budget() {
        let mut poll = BoundedPoll::with_timeout(MockDelay::new(), PollTimeout::new(1_000, 100));
        assert_eq!(poll.until(|| false), Err(IoError::Timeout));
        assert_eq!(poll.into_inner().total_ns(), 1_000_000);
    }

    #[test]
    fn max_attempts_never_zero() {
        assert_eq!(PollTimeout::new(10, 100).max_attempts(), 1);
        assert_eq!(PollTimeout::new(100, 0).max_attempts(), 1);
        assert_eq!(PollTimeout::reset().max_attempts(), RESET_TIMEOUT_US / RESET_POLL_INTERVAL_US);
    }
}
