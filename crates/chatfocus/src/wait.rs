//! Condition waiting.
//!
//! Panels are created, initialized and focused on the container's own
//! schedule, and several of those transitions have no completion signal of
//! their own. [`ConditionWaiter`] bridges that gap: it re-evaluates a
//! predicate on a fixed interval until it holds or a bounded timeout elapses.
//!
//! Time is taken from `tokio::time`, so tests running on a paused clock are
//! fully deterministic.

use crate::result::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of predicate evaluations, including the successful one
    pub polls: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

/// Bounded polling primitive.
///
/// Every wait evaluates its predicate immediately, then once per poll
/// interval, and a final time at the deadline. Evaluation stops as soon as
/// the predicate holds or the deadline has been checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionWaiter {
    options: WaitOptions,
}

impl ConditionWaiter {
    /// Create a waiter with the given options
    #[must_use]
    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options this waiter polls with
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `predicate` until it returns true.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] carrying `timeout_message` when the
    /// predicate is still false at the deadline.
    pub async fn wait_for<F>(
        &self,
        mut predicate: F,
        timeout_message: &str,
    ) -> HarnessResult<WaitResult>
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();
        let deadline = start + self.options.timeout();
        let interval = self.options.poll_interval().max(Duration::from_millis(1));
        let mut polls = 0u32;

        loop {
            polls += 1;
            if predicate() {
                let elapsed = start.elapsed();
                debug!(polls, ?elapsed, condition = timeout_message, "condition met");
                return Ok(WaitResult {
                    elapsed,
                    polls,
                    waited_for: timeout_message.to_string(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    polls,
                    timeout_ms = self.options.timeout_ms,
                    "{timeout_message}"
                );
                return Err(HarnessError::Timeout {
                    message: timeout_message.to_string(),
                    ms: self.options.timeout_ms,
                });
            }

            tokio::time::sleep_until((now + interval).min(deadline)).await;
        }
    }

    /// Poll `predicate`, then run `on_success` exactly once if it held.
    ///
    /// `on_success` is never invoked when the wait times out.
    ///
    /// # Errors
    ///
    /// Same as [`ConditionWaiter::wait_for`].
    pub async fn wait_then<F, S>(
        &self,
        predicate: F,
        on_success: S,
        timeout_message: &str,
    ) -> HarnessResult<WaitResult>
    where
        F: FnMut() -> bool,
        S: FnOnce(),
    {
        let result = self.wait_for(predicate, timeout_message).await?;
        on_success();
        Ok(result)
    }
}
