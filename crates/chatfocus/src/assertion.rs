//! Hard assertions with a running record.
//!
//! Every check is recorded, pass or fail, so a scenario report lists what
//! was verified. A failing check returns [`HarnessError::AssertionFailed`]
//! for `?` propagation: the scenario stops at its first failure.

use crate::result::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{debug, warn};

/// One recorded check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionRecord {
    /// Whether the check held
    pub passed: bool,
    /// Description, including expected/actual values on failure
    pub message: String,
}

/// Recorder for a scenario's checks
#[derive(Debug, Default)]
pub struct Assertions {
    records: Vec<AssertionRecord>,
}

impl Assertions {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a milestone that cannot fail
    pub fn ok(&mut self, message: &str) {
        self.pass(message.to_string());
    }

    /// Check that `condition` holds
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::AssertionFailed`] if it does not.
    pub fn check_true(&mut self, condition: bool, message: &str) -> HarnessResult<()> {
        if condition {
            self.pass(message.to_string());
            Ok(())
        } else {
            Err(self.fail(message))
        }
    }

    /// Check that `actual == expected`
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::AssertionFailed`] naming both values if not.
    pub fn check_eq<T: PartialEq + Debug>(
        &mut self,
        actual: &T,
        expected: &T,
        message: &str,
    ) -> HarnessResult<()> {
        if actual == expected {
            self.pass(message.to_string());
            Ok(())
        } else {
            Err(self.fail(&format!("{message}: expected {expected:?}, got {actual:?}")))
        }
    }

    /// Record an unconditional failure and return the error to propagate
    pub fn fail(&mut self, message: &str) -> HarnessError {
        warn!("FAIL {message}");
        self.records.push(AssertionRecord {
            passed: false,
            message: message.to_string(),
        });
        HarnessError::assertion(message)
    }

    fn pass(&mut self, message: String) {
        debug!("ok {message}");
        self.records.push(AssertionRecord {
            passed: true,
            message,
        });
    }

    /// Number of checks recorded
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Number of failed checks
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.records.iter().filter(|r| !r.passed).count()
    }

    /// Recorded checks
    #[must_use]
    pub fn records(&self) -> &[AssertionRecord] {
        &self.records
    }

    /// Take the recorded checks, leaving the recorder empty
    pub fn take(&mut self) -> Vec<AssertionRecord> {
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_passing_checks_are_recorded() {
        let mut assertions = Assertions::new();
        assertions.ok("got chatbox message");
        assertions.check_true(true, "chat opened").unwrap();
        assertions.check_eq(&1, &1, "exactly 1 chat open").unwrap();
        assert_eq!(assertions.count(), 3);
        assert_eq!(assertions.failure_count(), 0);
    }

    #[test]
    fn test_check_eq_failure_names_values() {
        let mut assertions = Assertions::new();
        let err = assertions
            .check_eq(&2usize, &1usize, "still exactly 1 chat open")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion failed: still exactly 1 chat open: expected 1, got 2"
        );
        assert_eq!(assertions.failure_count(), 1);
    }

    #[test]
    fn test_check_true_failure() {
        let mut assertions = Assertions::new();
        assert!(assertions.check_true(false, "tab should still be focused").is_err());
        assert!(!assertions.records()[0].passed);
    }

    #[test]
    fn test_fail_records_and_returns_error() {
        let mut assertions = Assertions::new();
        let err = assertions.fail("unexpected");
        assert!(matches!(err, HarnessError::AssertionFailed { .. }));
        assert_eq!(assertions.failure_count(), 1);
    }

    #[test]
    fn test_take_drains() {
        let mut assertions = Assertions::new();
        assertions.ok("one");
        let taken = assertions.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(assertions.count(), 0);
    }
}
