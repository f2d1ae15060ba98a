//! Ordered scenario execution.
//!
//! Scenarios run strictly one after another, each bracketed by the suite's
//! `before_each` and `after_each` hooks. A scenario is finished when its
//! future resolves; one that never resolves stalls the suite, which is left
//! to an outer timeout.

use crate::assertion::{AssertionRecord, Assertions};
use crate::result::HarnessResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// State shared by every scenario of a suite
pub trait ScenarioContext: Send {
    /// Recorder the scenarios check against
    fn assertions(&mut self) -> &mut Assertions;
}

/// A named test body
#[async_trait]
pub trait Scenario<C: ScenarioContext>: Send + Sync {
    /// Name shown in reports
    fn name(&self) -> &str;

    /// Run to completion, stopping at the first failed check
    async fn run(&self, ctx: &mut C) -> HarnessResult<()>;
}

/// Setup and teardown around each scenario
#[async_trait]
pub trait SuiteHooks<C: ScenarioContext>: Send + Sync {
    /// Runs before every scenario; a failure skips the scenario body
    async fn before_each(&self, _ctx: &mut C) -> HarnessResult<()> {
        Ok(())
    }

    /// Runs after every scenario, including failed ones
    async fn after_each(&self, _ctx: &mut C) -> HarnessResult<()> {
        Ok(())
    }
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<C: ScenarioContext> SuiteHooks<C> for NoHooks {}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// Scenario name
    pub name: String,
    /// Whether the scenario passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Scenario duration, hooks included
    pub duration: Duration,
    /// Checks the scenario recorded
    pub assertions: Vec<AssertionRecord>,
}

impl TestResult {
    /// Create a passing result
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            duration: Duration::ZERO,
            assertions: Vec::new(),
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
            duration: Duration::ZERO,
            assertions: Vec::new(),
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Attach recorded checks
    #[must_use]
    pub fn with_assertions(mut self, assertions: Vec<AssertionRecord>) -> Self {
        self.assertions = assertions;
        self
    }
}

/// Results from running a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual results, in run order
    pub results: Vec<TestResult>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteResults {
    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Total scenario count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

impl fmt::Display for SuiteResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            match &result.error {
                None => writeln!(f, "ok   {} ({:?})", result.name, result.duration)?,
                Some(error) => writeln!(f, "FAIL {}: {error}", result.name)?,
            }
        }
        write!(
            f,
            "{}: {} passed, {} failed ({:?})",
            self.suite_name,
            self.passed_count(),
            self.failed_count(),
            self.duration
        )
    }
}

type AllDone = Box<dyn FnOnce(&SuiteResults) + Send>;

/// Runs scenarios in declaration order
pub struct Sequencer<C: ScenarioContext> {
    name: String,
    scenarios: Vec<Box<dyn Scenario<C>>>,
    hooks: Box<dyn SuiteHooks<C>>,
    fail_fast: bool,
    on_all_done: Option<AllDone>,
}

impl<C: ScenarioContext> fmt::Debug for Sequencer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("name", &self.name)
            .field("scenarios", &self.scenario_names())
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

impl<C: ScenarioContext + 'static> Sequencer<C> {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
            hooks: Box::new(NoHooks),
            fail_fast: false,
            on_all_done: None,
        }
    }

    /// Append a scenario
    #[must_use]
    pub fn scenario(mut self, scenario: impl Scenario<C> + 'static) -> Self {
        self.scenarios.push(Box::new(scenario));
        self
    }

    /// Set the per-scenario hooks
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl SuiteHooks<C> + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Stop after the first failed scenario
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Callback invoked once after the last scenario
    #[must_use]
    pub fn on_all_done(mut self, callback: impl FnOnce(&SuiteResults) + Send + 'static) -> Self {
        self.on_all_done = Some(Box::new(callback));
        self
    }
}

impl<C: ScenarioContext> Sequencer<C> {
    /// Scenario names in run order
    #[must_use]
    pub fn scenario_names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name()).collect()
    }

    /// Run every scenario against `ctx`
    pub async fn run(self, ctx: &mut C) -> SuiteResults {
        let suite_start = Instant::now();
        let mut results = Vec::with_capacity(self.scenarios.len());

        for scenario in &self.scenarios {
            let name = scenario.name();
            info!(suite = %self.name, scenario = name, "scenario starting");
            let start = Instant::now();

            let outcome = match self.hooks.before_each(ctx).await {
                Ok(()) => scenario.run(ctx).await,
                Err(e) => Err(e),
            };
            let teardown = self.hooks.after_each(ctx).await;
            let assertions = ctx.assertions().take();

            let result = match (outcome, teardown) {
                (Ok(()), Ok(())) => TestResult::pass(name),
                (Err(e), _) => TestResult::fail(name, e.to_string()),
                (Ok(()), Err(e)) => TestResult::fail(name, format!("teardown failed: {e}")),
            }
            .with_duration(start.elapsed())
            .with_assertions(assertions);

            if let Some(error) = &result.error {
                warn!(scenario = name, %error, "scenario failed");
            } else {
                info!(scenario = name, duration = ?result.duration, "scenario passed");
            }

            let stop = self.fail_fast && !result.passed;
            results.push(result);
            if stop {
                break;
            }
        }

        let results = SuiteResults {
            suite_name: self.name,
            results,
            duration: suite_start.elapsed(),
        };
        if let Some(callback) = self.on_all_done {
            callback(&results);
        }
        results
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::result::HarnessError;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Journal {
        assertions: Assertions,
        events: Vec<String>,
    }

    impl ScenarioContext for Journal {
        fn assertions(&mut self) -> &mut Assertions {
            &mut self.assertions
        }
    }

    struct Step {
        name: &'static str,
        fails: bool,
    }

    #[async_trait]
    impl Scenario<Journal> for Step {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, ctx: &mut Journal) -> HarnessResult<()> {
            ctx.events.push(format!("run {}", self.name));
            tokio::task::yield_now().await;
            ctx.assertions.check_true(!self.fails, self.name)
        }
    }

    struct Recording {
        setup_fails: bool,
    }

    #[async_trait]
    impl SuiteHooks<Journal> for Recording {
        async fn before_each(&self, ctx: &mut Journal) -> HarnessResult<()> {
            ctx.events.push("before".to_string());
            if self.setup_fails {
                return Err(HarnessError::config("setup broke"));
            }
            Ok(())
        }

        async fn after_each(&self, ctx: &mut Journal) -> HarnessResult<()> {
            ctx.events.push("after".to_string());
            Ok(())
        }
    }

    fn step(name: &'static str, fails: bool) -> Step {
        Step { name, fails }
    }

    #[tokio::test]
    async fn test_runs_in_declaration_order_with_hooks() {
        let mut journal = Journal::default();
        let results = Sequencer::new("suite")
            .scenario(step("first", false))
            .scenario(step("second", false))
            .with_hooks(Recording { setup_fails: false })
            .run(&mut journal)
            .await;

        assert_eq!(
            journal.events,
            vec!["before", "run first", "after", "before", "run second", "after"]
        );
        assert!(results.all_passed());
        assert_eq!(results.total(), 2);
        assert_eq!(results.results[0].assertions.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_still_tears_down_and_continues() {
        let mut journal = Journal::default();
        let results = Sequencer::new("suite")
            .scenario(step("broken", true))
            .scenario(step("fine", false))
            .with_hooks(Recording { setup_fails: false })
            .run(&mut journal)
            .await;

        assert_eq!(
            journal.events,
            vec!["before", "run broken", "after", "before", "run fine", "after"]
        );
        assert_eq!(results.failed_count(), 1);
        assert_eq!(results.failures()[0].name, "broken");
        assert_eq!(
            results.results[0].error.as_deref(),
            Some("Assertion failed: broken")
        );
    }

    #[tokio::test]
    async fn test_fail_fast_stops_after_first_failure() {
        let mut journal = Journal::default();
        let results = Sequencer::new("suite")
            .scenario(step("broken", true))
            .scenario(step("never", false))
            .with_fail_fast(true)
            .run(&mut journal)
            .await;
        assert_eq!(results.total(), 1);
        assert_eq!(journal.events, vec!["run broken"]);
    }

    #[tokio::test]
    async fn test_setup_failure_skips_body_but_runs_teardown() {
        let mut journal = Journal::default();
        let results = Sequencer::new("suite")
            .scenario(step("skipped", false))
            .with_hooks(Recording { setup_fails: true })
            .run(&mut journal)
            .await;
        assert_eq!(journal.events, vec!["before", "after"]);
        assert!(!results.all_passed());
    }

    #[tokio::test]
    async fn test_on_all_done_fires_once_with_results() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut journal = Journal::default();
        let _ = Sequencer::new("suite")
            .scenario(step("only", false))
            .on_all_done(move |results| sink.lock().unwrap().push(results.total()))
            .run(&mut journal)
            .await;
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_empty_suite() {
        let mut journal = Journal::default();
        let results = Sequencer::new("empty").run(&mut journal).await;
        assert!(results.all_passed());
        assert_eq!(results.total(), 0);
    }

    #[test]
    fn test_scenario_names_in_order() {
        let suite = Sequencer::<Journal>::new("suite")
            .scenario(step("a", false))
            .scenario(step("b", false));
        assert_eq!(suite.scenario_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_suite_results_display() {
        let results = SuiteResults {
            suite_name: "focus".to_string(),
            results: vec![
                TestResult::pass("one"),
                TestResult::fail("two", "chat should be focused"),
            ],
            duration: Duration::ZERO,
        };
        let text = results.to_string();
        assert!(text.contains("ok   one"));
        assert!(text.contains("FAIL two: chat should be focused"));
        assert!(text.ends_with("focus: 1 passed, 1 failed (0ns)"));
    }
}
