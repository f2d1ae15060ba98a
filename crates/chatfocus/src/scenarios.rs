//! The focus policy suite.
//!
//! Chats opened by the provider's sidebar or worker must leave focus in the
//! content view, however often they are requested. A chat opened by the user
//! must end up selected and focused.

use crate::assertion::Assertions;
use crate::config::HarnessConfig;
use crate::mock::Simulation;
use crate::panel::{ContentEnvironment, FocusProbe, Surface};
use crate::protocol::ChatDriver;
use crate::result::HarnessResult;
use crate::sequencer::{Scenario, ScenarioContext, Sequencer, SuiteHooks, SuiteResults};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Suite name used in reports
pub const FOCUS_SUITE_NAME: &str = "chat window focus";

/// Everything the focus scenarios act on
pub struct FocusContext {
    driver: ChatDriver,
    probe: Arc<dyn FocusProbe>,
    environment: Arc<dyn ContentEnvironment>,
    assertions: Assertions,
}

impl std::fmt::Debug for FocusContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusContext")
            .field("driver", &self.driver)
            .field("assertions", &self.assertions)
            .finish_non_exhaustive()
    }
}

impl FocusContext {
    /// Create a context over a driver and the host's focus interfaces
    #[must_use]
    pub fn new(
        driver: ChatDriver,
        probe: Arc<dyn FocusProbe>,
        environment: Arc<dyn ContentEnvironment>,
    ) -> Self {
        Self {
            driver,
            probe,
            environment,
            assertions: Assertions::new(),
        }
    }

    /// The protocol driver
    #[must_use]
    pub const fn driver(&self) -> &ChatDriver {
        &self.driver
    }

    /// The protocol driver, for scenarios that open chats
    pub fn driver_mut(&mut self) -> &mut ChatDriver {
        &mut self.driver
    }

    fn content_focused(&self) -> bool {
        self.probe.active_surface_is(&Surface::Content)
    }

    fn check_panel_count(&mut self, expected: usize, message: &str) -> HarnessResult<()> {
        let count = self.driver.container().panel_count();
        self.assertions.check_eq(&count, &expected, message)
    }

    fn check_content_focused(&mut self) -> HarnessResult<()> {
        let focused = self.content_focused();
        self.assertions
            .check_true(focused, "tab should still be focused")
    }

    async fn wait_for_selected_focus(&self) -> HarnessResult<()> {
        let container = self.driver.container();
        let probe = &self.probe;
        self.driver
            .waiter()
            .wait_for(
                || {
                    container
                        .selected_panel()
                        .is_some_and(|panel| probe.is_focused(&panel))
                },
                "chat should be focused",
            )
            .await?;
        Ok(())
    }

    fn check_selected_is_first(&mut self, message: &str) -> HarnessResult<()> {
        let container = self.driver.container();
        let selected = container.selected_panel();
        let first = container.first_panel();
        if selected.is_none() {
            return Err(self.assertions.fail(&format!("{message}: nothing selected")));
        }
        self.assertions.check_eq(&selected, &first, message)
    }
}

impl ScenarioContext for FocusContext {
    fn assertions(&mut self) -> &mut Assertions {
        &mut self.assertions
    }
}

/// Focuses the content view before each scenario and closes every chat after
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusHooks;

#[async_trait]
impl SuiteHooks<FocusContext> for FocusHooks {
    async fn before_each(&self, ctx: &mut FocusContext) -> HarnessResult<()> {
        ctx.environment.focus_content();
        let probe = &ctx.probe;
        ctx.driver
            .waiter()
            .wait_for(
                || probe.active_surface_is(&Surface::Content),
                "tab should have focus",
            )
            .await?;
        Ok(())
    }

    async fn after_each(&self, ctx: &mut FocusContext) -> HarnessResult<()> {
        debug!("closing all chats");
        ctx.driver.container().close_all().await
    }
}

/// The sidebar opens the same chat twice, then the user opens it
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFocusWhenViaSidebarMessage;

#[async_trait]
impl Scenario<FocusContext> for NoFocusWhenViaSidebarMessage {
    fn name(&self) -> &str {
        "no_focus_when_via_sidebar_message"
    }

    async fn run(&self, ctx: &mut FocusContext) -> HarnessResult<()> {
        ctx.driver.wait_for_sidebar().await?;

        ctx.driver
            .open_via_sidebar_message(json!({ "stealFocus": 1 }))
            .await?;
        ctx.assertions.ok("got chatbox message");
        ctx.check_panel_count(1, "exactly 1 chat open")?;
        ctx.check_content_focused()?;

        ctx.driver
            .open_via_sidebar_message(json!({ "stealFocus": 1 }))
            .await?;
        ctx.check_panel_count(1, "still exactly 1 chat open")?;
        ctx.check_content_focused()?;

        ctx.driver.open_via_user();
        ctx.wait_for_selected_focus().await?;
        ctx.check_panel_count(1, "still exactly 1 chat open")?;
        ctx.check_selected_is_first("chat should be selected")
    }
}

/// The worker opens a chat without any acknowledgement, then the user opens it
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFocusWhenViaWorkerMessage;

#[async_trait]
impl Scenario<FocusContext> for NoFocusWhenViaWorkerMessage {
    fn name(&self) -> &str {
        "no_focus_when_via_worker_message"
    }

    async fn run(&self, ctx: &mut FocusContext) -> HarnessResult<()> {
        ctx.driver.wait_for_sidebar().await?;

        let panel = ctx.driver.open_via_worker_message(None).await?;
        ctx.assertions.ok("worker chat initialized");
        ctx.check_panel_count(1, "exactly 1 chat open")?;
        let focused = ctx.probe.is_focused(&panel);
        ctx.assertions
            .check_true(!focused, "worker chat should not be focused")?;
        ctx.check_content_focused()?;

        ctx.driver.open_via_user();
        ctx.wait_for_selected_focus().await?;
        ctx.check_panel_count(1, "still exactly 1 chat open")?;
        ctx.check_selected_is_first("chat should be selected")
    }
}

/// The user opens a chat directly
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusWhenViaUser;

#[async_trait]
impl Scenario<FocusContext> for FocusWhenViaUser {
    fn name(&self) -> &str {
        "focus_when_via_user"
    }

    async fn run(&self, ctx: &mut FocusContext) -> HarnessResult<()> {
        ctx.driver.wait_for_sidebar().await?;

        ctx.driver.open_via_user();
        let opened = ctx.driver.container().first_panel().is_some();
        ctx.assertions.check_true(opened, "chat opened")?;
        ctx.wait_for_selected_focus().await?;
        ctx.check_selected_is_first("chat is selected")
    }
}

/// The focus suite in run order
#[must_use]
pub fn focus_suite() -> Sequencer<FocusContext> {
    Sequencer::new(FOCUS_SUITE_NAME)
        .scenario(NoFocusWhenViaSidebarMessage)
        .scenario(NoFocusWhenViaWorkerMessage)
        .scenario(FocusWhenViaUser)
        .with_hooks(FocusHooks)
}

/// Run `suite` against a fresh simulation built from `config`.
///
/// Must be called from within a tokio runtime.
pub async fn run_simulated(config: &HarnessConfig, suite: Sequencer<FocusContext>) -> SuiteResults {
    let Simulation {
        chatbar,
        endpoint,
        responder,
    } = Simulation::start(config);
    let driver = ChatDriver::new(endpoint, chatbar.clone(), config);
    let mut ctx = FocusContext::new(driver, chatbar.clone(), chatbar);

    let results = suite.run(&mut ctx).await;

    drop(ctx);
    if let Err(e) = responder.await {
        warn!("sidebar responder task failed: {e}");
    }
    results
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::channel::{Endpoint, MessageChannel};
    use crate::message::Topic;
    use crate::mock::{
        FocusPolicy, ReadinessOrder, SidebarResponder, SimulatedChatBar, SimulationConfig,
    };
    use crate::result::HarnessError;
    use crate::wait::WaitOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(simulation: SimulationConfig) -> HarnessConfig {
        HarnessConfig::default()
            .with_wait(WaitOptions::new().with_timeout(2_000).with_poll_interval(10))
            .with_handshake_timeout(1_000)
            .with_simulation(simulation)
    }

    /// Forward traffic between `driver` and `sidebar`, counting the
    /// `init-request`s that pass and withholding all after the first `answered`.
    fn relay(driver: Endpoint, sidebar: Endpoint, answered: usize) -> Arc<AtomicUsize> {
        let requests = Arc::new(AtomicUsize::new(0));
        let to_sidebar = sidebar.poster();
        let to_driver = driver.poster();

        let seen = requests.clone();
        let mut inbound = driver;
        tokio::spawn(async move {
            let mut inbox = inbound.subscribe("relay to sidebar");
            while let Ok(message) = inbox.recv().await {
                if message.topic == Topic::InitRequest
                    && seen.fetch_add(1, Ordering::SeqCst) >= answered
                {
                    continue;
                }
                if to_sidebar.post(message).is_err() {
                    break;
                }
            }
        });

        let mut outbound = sidebar;
        tokio::spawn(async move {
            let mut inbox = outbound.subscribe("relay to driver");
            while let Ok(message) = inbox.recv().await {
                if to_driver.post(message).is_err() {
                    break;
                }
            }
        });
        requests
    }

    async fn run_relayed(
        config: &HarnessConfig,
        answered: usize,
    ) -> (SuiteResults, Arc<AtomicUsize>) {
        let chatbar = Arc::new(SimulatedChatBar::new(config.simulation));
        let (driver_end, relay_in) = MessageChannel::pair("driver", "relay");
        let (relay_out, sidebar_end) = MessageChannel::pair("relay", "sidebar");
        let _responder = SidebarResponder::new(
            sidebar_end,
            chatbar.clone(),
            config.provider.clone(),
            config.chat_url.clone(),
            config.simulation.readiness,
        )
        .spawn();
        let requests = relay(relay_in, relay_out, answered);

        let driver = ChatDriver::new(driver_end, chatbar.clone(), config);
        let mut ctx = FocusContext::new(driver, chatbar.clone(), chatbar);
        (focus_suite().run(&mut ctx).await, requests)
    }

    #[test]
    fn test_suite_order() {
        assert_eq!(
            focus_suite().scenario_names(),
            vec![
                "no_focus_when_via_sidebar_message",
                "no_focus_when_via_worker_message",
                "focus_when_via_user"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_suite_passes_against_enforcing_container() {
        let results = run_simulated(&config(SimulationConfig::default()), focus_suite()).await;
        assert!(results.all_passed(), "{results}");
        assert_eq!(results.passed_count(), 3);
        assert!(results.results.iter().all(|r| !r.assertions.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_suite_passes_when_readiness_only_on_query() {
        let simulation = SimulationConfig::default().with_readiness(ReadinessOrder::OnQueryOnly);
        let results = run_simulated(&config(simulation), focus_suite()).await;
        assert!(results.all_passed(), "{results}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stealing_container_fails_background_scenarios() {
        let simulation = SimulationConfig::default()
            .with_delays(40, 5)
            .with_policy(FocusPolicy::StealOnBackground);
        let results = run_simulated(&config(simulation), focus_suite()).await;

        let failed: Vec<_> = results.failures().into_iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            failed,
            vec![
                "no_focus_when_via_sidebar_message",
                "no_focus_when_via_worker_message"
            ]
        );
        assert!(results.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("tab should still be focused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_scenario_handshakes_with_the_sidebar() {
        for readiness in [
            ReadinessOrder::BeforeInitDone,
            ReadinessOrder::AfterInitDone,
            ReadinessOrder::OnQueryOnly,
        ] {
            let simulation = SimulationConfig::default().with_readiness(readiness);
            let (results, requests) = run_relayed(&config(simulation), usize::MAX).await;
            assert!(results.all_passed(), "{readiness:?}\n{results}");
            assert_eq!(requests.load(Ordering::SeqCst), 3, "{readiness:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_scenarios_wait_for_their_own_init_reply() {
        for readiness in [ReadinessOrder::BeforeInitDone, ReadinessOrder::AfterInitDone] {
            let simulation = SimulationConfig::default().with_readiness(readiness);
            let (results, requests) = run_relayed(&config(simulation), 1).await;

            assert!(results.results[0].passed, "{readiness:?}\n{results}");
            let expected = HarnessError::HandshakeTimeout { ms: 1_000 }.to_string();
            for result in &results.results[1..] {
                assert!(!result.passed, "{readiness:?}: {} passed", result.name);
                assert_eq!(result.error.as_deref(), Some(expected.as_str()));
            }
            assert_eq!(requests.load(Ordering::SeqCst), 3);
        }
    }
}
