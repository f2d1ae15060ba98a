//! In-process stand-ins for the host collaborators.
//!
//! [`SimulatedChatBar`] plays the panel container, focus probe and content
//! environment; [`SidebarResponder`] plays the provider's sidebar and worker
//! on the far end of a [`MessageChannel`](crate::channel::MessageChannel).
//! Both follow the same timing model the real host has: panels appear before
//! they finish initializing, and focus lands after the open call returns.

mod chatbar;
mod responder;

pub use chatbar::SimulatedChatBar;
pub use responder::SidebarResponder;

use crate::channel::{Endpoint, MessageChannel};
use crate::config::HarnessConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Order in which the responder reports readiness during initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessOrder {
    /// `got-sidebar-message` overtakes `init-done`
    #[default]
    BeforeInitDone,
    /// `got-sidebar-message` follows `init-done`
    AfterInitDone,
    /// Readiness only comes back as a `visibility-response`
    OnQueryOnly,
}

/// How the simulated container treats focus on background opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusPolicy {
    /// Only user-triggered opens move focus
    #[default]
    Enforced,
    /// Every open moves focus. A deliberately broken container.
    StealOnBackground,
}

/// Timing and behaviour of the simulated collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Delay between a panel appearing and finishing initialization
    pub init_delay_ms: u64,
    /// Delay between a focus-granting open and focus landing
    pub focus_delay_ms: u64,
    /// Handshake ordering of the responder
    pub readiness: ReadinessOrder,
    /// Focus behaviour of the container
    pub policy: FocusPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            init_delay_ms: 20,
            focus_delay_ms: 10,
            readiness: ReadinessOrder::default(),
            policy: FocusPolicy::default(),
        }
    }
}

impl SimulationConfig {
    /// Set the responder's readiness ordering
    #[must_use]
    pub const fn with_readiness(mut self, readiness: ReadinessOrder) -> Self {
        self.readiness = readiness;
        self
    }

    /// Set the container's focus policy
    #[must_use]
    pub const fn with_policy(mut self, policy: FocusPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set both delays
    #[must_use]
    pub const fn with_delays(mut self, init_delay_ms: u64, focus_delay_ms: u64) -> Self {
        self.init_delay_ms = init_delay_ms;
        self.focus_delay_ms = focus_delay_ms;
        self
    }

    /// Initialization delay as Duration
    #[must_use]
    pub const fn init_delay(&self) -> Duration {
        Duration::from_millis(self.init_delay_ms)
    }

    /// Focus delay as Duration
    #[must_use]
    pub const fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }
}

/// A running simulation: container, driver endpoint and responder task
#[derive(Debug)]
pub struct Simulation {
    /// The simulated host container
    pub chatbar: Arc<SimulatedChatBar>,
    /// Driver side of the channel to the responder
    pub endpoint: Endpoint,
    /// The responder task; ends when `endpoint` is dropped
    pub responder: JoinHandle<()>,
}

impl Simulation {
    /// Build the collaborators described by `config` and spawn the responder.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(config: &HarnessConfig) -> Self {
        let chatbar = Arc::new(SimulatedChatBar::new(config.simulation));
        let (endpoint, responder_endpoint) = MessageChannel::pair("driver", "sidebar");
        let responder = SidebarResponder::new(
            responder_endpoint,
            chatbar.clone(),
            config.provider.clone(),
            config.chat_url.clone(),
            config.simulation.readiness,
        )
        .spawn();
        Self {
            chatbar,
            endpoint,
            responder,
        }
    }
}
