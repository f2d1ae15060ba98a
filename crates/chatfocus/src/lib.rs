//! Chatfocus: focus-policy harness for provider chat panels
//!
//! Chat panels opened by a provider's sidebar or worker, without user input,
//! must never take input focus away from the content the user is working in.
//! Panels opened by the user must be selected and focused. This crate drives
//! both kinds of open over an asynchronous message channel and asserts on the
//! resulting panel and focus state.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  before/after   ┌────────────┐  post/subscribe  ┌────────────┐
//! │ Sequencer  │────────────────►│ ChatDriver │─────────────────►│ Responder  │
//! │ (scenarios)│                 │ (protocol) │◄─────────────────│ (sidebar)  │
//! └────────────┘                 └─────┬──────┘                  └─────┬──────┘
//!                                      │ poll (ConditionWaiter)        │ open
//!                                      ▼                               ▼
//!                                ┌──────────────────────────────────────────┐
//!                                │ PanelContainer + FocusProbe (chat bar)   │
//!                                └──────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chatfocus::{focus_suite, run_simulated, HarnessConfig};
//!
//! # async fn demo() {
//! let results = run_simulated(&HarnessConfig::default(), focus_suite()).await;
//! assert!(results.all_passed(), "{results}");
//! # }
//! ```

#![warn(missing_docs)]

mod assertion;
mod channel;
mod config;
mod handshake;
mod message;
mod panel;
mod protocol;
mod result;
mod scenarios;
mod sequencer;
mod wait;

/// In-process stand-ins for the host chat bar and the provider sidebar
pub mod mock;

pub use assertion::{AssertionRecord, Assertions};
pub use channel::{Endpoint, MessageChannel, Poster, Subscription};
pub use config::{HarnessConfig, ProviderManifest, DEFAULT_HANDSHAKE_TIMEOUT_MS};
pub use handshake::{Handshake, HandshakeAction, HandshakeState};
pub use message::{Envelope, Message, Topic};
pub use panel::{
    ContentEnvironment, FocusProbe, OpenCompletion, OpenTrigger, Panel, PanelContainer,
    PanelDescriptor, PanelKey, PanelMode, Surface,
};
pub use protocol::ChatDriver;
pub use result::{HarnessError, HarnessResult};
pub use scenarios::{
    focus_suite, run_simulated, FocusContext, FocusHooks, FocusWhenViaUser,
    NoFocusWhenViaSidebarMessage, NoFocusWhenViaWorkerMessage, FOCUS_SUITE_NAME,
};
pub use sequencer::{
    NoHooks, Scenario, ScenarioContext, Sequencer, SuiteHooks, SuiteResults, TestResult,
};
pub use wait::{
    ConditionWaiter, WaitOptions, WaitResult, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for writing focus scenarios
pub mod prelude {
    pub use super::{
        Assertions, ChatDriver, ConditionWaiter, FocusContext, FocusProbe, HarnessConfig,
        HarnessError, HarnessResult, PanelContainer, Scenario, ScenarioContext, Sequencer,
        SuiteHooks, SuiteResults, Surface, Topic, WaitOptions,
    };
}
