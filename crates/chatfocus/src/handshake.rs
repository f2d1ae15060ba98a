//! Sidebar initialization handshake.
//!
//! The driver posts `init-request`; the responder answers `init-done` and may
//! also send a readiness signal (`got-sidebar-message`) that can overtake
//! `init-done` on the channel. If `init-done` arrives while readiness is still
//! unknown, the driver asks explicitly with `visibility-query` and proceeds on
//! `visibility-response`. Either ordering yields exactly one
//! [`HandshakeAction::Proceed`].

use crate::message::Topic;
use std::fmt;

/// Where a handshake stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Nothing heard yet and readiness unknown
    Uninitialized,
    /// The sidebar is known to be up, waiting for `init-done`
    ReadinessKnown,
    /// `init-done` arrived first; a visibility query is outstanding
    AwaitingVisibility,
    /// The driver has been told to proceed. Terminal.
    Proceeded,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::ReadinessKnown => write!(f, "readiness-known"),
            Self::AwaitingVisibility => write!(f, "awaiting-visibility"),
            Self::Proceeded => write!(f, "proceeded"),
        }
    }
}

/// What the driver must do after feeding a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Post `visibility-query` to the responder
    QueryVisibility,
    /// The sidebar is ready; run the scenario
    Proceed,
}

/// Explicit handshake state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    state: HandshakeState,
}

impl Handshake {
    /// Start a handshake.
    ///
    /// `sidebar_ready` carries readiness learned by an earlier handshake on
    /// the same run.
    #[must_use]
    pub const fn new(sidebar_ready: bool) -> Self {
        Self {
            state: if sidebar_ready {
                HandshakeState::ReadinessKnown
            } else {
                HandshakeState::Uninitialized
            },
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether [`HandshakeAction::Proceed`] has been emitted
    #[must_use]
    pub const fn has_proceeded(&self) -> bool {
        matches!(self.state, HandshakeState::Proceeded)
    }

    /// Whether the sidebar is known to be ready
    #[must_use]
    pub const fn sidebar_ready(&self) -> bool {
        matches!(
            self.state,
            HandshakeState::ReadinessKnown | HandshakeState::Proceeded
        )
    }

    /// Feed one received topic and get the action it triggers, if any.
    ///
    /// Topics unrelated to the handshake are ignored.
    pub fn on_topic(&mut self, topic: Topic) -> Option<HandshakeAction> {
        use HandshakeState::{AwaitingVisibility, Proceeded, ReadinessKnown, Uninitialized};

        let (next, action) = match (self.state, topic) {
            (Proceeded, _) => (Proceeded, None),
            (_, t) if t.signals_readiness() => (Proceeded, Some(HandshakeAction::Proceed)),
            (ReadinessKnown, Topic::InitDone) => (Proceeded, Some(HandshakeAction::Proceed)),
            (Uninitialized, Topic::InitDone) => {
                (AwaitingVisibility, Some(HandshakeAction::QueryVisibility))
            }
            (state, _) => (state, None),
        };

        if next != self.state {
            tracing::debug!(from = %self.state, to = %next, %topic, "handshake transition");
        }
        self.state = next;
        action
    }
}
