//! Messages exchanged between the driver and the sidebar/worker responder.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Closed set of topics both ends of a channel understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    /// Ask the sidebar to open a chat
    RequestOpenViaSidebar,
    /// Ask the worker to open a chat; never acknowledged
    RequestOpenViaWorker,
    /// The sidebar finished opening a chat
    ChatOpenedAck,
    /// Start the responder's test initialization
    InitRequest,
    /// The responder finished its initialization
    InitDone,
    /// Ask whether the sidebar is visible
    VisibilityQuery,
    /// The sidebar answered a visibility query
    VisibilityResponse,
    /// The sidebar delivered a message to the worker
    #[serde(rename = "got-sidebar-message")]
    SidebarMessageSeen,
}

impl Topic {
    /// Every topic, in declaration order
    pub const ALL: [Self; 8] = [
        Self::RequestOpenViaSidebar,
        Self::RequestOpenViaWorker,
        Self::ChatOpenedAck,
        Self::InitRequest,
        Self::InitDone,
        Self::VisibilityQuery,
        Self::VisibilityResponse,
        Self::SidebarMessageSeen,
    ];

    /// Wire name of the topic
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestOpenViaSidebar => "request-open-via-sidebar",
            Self::RequestOpenViaWorker => "request-open-via-worker",
            Self::ChatOpenedAck => "chat-opened-ack",
            Self::InitRequest => "init-request",
            Self::InitDone => "init-done",
            Self::VisibilityQuery => "visibility-query",
            Self::VisibilityResponse => "visibility-response",
            Self::SidebarMessageSeen => "got-sidebar-message",
        }
    }

    /// Look up a topic by wire name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|topic| topic.as_str() == name)
    }

    /// Whether this topic tells the driver the sidebar is up
    #[must_use]
    pub const fn signals_readiness(&self) -> bool {
        matches!(self, Self::SidebarMessageSeen | Self::VisibilityResponse)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What actually travels over a channel.
///
/// The topic stays a plain string so that a peer speaking a newer protocol
/// can still be represented; see [`Envelope::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Topic name
    pub topic: String,
    /// Arbitrary payload
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Create an envelope with an arbitrary topic name
    #[must_use]
    pub fn new(topic: impl Into<String>, data: Value) -> Self {
        Self {
            topic: topic.into(),
            data,
        }
    }

    /// Decode into a typed [`Message`], or `None` for unrecognized topics
    #[must_use]
    pub fn decode(self) -> Option<Message> {
        Topic::parse(&self.topic).map(|topic| Message {
            topic,
            data: self.data,
        })
    }
}

/// A message with a recognized topic
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Topic
    pub topic: Topic,
    /// Payload
    pub data: Value,
}

impl Message {
    /// Create a message with a payload
    #[must_use]
    pub const fn new(topic: Topic, data: Value) -> Self {
        Self { topic, data }
    }

    /// Create a message without payload
    #[must_use]
    pub const fn bare(topic: Topic) -> Self {
        Self {
            topic,
            data: Value::Null,
        }
    }
}

impl From<Message> for Envelope {
    fn from(message: Message) -> Self {
        Self {
            topic: message.topic.as_str().to_string(),
            data: message.data,
        }
    }
}
