//! Chat open pathways.
//!
//! A [`ChatDriver`] opens chats the three ways a provider can: by asking its
//! sidebar, by asking its worker, and by simulating the user. Background
//! pathways only ever talk to the responder; the user pathway goes straight
//! to the container.

use crate::channel::Endpoint;
use crate::config::{HarnessConfig, ProviderManifest};
use crate::handshake::{Handshake, HandshakeAction};
use crate::message::{Message, Topic};
use crate::panel::{OpenTrigger, Panel, PanelContainer, PanelMode};
use crate::result::{HarnessError, HarnessResult};
use crate::wait::ConditionWaiter;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Driver side of the chat open protocol
pub struct ChatDriver {
    endpoint: Endpoint,
    container: Arc<dyn PanelContainer>,
    waiter: ConditionWaiter,
    provider: ProviderManifest,
    chat_url: String,
    handshake_timeout: Duration,
    sidebar_ready: bool,
}

impl std::fmt::Debug for ChatDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatDriver")
            .field("endpoint", &self.endpoint.name())
            .field("provider", &self.provider.origin)
            .field("chat_url", &self.chat_url)
            .field("sidebar_ready", &self.sidebar_ready)
            .finish_non_exhaustive()
    }
}

impl ChatDriver {
    /// Create a driver talking to the responder behind `endpoint`
    #[must_use]
    pub fn new(
        endpoint: Endpoint,
        container: Arc<dyn PanelContainer>,
        config: &HarnessConfig,
    ) -> Self {
        Self {
            endpoint,
            container,
            waiter: ConditionWaiter::new(config.wait),
            provider: config.provider.clone(),
            chat_url: config.chat_url.clone(),
            handshake_timeout: config.handshake_timeout(),
            sidebar_ready: false,
        }
    }

    /// Container the chats open in
    #[must_use]
    pub fn container(&self) -> &Arc<dyn PanelContainer> {
        &self.container
    }

    /// Waiter used for every polled condition
    #[must_use]
    pub const fn waiter(&self) -> &ConditionWaiter {
        &self.waiter
    }

    /// Chat document the sidebar opens
    #[must_use]
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Whether an earlier handshake learned that the sidebar is up
    #[must_use]
    pub const fn sidebar_ready(&self) -> bool {
        self.sidebar_ready
    }

    /// Run the initialization handshake with the sidebar.
    ///
    /// Anything still queued from earlier conversations is discarded first,
    /// so only replies to this handshake's `init-request` count. Readiness
    /// learned here is kept for later handshakes on this driver.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::HandshakeTimeout`] if the sidebar does not
    /// answer in time, or [`HarnessError::ChannelClosed`] if it is gone.
    pub async fn wait_for_sidebar(&mut self) -> HarnessResult<()> {
        let mut handshake = Handshake::new(self.sidebar_ready);
        let outcome = tokio::time::timeout(
            self.handshake_timeout,
            drive_handshake(&mut self.endpoint, &mut handshake),
        )
        .await;
        self.sidebar_ready |= handshake.sidebar_ready();

        match outcome {
            Ok(result) => result,
            Err(_) => Err(HarnessError::HandshakeTimeout {
                ms: u64::try_from(self.handshake_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Ask the sidebar to open a chat and wait for its acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ChannelClosed`] if the sidebar goes away
    /// before acknowledging.
    pub async fn open_via_sidebar_message(&mut self, data: Value) -> HarnessResult<Message> {
        info!(%data, "requesting chat via sidebar");
        let mut conversation = self.endpoint.subscribe(Topic::ChatOpenedAck.as_str());
        conversation.post(Message::new(Topic::RequestOpenViaSidebar, data))?;
        let ack = conversation.recv_topic(Topic::ChatOpenedAck).await?;
        debug!(data = %ack.data, "chat opened by sidebar");
        Ok(ack)
    }

    /// Ask the worker to open a chat at `url` (default: the configured chat).
    ///
    /// The worker never replies, so this waits for the panel count to grow by
    /// one and then re-opens the same chat minimized. That second open does
    /// not add a panel; its completion tells us the chat finished loading.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] ("No new chat appeared") if no panel
    /// shows up, or [`HarnessError::ContainerDropped`] if the chat is closed
    /// before it loads.
    pub async fn open_via_worker_message(&self, url: Option<&str>) -> HarnessResult<Panel> {
        let url = url.unwrap_or(self.chat_url.as_str()).to_string();
        let before = self.container.panel_count();
        info!(%url, before, "requesting chat via worker");
        self.endpoint
            .post(Message::new(Topic::RequestOpenViaWorker, json!(url)))?;

        let container = &self.container;
        self.waiter
            .wait_for(|| container.panel_count() == before + 1, "No new chat appeared")
            .await?;

        let probe = self.provider.chat_descriptor(url, PanelMode::Minimized);
        let panel = self.container.open(probe, OpenTrigger::Background).wait().await?;
        debug!(url = %panel.url, "worker chat initialized");
        Ok(panel)
    }

    /// Open the configured chat as if the user clicked on it.
    ///
    /// The container adds and selects the panel before this returns; focus
    /// follows asynchronously.
    pub fn open_via_user(&self) {
        info!(url = %self.chat_url, "opening chat via user action");
        let descriptor = self
            .provider
            .chat_descriptor(&self.chat_url, PanelMode::Normal);
        drop(self.container.open(descriptor, OpenTrigger::UserAction));
    }
}

async fn drive_handshake(endpoint: &mut Endpoint, handshake: &mut Handshake) -> HarnessResult<()> {
    let mut conversation = endpoint.subscribe("sidebar handshake");
    let stale = conversation.drain_pending();
    if stale > 0 {
        debug!(stale, "dropped messages queued before init-request");
    }
    conversation.post(Message::bare(Topic::InitRequest))?;
    loop {
        let message = conversation.recv().await?;
        match handshake.on_topic(message.topic) {
            Some(HandshakeAction::QueryVisibility) => {
                conversation.post(Message::bare(Topic::VisibilityQuery))?;
            }
            Some(HandshakeAction::Proceed) => return Ok(()),
            None => {}
        }
    }
}
