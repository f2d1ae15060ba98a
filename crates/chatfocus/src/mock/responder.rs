//! Simulated provider sidebar and worker.

use super::ReadinessOrder;
use crate::channel::{Endpoint, Poster};
use crate::config::ProviderManifest;
use crate::message::{Message, Topic};
use crate::panel::{OpenTrigger, PanelContainer, PanelMode};
use crate::result::HarnessResult;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Responder end of the driver's channel.
///
/// Answers the initialization handshake, opens chats on request and ignores
/// everything else. Runs until the driver's endpoint is dropped.
pub struct SidebarResponder {
    endpoint: Endpoint,
    handler: RequestHandler,
}

impl std::fmt::Debug for SidebarResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SidebarResponder")
            .field("endpoint", &self.endpoint.name())
            .field("provider", &self.handler.provider.origin)
            .field("readiness", &self.handler.readiness)
            .finish_non_exhaustive()
    }
}

struct RequestHandler {
    poster: Poster,
    container: Arc<dyn PanelContainer>,
    provider: ProviderManifest,
    chat_url: String,
    readiness: ReadinessOrder,
}

impl SidebarResponder {
    /// Create a responder that opens chats in `container`
    #[must_use]
    pub fn new(
        endpoint: Endpoint,
        container: Arc<dyn PanelContainer>,
        provider: ProviderManifest,
        chat_url: String,
        readiness: ReadinessOrder,
    ) -> Self {
        let handler = RequestHandler {
            poster: endpoint.poster(),
            container,
            provider,
            chat_url,
            readiness,
        };
        Self { endpoint, handler }
    }

    /// Run on the current tokio runtime
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Serve requests until the driver goes away
    pub async fn run(self) {
        let Self {
            mut endpoint,
            handler,
        } = self;
        let mut inbox = endpoint.subscribe("sidebar requests");
        while let Ok(message) = inbox.recv().await {
            if let Err(e) = handler.handle(message) {
                warn!("sidebar responder: {e}");
            }
        }
        debug!("driver endpoint closed, responder stopping");
    }
}

impl RequestHandler {
    fn handle(&self, message: Message) -> HarnessResult<()> {
        match message.topic {
            Topic::InitRequest => self.initialize(),
            Topic::VisibilityQuery => self
                .poster
                .post(Message::new(Topic::VisibilityResponse, json!(true))),
            Topic::RequestOpenViaSidebar => {
                self.open_from_sidebar(&message.data);
                Ok(())
            }
            Topic::RequestOpenViaWorker => {
                self.open_from_worker(&message.data);
                Ok(())
            }
            other => {
                debug!(topic = %other, "sidebar ignores topic");
                Ok(())
            }
        }
    }

    fn initialize(&self) -> HarnessResult<()> {
        let ready = Message::bare(Topic::SidebarMessageSeen);
        let done = Message::bare(Topic::InitDone);
        match self.readiness {
            ReadinessOrder::BeforeInitDone => {
                self.poster.post(ready)?;
                self.poster.post(done)
            }
            ReadinessOrder::AfterInitDone => {
                self.poster.post(done)?;
                self.poster.post(ready)
            }
            ReadinessOrder::OnQueryOnly => self.poster.post(done),
        }
    }

    /// The sidebar opens its chat page and acknowledges once it is loaded.
    fn open_from_sidebar(&self, data: &Value) {
        info!(%data, "sidebar opening chat");
        let descriptor = self
            .provider
            .chat_descriptor(&self.chat_url, PanelMode::Normal);
        let completion = self.container.open(descriptor, OpenTrigger::Background);
        let poster = self.poster.clone();
        tokio::spawn(async move {
            match completion.wait().await {
                Ok(panel) => {
                    let ack = Message::new(Topic::ChatOpenedAck, json!({ "url": panel.url }));
                    if let Err(e) = poster.post(ack) {
                        debug!("dropping chat-opened-ack: {e}");
                    }
                }
                Err(e) => warn!("sidebar chat never finished opening: {e}"),
            }
        });
    }

    /// The worker asks for a minimized chat and has no way to report back.
    fn open_from_worker(&self, data: &Value) {
        let url = data.as_str().unwrap_or(self.chat_url.as_str());
        info!(url, "worker requesting chat");
        let descriptor = self.provider.chat_descriptor(url, PanelMode::Minimized);
        drop(self.container.open(descriptor, OpenTrigger::Background));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::channel::MessageChannel;
    use crate::mock::{SimulatedChatBar, SimulationConfig};
    use crate::panel::{FocusProbe, Surface};
    use std::time::Duration;

    struct Rig {
        chatbar: Arc<SimulatedChatBar>,
        driver: Endpoint,
        _task: JoinHandle<()>,
    }

    fn rig(readiness: ReadinessOrder) -> Rig {
        let chatbar = Arc::new(SimulatedChatBar::new(SimulationConfig::default()));
        let (driver, sidebar) = MessageChannel::pair("driver", "sidebar");
        let task = SidebarResponder::new(
            sidebar,
            chatbar.clone(),
            ProviderManifest::default(),
            "https://example.com/chat.html".to_string(),
            readiness,
        )
        .spawn();
        Rig {
            chatbar,
            driver,
            _task: task,
        }
    }

    async fn topics_after_init(readiness: ReadinessOrder) -> Vec<Topic> {
        let mut rig = rig(readiness);
        rig.driver.post(Message::bare(Topic::InitRequest)).unwrap();
        rig.driver.post(Message::bare(Topic::VisibilityQuery)).unwrap();
        let mut sub = rig.driver.subscribe("init");
        let mut topics = Vec::new();
        while topics.last() != Some(&Topic::VisibilityResponse) {
            topics.push(sub.recv().await.unwrap().topic);
        }
        topics
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_before_init_done() {
        assert_eq!(
            topics_after_init(ReadinessOrder::BeforeInitDone).await,
            vec![
                Topic::SidebarMessageSeen,
                Topic::InitDone,
                Topic::VisibilityResponse
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_after_init_done() {
        assert_eq!(
            topics_after_init(ReadinessOrder::AfterInitDone).await,
            vec![
                Topic::InitDone,
                Topic::SidebarMessageSeen,
                Topic::VisibilityResponse
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_only_on_query() {
        assert_eq!(
            topics_after_init(ReadinessOrder::OnQueryOnly).await,
            vec![Topic::InitDone, Topic::VisibilityResponse]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sidebar_request_is_acknowledged_after_init() {
        let mut rig = rig(ReadinessOrder::default());
        rig.driver
            .post(Message::new(
                Topic::RequestOpenViaSidebar,
                json!({"stealFocus": 1}),
            ))
            .unwrap();
        let mut sub = rig.driver.subscribe("ack");
        let ack = sub.recv_topic(Topic::ChatOpenedAck).await.unwrap();
        assert_eq!(ack.data, json!({"url": "https://example.com/chat.html"}));
        assert_eq!(rig.chatbar.panel_count(), 1);
        assert!(rig.chatbar.active_surface_is(&Surface::Content));
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_request_opens_minimized_without_reply() {
        let rig = rig(ReadinessOrder::default());
        rig.driver
            .post(Message::new(
                Topic::RequestOpenViaWorker,
                json!("https://example.com/worker-chat.html"),
            ))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let panel = rig.chatbar.first_panel().unwrap();
        assert_eq!(panel.url, "https://example.com/worker-chat.html");
        assert_eq!(panel.mode, PanelMode::Minimized);
        assert!(!rig.chatbar.is_focused(&panel));
    }

    #[tokio::test(start_paused = true)]
    async fn test_responder_stops_when_driver_drops() {
        let rig = rig(ReadinessOrder::default());
        let Rig { driver, _task, .. } = rig;
        drop(driver);
        tokio::time::timeout(Duration::from_secs(1), _task)
            .await
            .unwrap()
            .unwrap();
    }
}
