//! Bidirectional message channel between the driver and a responder.
//!
//! Each direction is an unbounded FIFO queue, so posting never blocks and a
//! message is delivered at most once. Receiving goes through a
//! [`Subscription`], which mutably borrows its [`Endpoint`]: one conversation
//! owns the inbound side at a time and a second handler cannot silently
//! replace it. Messages that arrive while nobody is subscribed stay queued
//! for the next subscription.

use crate::message::{Envelope, Message, Topic};
use crate::result::{HarnessError, HarnessResult};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

/// Factory for connected endpoint pairs
#[derive(Debug, Clone, Copy)]
pub struct MessageChannel;

impl MessageChannel {
    /// Create two connected endpoints.
    ///
    /// Whatever one endpoint posts, the other receives.
    #[must_use]
    pub fn pair(left: &str, right: &str) -> (Endpoint, Endpoint) {
        let (to_right, from_left) = unbounded_channel();
        let (to_left, from_right) = unbounded_channel();
        (
            Endpoint {
                name: left.to_string(),
                tx: to_right,
                rx: from_right,
            },
            Endpoint {
                name: right.to_string(),
                tx: to_left,
                rx: from_left,
            },
        )
    }
}

/// One side of a [`MessageChannel`]
#[derive(Debug)]
pub struct Endpoint {
    name: String,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
}

impl Endpoint {
    /// Name used in logs
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Post a message to the peer without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ChannelClosed`] if the peer endpoint is gone.
    pub fn post(&self, message: impl Into<Envelope>) -> HarnessResult<()> {
        post_on(&self.name, &self.tx, message.into())
    }

    /// A cloneable handle that can post on behalf of this endpoint
    #[must_use]
    pub fn poster(&self) -> Poster {
        Poster {
            name: self.name.clone(),
            tx: self.tx.clone(),
        }
    }

    /// Open a conversation on this endpoint.
    ///
    /// `purpose` only shows up in logs and in `ChannelClosed` errors.
    pub fn subscribe(&mut self, purpose: impl Into<String>) -> Subscription<'_> {
        let purpose = purpose.into();
        debug!(endpoint = %self.name, %purpose, "subscribed");
        Subscription {
            endpoint: &self.name,
            purpose,
            tx: &self.tx,
            rx: &mut self.rx,
        }
    }
}

/// Send-only handle to an endpoint's outbound queue.
///
/// Lets spawned tasks answer on a channel whose inbound side is held by a
/// [`Subscription`].
#[derive(Debug, Clone)]
pub struct Poster {
    name: String,
    tx: UnboundedSender<Envelope>,
}

impl Poster {
    /// Post a message to the peer without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ChannelClosed`] if the peer endpoint is gone.
    pub fn post(&self, message: impl Into<Envelope>) -> HarnessResult<()> {
        post_on(&self.name, &self.tx, message.into())
    }
}

fn post_on(name: &str, tx: &UnboundedSender<Envelope>, envelope: Envelope) -> HarnessResult<()> {
    trace!(endpoint = %name, topic = %envelope.topic, "post");
    let topic = envelope.topic.clone();
    tx.send(envelope).map_err(|_| HarnessError::ChannelClosed {
        waiting_for: format!("delivery of {topic}"),
    })
}

/// Exclusive, scoped receiver for one conversation.
///
/// Dropping the subscription ends the conversation; anything still queued
/// is left for the next one.
#[derive(Debug)]
pub struct Subscription<'a> {
    endpoint: &'a str,
    purpose: String,
    tx: &'a UnboundedSender<Envelope>,
    rx: &'a mut UnboundedReceiver<Envelope>,
}

impl Subscription<'_> {
    /// Post to the peer while holding the subscription.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ChannelClosed`] if the peer endpoint is gone.
    pub fn post(&self, message: impl Into<Envelope>) -> HarnessResult<()> {
        post_on(self.endpoint, self.tx, message.into())
    }

    /// Receive the next message with a recognized topic.
    ///
    /// Unrecognized topics are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ChannelClosed`] once the peer is gone and the
    /// queue is drained.
    pub async fn recv(&mut self) -> HarnessResult<Message> {
        loop {
            let Some(envelope) = self.rx.recv().await else {
                return Err(HarnessError::ChannelClosed {
                    waiting_for: self.purpose.clone(),
                });
            };
            let topic = envelope.topic.clone();
            match envelope.decode() {
                Some(message) => {
                    trace!(endpoint = %self.endpoint, %topic, "deliver");
                    return Ok(message);
                }
                None => debug!(endpoint = %self.endpoint, %topic, "ignoring unknown topic"),
            }
        }
    }

    /// Discard everything already queued without waiting.
    ///
    /// Returns how many messages were dropped.
    pub fn drain_pending(&mut self) -> usize {
        let mut dropped = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            debug!(
                endpoint = %self.endpoint,
                purpose = %self.purpose,
                topic = %envelope.topic,
                "discarding stale message"
            );
            dropped += 1;
        }
        dropped
    }

    /// Receive until a message with `topic` arrives, discarding others.
    ///
    /// # Errors
    ///
    /// Same as [`Subscription::recv`].
    pub async fn recv_topic(&mut self, topic: Topic) -> HarnessResult<Message> {
        loop {
            let message = self.recv().await?;
            if message.topic == topic {
                return Ok(message);
            }
            debug!(
                endpoint = %self.endpoint,
                expected = %topic,
                got = %message.topic,
                "ignoring message outside this conversation"
            );
        }
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        debug!(endpoint = %self.endpoint, purpose = %self.purpose, "unsubscribed");
    }
}
