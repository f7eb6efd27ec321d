use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error, info, warn};

use super::queue::OutboundQueue;
use super::session::SessionRegistry;
use super::subscription::{SubscriptionIndex, is_wildcard};
use super::topic::{TopicId, TopicRegistry};
use crate::client::ClientSession;
use crate::codec::replies::{
    create_connack, create_disconnect, create_gwinfo, create_pingresp, create_puback,
    create_publish, create_regack, create_suback, create_unsuback,
};
use crate::codec::{Message, MessageType, Publish, QoS, ReturnCode, TopicRef, decode};
use crate::config::Settings;
use crate::store::StateStore;
use crate::transport::Endpoint;
use crate::utils::{BrokerError, Clock};

pub type HandlerResult = Result<(), BrokerError>;

type Handler = for<'a> fn(&'a Broker, &'a Message, &'a Endpoint) -> BoxFuture<'a, HandlerResult>;

/// Identity and defaults of one broker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerOptions {
    /// Unique per process; also the key of its liveness record.
    pub broker_id: String,
    pub gateway_id: u8,
    /// Used when a CONNECT asks for zero, and for sessionless endpoints.
    pub keep_alive_secs: u16,
}

impl BrokerOptions {
    /// Derive the options from loaded settings. The broker id combines the
    /// configured name with the process id.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            broker_id: format!("broker:{}:{}", settings.broker.name, std::process::id()),
            gateway_id: settings.gateway.gateway_id,
            keep_alive_secs: u16::try_from(settings.broker.keepalive_secs).unwrap_or(u16::MAX),
        }
    }
}

/// The message dispatcher.
///
/// A `Broker` holds no client state of its own: sessions, topics,
/// subscriptions and outbound queues all live in the shared store, so any
/// number of instances can serve the same devices. Handlers never write to
/// the network; every reply and every fan-out copy goes onto the
/// destination's outbound queue and is sent by the drain loop.
pub struct Broker {
    options: BrokerOptions,
    store: Arc<dyn StateStore>,
    topics: TopicRegistry,
    sessions: SessionRegistry,
    subscriptions: SubscriptionIndex,
    queue: OutboundQueue,
    handlers: HashMap<MessageType, Handler>,
}

impl Broker {
    /// Build a broker over `store`, with its dispatch table populated.
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>, options: BrokerOptions) -> Self {
        Self {
            topics: TopicRegistry::new(store.clone(), clock.clone()),
            sessions: SessionRegistry::new(
                store.clone(),
                clock,
                options.broker_id.clone(),
                options.keep_alive_secs,
            ),
            subscriptions: SubscriptionIndex::new(store.clone()),
            queue: OutboundQueue::new(store.clone()),
            store,
            handlers: handler_table(),
            options,
        }
    }

    /// Unique id of this instance, also the key of its liveness record.
    pub fn broker_id(&self) -> &str {
        &self.options.broker_id
    }

    /// The shared store every registry below reads and writes.
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Topic name <-> id registry.
    pub fn topics(&self) -> &TopicRegistry {
        &self.topics
    }

    /// Sessions and the endpoints this instance owns.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Per-client subscription patterns.
    pub fn subscriptions(&self) -> &SubscriptionIndex {
        &self.subscriptions
    }

    /// Outbound frame queues, drained by `liveness::drain_queues`.
    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    /// Entry point for one inbound datagram. Errors are logged and the frame
    /// dropped; nothing here can take the receive loop down.
    pub async fn dispatch(&self, frame: &[u8], from: Endpoint) {
        let message = match decode(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(%from, len = frame.len(), error = %e, "dropping malformed frame");
                return;
            }
        };
        debug!(%from, "{message}");

        if let Err(e) = self.handle(&message, &from).await {
            error!(%from, message_type = %message.message_type(), error = %e, "handler failed");
        }
    }

    /// Run the handler registered for the message's type. Types without a
    /// handler are ignored.
    pub async fn handle(&self, message: &Message, from: &Endpoint) -> HandlerResult {
        match self.handlers.get(&message.message_type()) {
            Some(handler) => handler(self, message, from).await,
            None => {
                debug!(%from, message_type = %message.message_type(), "ignoring message");
                Ok(())
            }
        }
    }

    /// Queue `frame` for `destination`, expiring with `window`. An empty
    /// frame (a reply that could not be built) is skipped. Returns whether
    /// anything was queued.
    pub async fn enqueue(
        &self,
        destination: &Endpoint,
        frame: Bytes,
        window: Duration,
    ) -> Result<bool, BrokerError> {
        if frame.is_empty() {
            debug!(%destination, "nothing to enqueue");
            return Ok(false);
        }
        let depth = self.queue.push(destination, &frame, window).await?;
        debug!(%destination, depth, "queued frame");
        Ok(true)
    }

    /// Reply to the sender of the current message. Senders without a
    /// session are adopted for the default window so the reply drains.
    async fn reply(
        &self,
        to: &Endpoint,
        session: Option<&ClientSession>,
        frame: Bytes,
    ) -> HandlerResult {
        let window = match session {
            Some(session) => session.window(),
            None => {
                let window = self.sessions.default_window();
                self.sessions.adopt(to, window).await?;
                window
            }
        };
        self.enqueue(to, frame, window).await?;
        Ok(())
    }

    async fn handle_connect(&self, message: &Message, from: &Endpoint) -> HandlerResult {
        let Message::Connect(connect) = message else {
            return Ok(());
        };
        if connect.flags.will {
            debug!(client_id = %connect.client_id, "will flag set; wills are not supported");
        }

        let session = self
            .sessions
            .connect(&connect.client_id, from, connect.duration)
            .await?;
        if connect.flags.clean_session {
            self.subscriptions.clear(&connect.client_id).await?;
        }
        info!(
            client_id = %session.client_id,
            endpoint = %from,
            keep_alive = session.keep_alive_secs,
            "client connected"
        );

        self.reply(from, Some(&session), create_connack(ReturnCode::Accepted))
            .await
    }

    async fn handle_register(&self, message: &Message, from: &Endpoint) -> HandlerResult {
        let Message::Register(register) = message else {
            return Ok(());
        };
        let session = self.sessions.touch(from).await?;
        let topic_id = self.topics.register_or_get(&register.topic_name).await?;
        debug!(topic = %register.topic_name, topic_id, "register");

        self.reply(
            from,
            session.as_ref(),
            create_regack(register, topic_id, ReturnCode::Accepted),
        )
        .await
    }

    async fn handle_subscribe(&self, message: &Message, from: &Endpoint) -> HandlerResult {
        let Message::Subscribe(subscribe) = message else {
            return Ok(());
        };
        let Some(session) = self.sessions.touch(from).await? else {
            info!(%from, "subscribe without a session");
            return self
                .reply(
                    from,
                    None,
                    create_suback(subscribe, 0, ReturnCode::NotSupported),
                )
                .await;
        };

        let (frame, pattern) = match self.subscription_target(&subscribe.topic).await? {
            Some((pattern, topic_id)) => (
                create_suback(subscribe, topic_id, ReturnCode::Accepted),
                Some(pattern),
            ),
            None => (
                create_suback(subscribe, 0, ReturnCode::InvalidTopicId),
                None,
            ),
        };
        match pattern {
            Some(pattern) => {
                self.subscriptions
                    .subscribe(&session.client_id, &pattern, session.record_ttl())
                    .await?;
                info!(client_id = %session.client_id, %pattern, "subscribed");
            }
            None => info!(client_id = %session.client_id, topic = ?subscribe.topic, "subscribe to unknown topic"),
        }

        self.reply(from, Some(&session), frame).await
    }

    /// The pattern to store and the topic id to grant for a SUBSCRIBE, or
    /// `None` if it names nothing.
    async fn subscription_target(
        &self,
        topic: &TopicRef,
    ) -> Result<Option<(String, TopicId)>, BrokerError> {
        let target = match topic {
            TopicRef::Name(name) if name.is_empty() => None,
            TopicRef::Name(name) if is_wildcard(name) => Some((name.clone(), 0)),
            TopicRef::Name(name) => Some((name.clone(), self.topics.register_or_get(name).await?)),
            TopicRef::Short(name) => Some((name.clone(), 0)),
            TopicRef::Id(id) => self
                .topics
                .lookup_name(TopicId::from(*id))
                .await?
                .map(|name| (name, TopicId::from(*id))),
        };
        Ok(target)
    }

    async fn handle_unsubscribe(&self, message: &Message, from: &Endpoint) -> HandlerResult {
        let Message::Unsubscribe(unsubscribe) = message else {
            return Ok(());
        };
        let session = self.sessions.touch(from).await?;

        if let Some(session) = &session {
            let pattern = match &unsubscribe.topic {
                TopicRef::Name(name) | TopicRef::Short(name) => Some(name.clone()),
                TopicRef::Id(id) => self.topics.lookup_name(TopicId::from(*id)).await?,
            };
            if let Some(pattern) = pattern {
                let removed = self
                    .subscriptions
                    .unsubscribe(&session.client_id, &pattern)
                    .await?;
                debug!(client_id = %session.client_id, %pattern, removed, "unsubscribe");
            }
        }

        self.reply(from, session.as_ref(), create_unsuback(unsubscribe))
            .await
    }

    async fn handle_publish(&self, message: &Message, from: &Endpoint) -> HandlerResult {
        let Message::Publish(publish) = message else {
            return Ok(());
        };
        let session = self.sessions.touch(from).await?;

        let topic = match publish.short_topic_name() {
            Some(name) => Some(name),
            None => {
                self.topics
                    .lookup_name(TopicId::from(publish.topic_id))
                    .await?
            }
        };
        let Some(topic) = topic else {
            info!(%from, topic_id = publish.topic_id, "publish to unregistered topic id; dropped");
            if publish.flags.qos == QoS::AtLeastOnce {
                self.reply(
                    from,
                    session.as_ref(),
                    create_puback(publish, ReturnCode::InvalidTopicId),
                )
                .await?;
            }
            return Ok(());
        };

        let delivered = self.fan_out(&topic, publish).await?;
        debug!(%topic, delivered, "published");

        if publish.flags.qos == QoS::AtLeastOnce {
            self.reply(
                from,
                session.as_ref(),
                create_puback(publish, ReturnCode::Accepted),
            )
            .await?;
        }
        Ok(())
    }

    /// Queue a copy of `publish` for every live subscriber whose patterns
    /// match `topic`. Returns the number of copies queued.
    async fn fan_out(&self, topic: &str, publish: &Publish) -> Result<usize, BrokerError> {
        let frame = create_publish(publish);
        if frame.is_empty() {
            return Ok(0);
        }

        let mut delivered = 0;
        for client_id in self.subscriptions.matching_clients(topic).await? {
            match self.sessions.resolve(&client_id).await? {
                Some(session) if session.pending_disconnect => {
                    debug!(%client_id, %topic, "subscriber is disconnecting; skipped");
                }
                Some(session) => {
                    if self
                        .enqueue(&session.endpoint, frame.clone(), session.window())
                        .await?
                    {
                        delivered += 1;
                    }
                }
                None => {
                    warn!(%client_id, %topic, "no live endpoint for subscriber; skipped");
                }
            }
        }
        Ok(delivered)
    }

    async fn handle_disconnect(&self, message: &Message, from: &Endpoint) -> HandlerResult {
        let Message::Disconnect { duration } = message else {
            return Ok(());
        };
        let session = self.sessions.mark_disconnecting(from).await?;
        if let Some(session) = &session {
            info!(client_id = %session.client_id, ?duration, "client disconnecting");
        }
        self.reply(from, session.as_ref(), create_disconnect()).await
    }

    async fn handle_pingreq(&self, _message: &Message, from: &Endpoint) -> HandlerResult {
        let session = self.sessions.touch(from).await?;
        self.reply(from, session.as_ref(), create_pingresp()).await
    }

    async fn handle_searchgw(&self, _message: &Message, from: &Endpoint) -> HandlerResult {
        self.reply(from, None, create_gwinfo(self.options.gateway_id))
            .await
    }

    /// Acknowledgements from the device carry nothing to act on beyond
    /// proof of life.
    async fn handle_ack(&self, message: &Message, from: &Endpoint) -> HandlerResult {
        if self.sessions.touch(from).await?.is_none() {
            debug!(%from, message_type = %message.message_type(), "ack from unknown endpoint");
        }
        Ok(())
    }
}

/// Wrap a handler method into a dispatch table entry.
macro_rules! handler {
    ($method:ident) => {{
        fn handler<'a>(
            broker: &'a Broker,
            message: &'a Message,
            from: &'a Endpoint,
        ) -> BoxFuture<'a, HandlerResult> {
            broker.$method(message, from).boxed()
        }
        handler as Handler
    }};
}

fn handler_table() -> HashMap<MessageType, Handler> {
    let mut table = HashMap::new();
    table.insert(MessageType::Connect, handler!(handle_connect));
    table.insert(MessageType::Register, handler!(handle_register));
    table.insert(MessageType::Subscribe, handler!(handle_subscribe));
    table.insert(MessageType::Unsubscribe, handler!(handle_unsubscribe));
    table.insert(MessageType::Publish, handler!(handle_publish));
    table.insert(MessageType::Disconnect, handler!(handle_disconnect));
    table.insert(MessageType::PingReq, handler!(handle_pingreq));
    table.insert(MessageType::SearchGw, handler!(handle_searchgw));
    table.insert(MessageType::PubAck, handler!(handle_ack));
    table.insert(MessageType::RegAck, handler!(handle_ack));
    table.insert(MessageType::PingResp, handler!(handle_ack));
    table
}
