//! Client facade.
//!
//! Owns the channel handle, the three listener registries, the dispatcher,
//! and the heartbeat scheduler. Typical use: build, register listeners,
//! `initialize()`, then `run()`.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use futures_util::FutureExt;
use serde_json::Value;

use hashi_core::error::Result;
use hashi_core::{EventMessage, FriendMessage, GroupMessage, MessageKind};

use crate::api::ActionCaller;
use crate::channel::{Channel, EventHandler, SocketIoChannel, CONNECT, DISCONNECT};
use crate::config::ClientConfig;
use crate::dispatch::{EnvelopeDispatcher, Listener, ListenerResult, Listeners};
use crate::heartbeat::{self, HeartbeatScheduler, HeartbeatState};

pub struct Client {
    cfg: ClientConfig,
    api: ActionCaller,
    listeners: Arc<Listeners>,
    dispatcher: Arc<EnvelopeDispatcher>,
    channel: OnceLock<Arc<dyn Channel>>,
    heartbeat: OnceLock<Arc<HeartbeatScheduler>>,
}

impl Client {
    /// Client backed by a Socket.IO channel, created on first use.
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        cfg.validate()?;
        let api = ActionCaller::new(&cfg.address(), cfg.account, cfg.timeout)?;
        let listeners = Arc::new(Listeners::new());
        Ok(Self {
            cfg,
            api,
            dispatcher: Arc::new(EnvelopeDispatcher::new(Arc::clone(&listeners))),
            listeners,
            channel: OnceLock::new(),
            heartbeat: OnceLock::new(),
        })
    }

    /// Client over a caller-supplied channel.
    pub fn with_channel(cfg: ClientConfig, channel: Arc<dyn Channel>) -> Result<Self> {
        let client = Self::new(cfg)?;
        let _ = client.channel.set(channel);
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    pub fn address(&self) -> String {
        self.cfg.address()
    }

    pub fn account(&self) -> i64 {
        self.cfg.account
    }

    pub fn api(&self) -> &ActionCaller {
        &self.api
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn dispatcher(&self) -> &EnvelopeDispatcher {
        &self.dispatcher
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        self.channel
            .get_or_init(|| Arc::new(SocketIoChannel::new()) as Arc<dyn Channel>)
    }

    // ---- registration

    pub fn register_event_listener(&self, l: Listener<EventMessage>) -> Listener<EventMessage> {
        self.listeners.event.register(l)
    }

    pub fn register_friend_listener(&self, l: Listener<FriendMessage>) -> Listener<FriendMessage> {
        self.listeners.friend.register(l)
    }

    pub fn register_group_listener(&self, l: Listener<GroupMessage>) -> Listener<GroupMessage> {
        self.listeners.group.register(l)
    }

    pub fn on_event<F, Fut>(&self, f: F) -> Listener<EventMessage>
    where
        F: Fn(EventMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        self.register_event_listener(Listener::from_async(f))
    }

    pub fn on_friend_message<F, Fut>(&self, f: F) -> Listener<FriendMessage>
    where
        F: Fn(FriendMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        self.register_friend_listener(Listener::from_async(f))
    }

    pub fn on_group_message<F, Fut>(&self, f: F) -> Listener<GroupMessage>
    where
        F: Fn(GroupMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        self.register_group_listener(Listener::from_async(f))
    }

    pub fn on_event_blocking<F>(&self, f: F) -> Listener<EventMessage>
    where
        F: Fn(EventMessage) -> ListenerResult + Send + Sync + 'static,
    {
        self.register_event_listener(Listener::from_blocking(f))
    }

    pub fn on_friend_message_blocking<F>(&self, f: F) -> Listener<FriendMessage>
    where
        F: Fn(FriendMessage) -> ListenerResult + Send + Sync + 'static,
    {
        self.register_friend_listener(Listener::from_blocking(f))
    }

    pub fn on_group_message_blocking<F>(&self, f: F) -> Listener<GroupMessage>
    where
        F: Fn(GroupMessage) -> ListenerResult + Send + Sync + 'static,
    {
        self.register_group_listener(Listener::from_blocking(f))
    }

    // ---- lifecycle

    /// Subscribe the dispatcher to the message events and, when a heartbeat
    /// interval is configured, tie the scheduler to connect/disconnect.
    pub fn initialize(&self) {
        let channel = self.channel();

        for kind in MessageKind::ALL {
            let dispatcher = Arc::clone(&self.dispatcher);
            let handler: EventHandler = Arc::new(move |envelope: Value| {
                let dispatcher = Arc::clone(&dispatcher);
                async move {
                    dispatcher.dispatch(kind, envelope).await;
                }
                .boxed()
            });
            channel.on(kind.channel_event(), handler);
        }

        if let Some(interval) = self.cfg.heartbeat {
            // The channel keeps its handlers for its whole life; hooks hold
            // the scheduler weakly so dropping the client stops the beat.
            let scheduler = self.heartbeat.get_or_init(|| {
                Arc::new(HeartbeatScheduler::new(
                    Arc::clone(channel),
                    self.cfg.account,
                    interval,
                ))
            });

            let on_connect = Arc::downgrade(scheduler);
            channel.on(
                CONNECT,
                Arc::new(move |_: Value| {
                    if let Some(scheduler) = on_connect.upgrade() {
                        scheduler.start();
                    }
                    futures_util::future::ready(()).boxed()
                }),
            );
            let on_disconnect = Arc::downgrade(scheduler);
            channel.on(
                DISCONNECT,
                Arc::new(move |_: Value| {
                    if let Some(scheduler) = on_disconnect.upgrade() {
                        scheduler.stop();
                    }
                    futures_util::future::ready(()).boxed()
                }),
            );
        }

        tracing::info!(client = %self, "client initialized");
    }

    pub fn heartbeat_state(&self) -> HeartbeatState {
        self.heartbeat
            .get()
            .map(|h| h.state())
            .unwrap_or(HeartbeatState::Idle)
    }

    /// Push one liveness signal now.
    pub async fn heartbeat(&self) -> Result<()> {
        heartbeat::emit_liveness(self.channel().as_ref(), self.cfg.account).await
    }

    pub async fn connect(&self) -> Result<()> {
        let address = self.address();
        self.channel().connect(&address).await?;
        tracing::info!(%address, "connection to gateway established");
        Ok(())
    }

    /// Connect, block until the channel closes, then disconnect. The
    /// disconnect runs even when waiting fails.
    pub async fn run(&self) -> Result<()> {
        self.connect().await?;
        let waited = self.channel().wait().await;
        let closed = self.disconnect().await;
        waited.and(closed)
    }

    pub async fn disconnect(&self) -> Result<()> {
        if let Some(h) = self.heartbeat.get() {
            h.stop();
        }
        self.channel().disconnect().await
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Client (Address:{} Account:{})>", self.address(), self.cfg.account)
    }
}
