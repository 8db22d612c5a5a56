//! Socket.IO channel over the websocket transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use rust_socketio::asynchronous::{Client as SocketClient, ClientBuilder};
use rust_socketio::{Event, Payload, TransportType};
use serde_json::Value;
use tokio::sync::{watch, Mutex};

use hashi_core::error::{HashiError, Result};

use super::{AckHandler, Channel, EventHandler, CONNECT, DISCONNECT};

const ACK_TIMEOUT: Duration = Duration::from_secs(10);

type Handlers = Arc<DashMap<String, EventHandler>>;

pub struct SocketIoChannel {
    handlers: Handlers,
    socket: Mutex<Option<SocketClient>>,
    connected: Arc<watch::Sender<bool>>,
}

impl Default for SocketIoChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketIoChannel {
    pub fn new() -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            handlers: Arc::new(DashMap::new()),
            socket: Mutex::new(None),
            connected: Arc::new(connected),
        }
    }

    /// Builder with lifecycle hooks that keep `connected` in sync.
    ///
    /// Socket.IO fixes the set of event names when the client is built, so
    /// only names subscribed before `connect` are routed. Handlers are looked
    /// up on every arrival, so replacing one takes effect immediately.
    fn builder(&self, address: &str) -> ClientBuilder {
        let mut builder = ClientBuilder::new(address).transport_type(TransportType::Websocket);

        let state = Arc::clone(&self.connected);
        let handlers = Arc::clone(&self.handlers);
        builder = builder.on(Event::Connect, move |_payload, _socket| {
            state.send_replace(true);
            deliver(&handlers, CONNECT, Some(Value::Null))
        });

        let state = Arc::clone(&self.connected);
        let handlers = Arc::clone(&self.handlers);
        builder = builder.on(Event::Close, move |_payload, _socket| {
            state.send_replace(false);
            deliver(&handlers, DISCONNECT, Some(Value::Null))
        });

        let names: Vec<String> = self
            .handlers
            .iter()
            .map(|e| e.key().clone())
            .filter(|k| k != CONNECT && k != DISCONNECT)
            .collect();

        for name in names {
            let handlers = Arc::clone(&self.handlers);
            let event = name.clone();
            builder = builder.on(name.as_str(), move |payload, _socket| {
                deliver(&handlers, &event, first_value(payload))
            });
        }

        builder
    }
}

/// Route one arrival to whatever handler is currently subscribed.
fn deliver(handlers: &Handlers, event: &str, value: Option<Value>) -> BoxFuture<'static, ()> {
    let handler = handlers.get(event).map(|h| Arc::clone(h.value()));
    let event = event.to_string();
    async move {
        match (handler, value) {
            (Some(handler), Some(v)) => handler(v).await,
            (None, _) => tracing::debug!(%event, "no subscription, event ignored"),
            (Some(_), None) => tracing::warn!(%event, "non-json payload ignored"),
        }
    }
    .boxed()
}

/// Socket.IO delivers argument lists; envelopes are the first argument.
fn first_value(payload: Payload) -> Option<Value> {
    match payload {
        Payload::Text(values) => values.into_iter().next(),
        _ => None,
    }
}

#[async_trait]
impl Channel for SocketIoChannel {
    fn on(&self, event: &str, handler: EventHandler) {
        self.handlers.insert(event.to_string(), handler);
    }

    async fn connect(&self, address: &str) -> Result<()> {
        let socket = self
            .builder(address)
            .connect()
            .await
            .map_err(|e| HashiError::Network(format!("connect to {address} failed: {e}")))?;

        *self.socket.lock().await = Some(socket);
        tracing::info!(%address, "connection established");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    async fn emit(&self, event: &str, data: Value, ack: Option<AckHandler>) -> Result<()> {
        let socket = self
            .socket
            .lock()
            .await
            .clone()
            .ok_or_else(|| HashiError::Network("channel is not connected".into()))?;

        let sent = match ack {
            None => socket.emit(event, data).await,
            Some(ack) => {
                socket
                    .emit_with_ack(event, data, ACK_TIMEOUT, move |payload, _socket| {
                        let ack = Arc::clone(&ack);
                        async move {
                            ack(first_value(payload).unwrap_or(Value::Null));
                        }
                        .boxed()
                    })
                    .await
            }
        };
        sent.map_err(|e| HashiError::Network(format!("emit {event} failed: {e}")))
    }

    async fn wait(&self) -> Result<()> {
        let mut rx = self.connected.subscribe();
        rx.wait_for(|connected| !*connected)
            .await
            .map(|_| ())
            .map_err(|_| HashiError::Internal("connection state dropped".into()))
    }

    async fn disconnect(&self) -> Result<()> {
        let socket = self.socket.lock().await.take();
        self.connected.send_replace(false);
        if let Some(socket) = socket {
            socket
                .disconnect()
                .await
                .map_err(|e| HashiError::Network(format!("disconnect failed: {e}")))?;
            tracing::info!("channel disconnected");
        }
        Ok(())
    }
}
