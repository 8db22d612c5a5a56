//! In-memory channel shared by the client tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::sync::Notify;

use hashi_client::channel::{AckHandler, Channel, EventHandler, CONNECT, DISCONNECT};
use hashi_core::error::{HashiError, Result};

#[derive(Default)]
pub struct MockChannel {
    handlers: DashMap<String, EventHandler>,
    connected: AtomicBool,
    refuse_connect: AtomicBool,
    closed: Notify,
    pub emitted: Mutex<Vec<(String, Value)>>,
    pub disconnects: Mutex<u32>,
}

impl MockChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refusing() -> Arc<Self> {
        let ch = Self::default();
        ch.refuse_connect.store(true, Ordering::SeqCst);
        Arc::new(ch)
    }

    pub fn set_connected(&self, up: bool) {
        self.connected.store(up, Ordering::SeqCst);
    }

    pub fn subscribed(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Deliver `data` as the gateway would and wait for the handler.
    pub async fn fire(&self, event: &str, data: Value) {
        let handler = self
            .handlers
            .get(event)
            .map(|h| Arc::clone(h.value()))
            .unwrap_or_else(|| panic!("no subscription for {event}"));
        handler(data).await;
    }

    /// Simulate the gateway closing the connection.
    pub async fn close(&self) {
        self.set_connected(false);
        if self.handlers.contains_key(DISCONNECT) {
            self.fire(DISCONNECT, Value::Null).await;
        }
        self.closed.notify_waiters();
    }

    pub fn emits(&self) -> Vec<(String, Value)> {
        self.emitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn on(&self, event: &str, handler: EventHandler) {
        self.handlers.insert(event.to_string(), handler);
    }

    async fn connect(&self, _address: &str) -> Result<()> {
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(HashiError::Network("connection refused".into()));
        }
        self.set_connected(true);
        if self.handlers.contains_key(CONNECT) {
            self.fire(CONNECT, Value::Null).await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn emit(&self, event: &str, data: Value, ack: Option<AckHandler>) -> Result<()> {
        self.emitted.lock().unwrap().push((event.to_string(), data));
        if let Some(ack) = ack {
            ack(json!("ok"));
        }
        Ok(())
    }

    async fn wait(&self) -> Result<()> {
        let closed = self.closed.notified();
        if !self.is_connected() {
            return Ok(());
        }
        closed.await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.set_connected(false);
        *self.disconnects.lock().unwrap() += 1;
        Ok(())
    }
}

pub fn friend_envelope(current: i64, from: i64, content: &str) -> Value {
    json!({
        "CurrentPacket": {
            "WebConnId": "conn-1",
            "Data": {
                "FromUin": from,
                "ToUin": current,
                "MsgType": "TextMsg",
                "MsgSeq": 1,
                "Content": content,
                "RedBaginfo": null
            }
        },
        "CurrentQQ": current
    })
}

pub fn group_envelope(current: i64, group: i64, from: i64, content: &str) -> Value {
    json!({
        "CurrentPacket": {
            "WebConnId": "conn-1",
            "Data": {
                "FromGroupId": group,
                "FromGroupName": "test group",
                "FromUserId": from,
                "FromNickName": "someone",
                "MsgType": "TextMsg",
                "MsgSeq": 2,
                "MsgRandom": 99,
                "Content": content
            }
        },
        "CurrentQQ": current
    })
}

pub fn event_envelope(current: i64, from: i64, to: i64) -> Value {
    json!({
        "CurrentPacket": {
            "WebConnId": "conn-1",
            "Data": {
                "EventName": "ON_EVENT_FRIEND_ADDED",
                "EventData": { "UserID": from },
                "EventMsg": {
                    "FromUin": from,
                    "ToUin": to,
                    "MsgType": "ON_EVENT_FRIEND_ADDED",
                    "MsgSeq": 3,
                    "Content": "friend added"
                }
            }
        },
        "CurrentQQ": current
    })
}
