//! Real-time channel boundary.
//!
//! The client only needs event subscription, emit, and lifecycle primitives
//! from the transport. `SocketIoChannel` provides them over Socket.IO; tests
//! plug in an in-memory implementation.

pub mod socketio;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::Value;

use hashi_core::error::Result;

pub use socketio::SocketIoChannel;

/// Lifecycle event fired once the channel is open.
pub const CONNECT: &str = "connect";
/// Lifecycle event fired once the channel is closed.
pub const DISCONNECT: &str = "disconnect";

/// Subscription callback. Lifecycle events receive `Value::Null`.
pub type EventHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Acknowledgement callback for an emit.
pub type AckHandler = Arc<dyn Fn(Value) + Send + Sync>;

#[async_trait]
pub trait Channel: Send + Sync {
    /// Subscribe to a named event. A later subscription replaces an earlier
    /// one. Event names must be subscribed before `connect`; replacing the
    /// handler of an already-subscribed name works at any time.
    fn on(&self, event: &str, handler: EventHandler);

    /// Open the channel. Transport failures surface as `HashiError::Network`.
    async fn connect(&self, address: &str) -> Result<()>;

    fn is_connected(&self) -> bool;

    async fn emit(&self, event: &str, data: Value, ack: Option<AckHandler>) -> Result<()>;

    /// Resolve once the channel reports closed.
    async fn wait(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}
