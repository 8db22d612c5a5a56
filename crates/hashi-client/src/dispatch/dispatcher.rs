use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::Mutex;

use hashi_core::error::ValidationFailure;
use hashi_core::protocol::envelope;
use hashi_core::{InboundMessage, MessageKind};

use super::listener::ListenerFailure;
use super::registry::{ListenerRegistry, Listeners};

/// What happened to one channel event.
#[derive(Debug)]
pub enum DispatchReport {
    /// Envelope did not match the schema for its kind; nothing was invoked.
    Rejected(ValidationFailure),
    /// The bot's own message echoed back; nothing was invoked.
    SelfAuthored,
    Delivered {
        total: usize,
        failures: Vec<ListenerFailure>,
    },
}

impl DispatchReport {
    /// Number of listeners invoked.
    pub fn invoked(&self) -> usize {
        match self {
            DispatchReport::Delivered { total, .. } => *total,
            _ => 0,
        }
    }

    pub fn failed(&self) -> usize {
        match self {
            DispatchReport::Delivered { failures, .. } => failures.len(),
            _ => 0,
        }
    }
}

/// Serialises dispatches of one kind so they finish in arrival order.
/// `tokio::sync::Mutex` hands out the lock FIFO.
#[derive(Default)]
struct Gates {
    event: Mutex<()>,
    friend: Mutex<()>,
    group: Mutex<()>,
}

/// Turns raw channel envelopes into listener invocations.
///
/// Per event: flatten -> validate -> self-echo check -> snapshot -> invoke
/// every listener concurrently -> log failures. Nothing in here returns an
/// error to the channel; all per-message problems end at this boundary.
pub struct EnvelopeDispatcher {
    listeners: Arc<Listeners>,
    gates: Gates,
}

impl EnvelopeDispatcher {
    pub fn new(listeners: Arc<Listeners>) -> Self {
        Self {
            listeners,
            gates: Gates::default(),
        }
    }

    pub async fn dispatch(&self, kind: MessageKind, envelope: Value) -> DispatchReport {
        let started = Instant::now();
        let report = match kind {
            MessageKind::Event => {
                let _turn = self.gates.event.lock().await;
                deliver(&self.listeners.event, envelope).await
            }
            MessageKind::Friend => {
                let _turn = self.gates.friend.lock().await;
                deliver(&self.listeners.friend, envelope).await
            }
            MessageKind::Group => {
                let _turn = self.gates.group.lock().await;
                deliver(&self.listeners.group, envelope).await
            }
        };
        tracing::trace!(
            %kind,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "dispatch finished"
        );
        report
    }
}

async fn deliver<M: InboundMessage>(registry: &ListenerRegistry<M>, envelope: Value) -> DispatchReport {
    let kind = M::KIND;

    let message = match envelope::flatten(envelope).and_then(|flat| M::parse(&flat)) {
        Ok(m) => m,
        Err(failure) => {
            tracing::error!(%kind, path = %failure.path, reason = %failure.reason, "message serialization failed");
            return DispatchReport::Rejected(failure);
        }
    };

    if message.is_self_authored() {
        return DispatchReport::SelfAuthored;
    }

    tracing::info!(target: "hashi::message", %kind, "{}", message.summary());

    let listeners = registry.snapshot();
    let outcomes = join_all(listeners.iter().map(|l| l.invoke(message.clone()))).await;

    let total = outcomes.len();
    let failures: Vec<ListenerFailure> = outcomes.into_iter().filter_map(Result::err).collect();
    for f in &failures {
        tracing::error!(%kind, listener = %f.listener, error = %f.error, "listener failed");
    }

    tracing::debug!(%kind, total, failed = failures.len(), "handled {} message", kind);

    DispatchReport::Delivered { total, failures }
}
