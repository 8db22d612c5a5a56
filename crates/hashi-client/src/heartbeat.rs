//! Liveness signal scheduler.
//!
//! `Idle -> Running` on `start()`, `Running -> Idle` on `stop()` or when a
//! tick finds the channel disconnected. Every `interval` ticks while running,
//! `GetWebConn` is emitted with the account as a string. A failed emit is
//! logged and the schedule continues.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use hashi_core::error::Result;

use crate::channel::{AckHandler, Channel};

/// Event name of the liveness signal.
pub const LIVENESS_EVENT: &str = "GetWebConn";

/// Resolution of the connectivity check.
pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatState {
    Idle,
    Running,
}

pub struct HeartbeatScheduler {
    channel: Arc<dyn Channel>,
    account: i64,
    /// Emit every `interval` ticks.
    interval: u64,
    tick: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatScheduler {
    /// `interval` must be positive; config validation guarantees it.
    pub fn new(channel: Arc<dyn Channel>, account: i64, interval: u64) -> Self {
        Self::with_tick(channel, account, interval, TICK)
    }

    pub fn with_tick(channel: Arc<dyn Channel>, account: i64, interval: u64, tick: Duration) -> Self {
        Self {
            channel,
            account,
            interval: interval.max(1),
            tick,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> HeartbeatState {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        match task.as_ref() {
            Some(handle) if !handle.is_finished() => HeartbeatState::Running,
            _ => HeartbeatState::Idle,
        }
    }

    /// Spawn the tick loop. Returns false if already running.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(task.as_ref(), Some(handle) if !handle.is_finished()) {
            return false;
        }

        let channel = Arc::clone(&self.channel);
        let (account, interval, tick) = (self.account, self.interval, self.tick);
        *task = Some(tokio::spawn(async move {
            run(channel, account, interval, tick).await;
        }));
        true
    }

    pub fn stop(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = task {
            handle.abort();
            tracing::debug!("heartbeat scheduler stopped");
        }
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(channel: Arc<dyn Channel>, account: i64, interval: u64, tick: Duration) {
    tracing::info!(interval, "heartbeat scheduler started");

    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for i in 0u64.. {
        ticker.tick().await;
        if !channel.is_connected() {
            tracing::info!("channel disconnected, heartbeat scheduler exits");
            break;
        }
        if i % interval != 0 {
            continue;
        }
        match emit_liveness(channel.as_ref(), account).await {
            Ok(()) => tracing::info!("heartbeat pushed to server"),
            Err(e) => tracing::warn!(error = %e, "heartbeat emit failed"),
        }
    }
}

/// Emit one liveness signal; the acknowledgement is only logged.
pub async fn emit_liveness(channel: &dyn Channel, account: i64) -> Result<()> {
    let ack: AckHandler = Arc::new(|reply: Value| {
        tracing::debug!(?reply, "heartbeat acknowledged");
    });
    channel
        .emit(LIVENESS_EVENT, Value::String(account.to_string()), Some(ack))
        .await
}
