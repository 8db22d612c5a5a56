//! Hashi client library entry.
//!
//! This crate wires the real-time channel, envelope dispatcher, listener
//! registries, heartbeat scheduler, and action caller into one client. It is
//! consumed by the demo binary (`main.rs`) and by integration tests.

pub mod api;
pub mod channel;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod heartbeat;
pub mod obs;

pub use client::Client;
pub use config::ClientConfig;
