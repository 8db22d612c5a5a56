//! Inbound protocol: envelope framing, field schemas, and typed messages.
//!
//! The gateway wraps every message in a `CurrentPacket` frame. Processing is
//! always `flatten` -> `schema::validate` -> typed deserialize, and every step
//! reports problems as `ValidationFailure` instead of panicking.

pub mod envelope;
pub mod message;
pub mod schema;
