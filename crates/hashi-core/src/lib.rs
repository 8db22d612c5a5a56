//! Hashi core: transport-agnostic message shapes, envelope handling, and errors.
//!
//! This crate defines the inbound message contracts of the bot gateway and the
//! error surface shared by the client runtime. It carries no transport or
//! runtime dependencies so the schema can be validated and tested in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed envelopes
//! surface as `ValidationFailure` values so a hostile or buggy gateway cannot
//! crash the embedding process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{HashiError, Result, ValidationFailure};
pub use protocol::message::{
    EventMessage, FriendMessage, GroupMessage, InboundMessage, Message, MessageKind,
};
