//! Listener registration and envelope dispatch.
//!
//! Re-exports the dispatcher, registries, and listener types so downstream
//! consumers can depend on this module directly.

pub mod dispatcher;
pub mod listener;
pub mod registry;

pub use dispatcher::{DispatchReport, EnvelopeDispatcher};
pub use listener::{Listener, ListenerError, ListenerFailure, ListenerResult};
pub use registry::{ListenerRegistry, Listeners};
