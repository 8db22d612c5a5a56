//! Top-level facade crate for Hashi.
//!
//! Re-exports the message core and the client runtime so users can depend on a single crate.

pub mod core {
    pub use hashi_core::*;
}

pub mod client {
    pub use hashi_client::*;
}

pub use hashi_client::{Client, ClientConfig};
pub use hashi_core::{EventMessage, FriendMessage, GroupMessage, HashiError, Result};
