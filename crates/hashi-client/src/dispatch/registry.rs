use std::sync::{PoisonError, RwLock};

use hashi_core::{EventMessage, FriendMessage, GroupMessage};

use super::listener::Listener;

/// Append-only, ordered listener list for one message kind.
pub struct ListenerRegistry<M> {
    listeners: RwLock<Vec<Listener<M>>>,
}

impl<M> Default for ListenerRegistry<M> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }
}

impl<M> ListenerRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` and hand it back for chaining.
    pub fn register(&self, listener: Listener<M>) -> Listener<M> {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener.clone());
        listener
    }

    /// Copy of the current list, in registration order.
    pub fn snapshot(&self) -> Vec<Listener<M>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The three per-kind registries owned by a client.
#[derive(Default)]
pub struct Listeners {
    pub event: ListenerRegistry<EventMessage>,
    pub friend: ListenerRegistry<FriendMessage>,
    pub group: ListenerRegistry<GroupMessage>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }
}
