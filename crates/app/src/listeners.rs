//! Subscription manager shared by every provider.
//!
//! [`Listeners`] is plain data meant to live inside the owner's mutex next to
//! the state it describes. A mutation takes a [`ListenerSnapshot`] while
//! still holding the lock, releases the lock, and only then notifies. Each
//! listener subscribed at the time of the change is called exactly once, and
//! listeners never run under the owner's lock.

use std::fmt;
use std::sync::Arc;

use linkhub_domain::id::SubscriptionId;

use crate::ports::ProviderChangeListener;

/// Ordered set of subscribed listeners.
pub struct Listeners<E> {
    entries: Vec<(SubscriptionId, Arc<dyn ProviderChangeListener<E>>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; it is notified after every listener already present.
    pub fn subscribe(&mut self, listener: Arc<dyn ProviderChangeListener<E>>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.entries.push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` when `id` is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Drop every listener, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy the current listener handles, in subscription order.
    #[must_use]
    pub fn snapshot(&self) -> ListenerSnapshot<E> {
        ListenerSnapshot {
            listeners: self
                .entries
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect(),
        }
    }
}

/// Listener handles captured under the owner's lock.
pub struct ListenerSnapshot<E> {
    listeners: Vec<Arc<dyn ProviderChangeListener<E>>>,
}

impl<E> ListenerSnapshot<E> {
    /// A snapshot holding a single listener, used for replays.
    #[must_use]
    pub fn single(listener: Arc<dyn ProviderChangeListener<E>>) -> Self {
        Self {
            listeners: vec![listener],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn notify_added(&self, element: &E) {
        for listener in &self.listeners {
            listener.added(element);
        }
    }

    pub fn notify_removed(&self, element: &E) {
        for listener in &self.listeners {
            listener.removed(element);
        }
    }

    pub fn notify_updated(&self, old: &E, new: &E) {
        for listener in &self.listeners {
            listener.updated(old, new);
        }
    }
}
