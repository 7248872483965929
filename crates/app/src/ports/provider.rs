//! Provider port: publish/subscribe for added/removed/updated elements.

use std::sync::Arc;

use linkhub_domain::id::SubscriptionId;

/// Receives change notifications from a [`Provider`].
///
/// Callbacks run synchronously on the thread that performed the change. A
/// slow listener therefore slows down the caller of the mutating operation.
pub trait ProviderChangeListener<E>: Send + Sync {
    /// `element` became available.
    fn added(&self, element: &E);

    /// `element` is gone.
    fn removed(&self, element: &E);

    /// `old` was replaced by `new`.
    fn updated(&self, _old: &E, _new: &E) {}
}

/// A source of elements that can be observed.
pub trait Provider<E> {
    /// Snapshot of every element currently provided.
    fn get_all(&self) -> Vec<E>;

    /// Subscribe to change notifications.
    ///
    /// Whether existing elements are replayed to the new listener is up to
    /// the implementation and documented there.
    fn add_provider_change_listener(
        &self,
        listener: Arc<dyn ProviderChangeListener<E>>,
    ) -> SubscriptionId;

    /// Unsubscribe. Returns `false` when `id` was not subscribed.
    fn remove_provider_change_listener(&self, id: SubscriptionId) -> bool;
}

/// A single change notification, as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<E> {
    Added(E),
    Removed(E),
    Updated { old: E, new: E },
}

impl<E> Change<E> {
    /// The element the change leaves behind (the new one for updates).
    #[must_use]
    pub fn element(&self) -> &E {
        match self {
            Self::Added(e) | Self::Removed(e) => e,
            Self::Updated { new, .. } => new,
        }
    }

    #[must_use]
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    #[must_use]
    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed(_))
    }
}
