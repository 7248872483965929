//! Link registry: owns the set of channel ↔ item links.
//!
//! Subscribing does not replay existing links. Every mutation notifies the
//! listeners subscribed at the time of the change, synchronously, before
//! the call returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use linkhub_domain::channel::Channel;
use linkhub_domain::error::{LinkHubError, NotFoundError};
use linkhub_domain::id::SubscriptionId;
use linkhub_domain::item::Item;
use linkhub_domain::lifecycle::LifecycleState;
use linkhub_domain::link::ItemChannelLink;
use linkhub_domain::uid::ChannelUid;

use crate::listeners::Listeners;
use crate::ports::{ItemChannelLinker, Lifecycle, Provider, ProviderChangeListener};

#[derive(Debug, Default)]
struct State {
    lifecycle: LifecycleState,
    links: Vec<ItemChannelLink>,
    listeners: Listeners<ItemChannelLink>,
}

impl State {
    fn ensure_active(&self, operation: &'static str) -> Result<(), LinkHubError> {
        self.lifecycle.ensure_active(operation).map_err(|err| {
            tracing::warn!(error = %err, "link registry used outside its lifecycle");
            err.into()
        })
    }
}

/// In-memory registry of [`ItemChannelLink`]s.
///
/// Links and listeners share one mutex, so a mutation and the listener
/// snapshot it notifies are taken atomically. Notifications run after the
/// mutex is released; listeners may call back into the registry.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    state: Mutex<State>,
}

impl LinkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all current links, in creation order.
    #[must_use]
    pub fn get_all(&self) -> Vec<ItemChannelLink> {
        self.lock().links.clone()
    }

    /// Links whose item name is exactly `item_name`.
    #[must_use]
    pub fn links_for_item(&self, item_name: &str) -> Vec<ItemChannelLink> {
        self.lock()
            .links
            .iter()
            .filter(|link| link.item_name == item_name)
            .cloned()
            .collect()
    }

    /// Links of the channel `channel_uid`.
    #[must_use]
    pub fn links_for_channel(&self, channel_uid: &ChannelUid) -> Vec<ItemChannelLink> {
        self.lock()
            .links
            .iter()
            .filter(|link| &link.channel_uid == channel_uid)
            .cloned()
            .collect()
    }

    /// Link `channel` with `item`.
    ///
    /// No duplicate check is made: linking the same pair twice stores two
    /// links and notifies twice.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Precondition`] when the registry is not active.
    pub fn link(&self, channel: &Channel, item: &Item) -> Result<ItemChannelLink, LinkHubError> {
        let link = ItemChannelLink::new(item.name.clone(), channel.uid.clone());
        let listeners = {
            let mut state = self.lock();
            state.ensure_active("link")?;
            state.links.push(link.clone());
            state.listeners.snapshot()
        };
        tracing::debug!(%link, "link added");
        listeners.notify_added(&link);
        Ok(link)
    }

    /// Drop the link between `channel` and `item` (exact name and uid match).
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::NotFound`] when no such link exists; nothing
    /// is notified in that case.
    pub fn unlink(&self, channel: &Channel, item: &Item) -> Result<ItemChannelLink, LinkHubError> {
        let (link, listeners) = {
            let mut state = self.lock();
            state.ensure_active("unlink")?;
            let position = state
                .links
                .iter()
                .position(|link| link.connects(&item.name, &channel.uid));
            let Some(position) = position else {
                drop(state);
                tracing::warn!(
                    channel = %channel.uid,
                    item = %item.name,
                    "no link found for channel and item"
                );
                return Err(NotFoundError {
                    entity: "Link",
                    id: format!("{} -> {}", item.name, channel.uid),
                }
                .into());
            };
            let link = state.links.remove(position);
            (link, state.listeners.snapshot())
        };
        tracing::debug!(%link, "link removed");
        listeners.notify_removed(&link);
        Ok(link)
    }

    /// Drop every link of `channel`, notifying once per link in the order
    /// the links were created.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::NotFound`] when the channel has no link.
    pub fn unlink_all(&self, channel: &Channel) -> Result<Vec<ItemChannelLink>, LinkHubError> {
        let (removed, listeners) = {
            let mut state = self.lock();
            state.ensure_active("unlink_all")?;
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.links)
                .into_iter()
                .partition(|link| link.channel_uid == channel.uid);
            state.links = kept;
            if removed.is_empty() {
                drop(state);
                tracing::warn!(channel = %channel.uid, "no links found for channel");
                return Err(NotFoundError {
                    entity: "Link",
                    id: channel.uid.to_string(),
                }
                .into());
            }
            (removed, state.listeners.snapshot())
        };
        for link in &removed {
            tracing::debug!(%link, "link removed");
            listeners.notify_removed(link);
        }
        Ok(removed)
    }
}

impl Provider<ItemChannelLink> for LinkRegistry {
    fn get_all(&self) -> Vec<ItemChannelLink> {
        LinkRegistry::get_all(self)
    }

    /// Subscribes without replaying existing links.
    fn add_provider_change_listener(
        &self,
        listener: Arc<dyn ProviderChangeListener<ItemChannelLink>>,
    ) -> SubscriptionId {
        self.lock().listeners.subscribe(listener)
    }

    fn remove_provider_change_listener(&self, id: SubscriptionId) -> bool {
        self.lock().listeners.unsubscribe(id)
    }
}

impl ItemChannelLinker for LinkRegistry {
    fn link(&self, channel: &Channel, item: &Item) -> Result<ItemChannelLink, LinkHubError> {
        LinkRegistry::link(self, channel, item)
    }

    fn unlink(&self, channel: &Channel, item: &Item) -> Result<ItemChannelLink, LinkHubError> {
        LinkRegistry::unlink(self, channel, item)
    }

    fn unlink_all(&self, channel: &Channel) -> Result<Vec<ItemChannelLink>, LinkHubError> {
        LinkRegistry::unlink_all(self, channel)
    }
}

impl Lifecycle for LinkRegistry {
    fn activate(&self) -> Result<(), LinkHubError> {
        self.lock().lifecycle.activate()?;
        tracing::info!("link registry activated");
        Ok(())
    }

    /// Drops every link and listener without notifying.
    fn deactivate(&self) -> Result<(), LinkHubError> {
        let mut state = self.lock();
        state.lifecycle.deactivate()?;
        let links = state.links.len();
        state.links.clear();
        let listeners = state.listeners.clear();
        drop(state);
        tracing::info!(links, listeners, "link registry deactivated");
        Ok(())
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.lock().lifecycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Change;
    use linkhub_domain::error::PreconditionError;
    use linkhub_domain::item::ItemKind;
    use linkhub_domain::uid::ThingUid;

    #[derive(Default)]
    struct Recorder {
        changes: Mutex<Vec<Change<ItemChannelLink>>>,
    }

    impl Recorder {
        fn changes(&self) -> Vec<Change<ItemChannelLink>> {
            self.changes.lock().unwrap().clone()
        }
    }

    impl ProviderChangeListener<ItemChannelLink> for Recorder {
        fn added(&self, element: &ItemChannelLink) {
            self.changes
                .lock()
                .unwrap()
                .push(Change::Added(element.clone()));
        }

        fn removed(&self, element: &ItemChannelLink) {
            self.changes
                .lock()
                .unwrap()
                .push(Change::Removed(element.clone()));
        }
    }

    fn channel(id: &str) -> Channel {
        let uid = ThingUid::new("acme", "sensor", "s1")
            .unwrap()
            .channel(id)
            .unwrap();
        Channel::new(uid, "Number")
    }

    fn item(name: &str) -> Item {
        Item::new(name, ItemKind::Number).unwrap()
    }

    fn active_registry() -> (LinkRegistry, Arc<Recorder>) {
        let registry = LinkRegistry::new();
        registry.activate().unwrap();
        let recorder = Arc::new(Recorder::default());
        registry.add_provider_change_listener(recorder.clone());
        (registry, recorder)
    }

    #[test]
    fn should_store_link_and_notify_added() {
        let (registry, recorder) = active_registry();

        let link = registry.link(&channel("temp"), &item("t")).unwrap();

        assert_eq!(registry.get_all(), vec![link.clone()]);
        assert_eq!(recorder.changes(), vec![Change::Added(link)]);
    }

    #[test]
    fn should_store_duplicate_links_when_linking_twice() {
        let (registry, recorder) = active_registry();

        registry.link(&channel("temp"), &item("t")).unwrap();
        registry.link(&channel("temp"), &item("t")).unwrap();

        assert_eq!(registry.get_all().len(), 2);
        assert_eq!(recorder.changes().len(), 2);
    }

    #[test]
    fn should_remove_link_and_notify_removed() {
        let (registry, recorder) = active_registry();
        let link = registry.link(&channel("temp"), &item("t")).unwrap();

        let removed = registry.unlink(&channel("temp"), &item("t")).unwrap();

        assert_eq!(removed, link);
        assert!(registry.get_all().is_empty());
        assert_eq!(
            recorder.changes(),
            vec![Change::Added(link.clone()), Change::Removed(link)]
        );
    }

    #[test]
    fn should_leave_state_untouched_when_unlinking_missing_pair() {
        let (registry, recorder) = active_registry();
        registry.link(&channel("temp"), &item("t")).unwrap();

        let result = registry.unlink(&channel("temp"), &item("other"));

        assert!(matches!(result, Err(LinkHubError::NotFound(_))));
        assert_eq!(registry.get_all().len(), 1);
        assert_eq!(recorder.changes().len(), 1);
    }

    #[test]
    fn should_match_item_name_exactly_when_unlinking() {
        let (registry, _) = active_registry();
        registry.link(&channel("temp"), &item("Temp")).unwrap();

        let result = registry.unlink(&channel("temp"), &item("temp"));

        assert!(matches!(result, Err(LinkHubError::NotFound(_))));
    }

    #[test]
    fn should_unlink_all_links_of_channel_in_creation_order() {
        let (registry, recorder) = active_registry();
        let first = registry.link(&channel("temp"), &item("a")).unwrap();
        let other = registry.link(&channel("humidity"), &item("b")).unwrap();
        let second = registry.link(&channel("temp"), &item("c")).unwrap();

        let removed = registry.unlink_all(&channel("temp")).unwrap();

        assert_eq!(removed, vec![first.clone(), second.clone()]);
        assert_eq!(registry.get_all(), vec![other.clone()]);
        let removals: Vec<_> = recorder
            .changes()
            .into_iter()
            .filter(Change::is_removed)
            .collect();
        assert_eq!(removals, vec![Change::Removed(first), Change::Removed(second)]);
    }

    #[test]
    fn should_not_notify_when_unlink_all_matches_nothing() {
        let (registry, recorder) = active_registry();
        registry.link(&channel("temp"), &item("a")).unwrap();

        let result = registry.unlink_all(&channel("humidity"));

        assert!(matches!(result, Err(LinkHubError::NotFound(_))));
        assert_eq!(registry.get_all().len(), 1);
        assert_eq!(recorder.changes().len(), 1);
    }

    #[test]
    fn should_not_replay_existing_links_to_new_subscriber() {
        let (registry, _) = active_registry();
        registry.link(&channel("temp"), &item("a")).unwrap();

        let late = Arc::new(Recorder::default());
        registry.add_provider_change_listener(late.clone());

        assert!(late.changes().is_empty());
    }

    #[test]
    fn should_stop_notifying_removed_listener() {
        let (registry, recorder) = active_registry();
        let extra = Arc::new(Recorder::default());
        let id = registry.add_provider_change_listener(extra.clone());

        assert!(registry.remove_provider_change_listener(id));
        registry.link(&channel("temp"), &item("a")).unwrap();

        assert!(extra.changes().is_empty());
        assert_eq!(recorder.changes().len(), 1);
    }

    #[test]
    fn should_query_links_by_item_and_channel() {
        let (registry, _) = active_registry();
        registry.link(&channel("temp"), &item("a")).unwrap();
        registry.link(&channel("humidity"), &item("a")).unwrap();
        registry.link(&channel("temp"), &item("b")).unwrap();

        assert_eq!(registry.links_for_item("a").len(), 2);
        assert_eq!(registry.links_for_channel(&channel("temp").uid).len(), 2);
        assert!(registry.links_for_item("A").is_empty());
    }

    #[test]
    fn should_refuse_mutations_before_activation() {
        let registry = LinkRegistry::new();

        let result = registry.link(&channel("temp"), &item("a"));

        assert!(matches!(
            result,
            Err(LinkHubError::Precondition(PreconditionError::Inactive {
                operation: "link",
                ..
            }))
        ));
        assert!(registry.get_all().is_empty());
    }

    #[test]
    fn should_drop_links_and_refuse_mutations_after_deactivation() {
        let (registry, recorder) = active_registry();
        registry.link(&channel("temp"), &item("a")).unwrap();

        registry.deactivate().unwrap();

        assert_eq!(registry.lifecycle_state(), LifecycleState::Deactivated);
        assert!(registry.get_all().is_empty());
        assert!(registry.link(&channel("temp"), &item("b")).is_err());
        assert_eq!(recorder.changes().len(), 1);
    }

    #[test]
    fn should_allow_listener_to_call_back_into_registry() {
        struct Echo {
            registry: Arc<LinkRegistry>,
            seen: Mutex<usize>,
        }

        impl ProviderChangeListener<ItemChannelLink> for Echo {
            fn added(&self, _element: &ItemChannelLink) {
                *self.seen.lock().unwrap() = self.registry.get_all().len();
            }

            fn removed(&self, _element: &ItemChannelLink) {}
        }

        let registry = Arc::new(LinkRegistry::new());
        registry.activate().unwrap();
        let echo = Arc::new(Echo {
            registry: Arc::clone(&registry),
            seen: Mutex::new(0),
        });
        registry.add_provider_change_listener(echo.clone());

        registry.link(&channel("temp"), &item("a")).unwrap();

        assert_eq!(*echo.seen.lock().unwrap(), 1);
        registry.deactivate().unwrap();
    }

    #[test]
    fn should_keep_every_surviving_link_under_concurrent_mutation() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 25;

        let (registry, recorder) = active_registry();

        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let registry = &registry;
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        let ch = channel(&format!("c{t}x{i}"));
                        let it = item(&format!("i{t}x{i}"));
                        registry.link(&ch, &it).unwrap();
                        if i % 2 == 0 {
                            registry.unlink(&ch, &it).unwrap();
                        }
                    }
                });
            }
        });

        let survivors = THREADS * (PER_THREAD / 2);
        let removed = THREADS * PER_THREAD.div_ceil(2);
        assert_eq!(registry.get_all().len(), survivors);
        let changes = recorder.changes();
        assert_eq!(changes.iter().filter(|c| c.is_added()).count(), THREADS * PER_THREAD);
        assert_eq!(changes.iter().filter(|c| c.is_removed()).count(), removed);
        for link in registry.get_all() {
            let added = changes
                .iter()
                .filter(|c| **c == Change::Added(link.clone()))
                .count();
            assert_eq!(added, 1);
        }
    }
}
