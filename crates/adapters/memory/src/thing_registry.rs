//! Thing registry kept in memory, emitting topology events.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use linkhub_app::listeners::Listeners;
use linkhub_app::ports::{Provider, ProviderChangeListener};
use linkhub_domain::error::{LinkHubError, NotFoundError, ValidationError};
use linkhub_domain::id::SubscriptionId;
use linkhub_domain::thing::Thing;
use linkhub_domain::uid::ThingUid;

#[derive(Debug, Default)]
struct State {
    things: BTreeMap<ThingUid, Thing>,
    listeners: Listeners<Thing>,
}

/// Stand-in for the host's thing registry.
///
/// Listeners receive `added` / `updated` / `removed` after the registry
/// lock is released, so they may call back into the registry.
#[derive(Debug, Default)]
pub struct InMemoryThingRegistry {
    state: Mutex<State>,
}

impl InMemoryThingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new thing.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Validation`] when the thing is invalid or its
    /// UID is already registered.
    pub fn add(&self, thing: Thing) -> Result<(), LinkHubError> {
        thing.validate()?;
        let listeners = {
            let mut state = self.lock();
            if state.things.contains_key(&thing.uid) {
                return Err(ValidationError::DuplicateThing(thing.uid.to_string()).into());
            }
            state.things.insert(thing.uid.clone(), thing.clone());
            state.listeners.snapshot()
        };
        tracing::debug!(thing = %thing.uid, "thing registered");
        listeners.notify_added(&thing);
        Ok(())
    }

    /// Replace a registered thing, returning the previous version.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::NotFound`] when no thing has that UID, or
    /// [`LinkHubError::Validation`] when the new version is invalid.
    pub fn update(&self, thing: Thing) -> Result<Thing, LinkHubError> {
        thing.validate()?;
        let (old, listeners) = {
            let mut state = self.lock();
            let Some(slot) = state.things.get_mut(&thing.uid) else {
                return Err(not_found(&thing.uid));
            };
            let old = std::mem::replace(slot, thing.clone());
            (old, state.listeners.snapshot())
        };
        tracing::debug!(thing = %thing.uid, "thing updated");
        listeners.notify_updated(&old, &thing);
        Ok(old)
    }

    /// Unregister a thing, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::NotFound`] when no thing has that UID.
    pub fn remove(&self, uid: &ThingUid) -> Result<Thing, LinkHubError> {
        let (thing, listeners) = {
            let mut state = self.lock();
            let thing = state.things.remove(uid).ok_or_else(|| not_found(uid))?;
            (thing, state.listeners.snapshot())
        };
        tracing::debug!(thing = %uid, "thing unregistered");
        listeners.notify_removed(&thing);
        Ok(thing)
    }

    #[must_use]
    pub fn get(&self, uid: &ThingUid) -> Option<Thing> {
        self.lock().things.get(uid).cloned()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

fn not_found(uid: &ThingUid) -> LinkHubError {
    NotFoundError {
        entity: "Thing",
        id: uid.to_string(),
    }
    .into()
}

impl Provider<Thing> for InMemoryThingRegistry {
    /// Every registered thing, ordered by UID.
    fn get_all(&self) -> Vec<Thing> {
        self.lock().things.values().cloned().collect()
    }

    fn add_provider_change_listener(
        &self,
        listener: Arc<dyn ProviderChangeListener<Thing>>,
    ) -> SubscriptionId {
        self.lock().listeners.subscribe(listener)
    }

    fn remove_provider_change_listener(&self, id: SubscriptionId) -> bool {
        self.lock().listeners.unsubscribe(id)
    }
}
