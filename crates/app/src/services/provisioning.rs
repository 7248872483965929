//! Provisioning engine: generates items for thing channels and links them.
//!
//! The engine owns the items it generated, the things it already processed
//! and the allow-list of bindings provisioned automatically. Collaborators
//! (linker, item registry, thing source) are attached by the host and may be
//! missing; every step that needs one is skipped when it is.
//!
//! Lock order: the engine state mutex and the collaborator lock are never
//! held together, and neither is held while a collaborator or a listener
//! runs.
//!
//! A new subscriber's replay is delivered after the state mutex is released.
//! A removal racing with the subscription can therefore reach the subscriber
//! before the replayed `added` of the same item, and a mirroring listener is
//! then left with a stale entry. Subscribe before provisioning starts.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use linkhub_domain::channel::Channel;
use linkhub_domain::error::LinkHubError;
use linkhub_domain::id::SubscriptionId;
use linkhub_domain::item::Item;
use linkhub_domain::item_factory;
use linkhub_domain::lifecycle::LifecycleState;
use linkhub_domain::naming::item_name_for;
use linkhub_domain::thing::Thing;
use linkhub_domain::uid::{ChannelUid, ThingUid};

use crate::listeners::{ListenerSnapshot, Listeners};
use crate::ports::{
    ItemChannelLinker, ItemLookup, Lifecycle, Provider, ProviderChangeListener, ThingSource,
};

/// Outcome of provisioning one thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub thing_uid: ThingUid,
    /// Items linked to the thing's channels, in channel order.
    pub items: Vec<Item>,
    /// Channels without an item, because their type is unsupported.
    pub skipped: Vec<ChannelUid>,
}

#[derive(Debug, Default)]
struct EngineState {
    lifecycle: LifecycleState,
    generated_items: BTreeMap<String, Item>,
    provisioned_things: HashSet<ThingUid>,
    auto_provision_bindings: Vec<String>,
    listeners: Listeners<Item>,
}

impl EngineState {
    fn ensure_active(&self, operation: &'static str) -> Result<(), LinkHubError> {
        self.lifecycle.ensure_active(operation).map_err(|err| {
            tracing::warn!(error = %err, "provisioning engine used outside its lifecycle");
            err.into()
        })
    }

    fn is_auto_provisioned(&self, binding_id: &str) -> bool {
        self.auto_provision_bindings
            .iter()
            .any(|binding| binding == binding_id)
    }
}

#[derive(Default)]
struct Collaborators {
    linker: Option<Arc<dyn ItemChannelLinker>>,
    item_registry: Option<Arc<dyn ItemLookup>>,
    thing_source: Option<(Arc<dyn ThingSource>, SubscriptionId)>,
}

/// Generates items for thing channels and keeps them linked.
#[derive(Default)]
pub struct ProvisioningEngine {
    state: Mutex<EngineState>,
    collaborators: RwLock<Collaborators>,
}

impl ProvisioningEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_collaborators<T>(&self, f: impl FnOnce(&Collaborators) -> T) -> T {
        let collaborators = self
            .collaborators
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&collaborators)
    }

    fn with_collaborators_mut<T>(&self, f: impl FnOnce(&mut Collaborators) -> T) -> T {
        let mut collaborators = self
            .collaborators
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut collaborators)
    }

    fn linker(&self) -> Option<Arc<dyn ItemChannelLinker>> {
        self.with_collaborators(|c| c.linker.clone())
    }

    fn item_registry(&self) -> Option<Arc<dyn ItemLookup>> {
        self.with_collaborators(|c| c.item_registry.clone())
    }

    fn thing_source(&self) -> Option<Arc<dyn ThingSource>> {
        self.with_collaborators(|c| c.thing_source.as_ref().map(|(source, _)| Arc::clone(source)))
    }

    // -- collaborators ------------------------------------------------------

    /// Set the linker used to link generated items with their channels.
    pub fn attach_linker(&self, linker: Arc<dyn ItemChannelLinker>) {
        self.with_collaborators_mut(|c| c.linker = Some(linker));
        tracing::debug!("item channel linker attached");
    }

    pub fn detach_linker(&self) {
        self.with_collaborators_mut(|c| c.linker = None);
        tracing::debug!("item channel linker detached");
    }

    /// Set the item registry consulted before generating an item.
    pub fn attach_item_registry(&self, registry: Arc<dyn ItemLookup>) {
        self.with_collaborators_mut(|c| c.item_registry = Some(registry));
        tracing::debug!("item registry attached");
    }

    pub fn detach_item_registry(&self) {
        self.with_collaborators_mut(|c| c.item_registry = None);
        tracing::debug!("item registry detached");
    }

    /// Subscribe to `source`'s topology events and provision every thing of
    /// an allow-listed binding it already holds.
    ///
    /// A previously attached source is detached first. The source keeps a
    /// handle on the engine until [`detach_thing_source`](Self::detach_thing_source)
    /// or [`deactivate`](Lifecycle::deactivate).
    pub fn attach_thing_source(self: &Arc<Self>, source: Arc<dyn ThingSource>) {
        self.detach_thing_source();
        let listener: Arc<dyn ProviderChangeListener<Thing>> = Arc::<Self>::clone(self);
        let subscription = source.add_provider_change_listener(listener);
        self.with_collaborators_mut(|c| c.thing_source = Some((Arc::clone(&source), subscription)));
        tracing::debug!("thing source attached");
        if self.is_active() {
            for thing in source.get_all() {
                self.auto_add_items(&thing);
            }
        }
    }

    /// Unsubscribe from the attached thing source, if any.
    pub fn detach_thing_source(&self) {
        let previous = self.with_collaborators_mut(|c| c.thing_source.take());
        if let Some((source, subscription)) = previous {
            source.remove_provider_change_listener(subscription);
            tracing::debug!("thing source detached");
        }
    }

    // -- queries ------------------------------------------------------------

    /// Whether [`activate`](Lifecycle::activate) ran and
    /// [`deactivate`](Lifecycle::deactivate) did not.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().lifecycle.is_active()
    }

    /// Every item generated by this engine, ordered by name.
    #[must_use]
    pub fn get_all(&self) -> Vec<Item> {
        self.lock().generated_items.values().cloned().collect()
    }

    /// A generated item by name, ignoring case. Items that only exist in the
    /// external item registry are not returned.
    #[must_use]
    pub fn get_item(&self, name: &str) -> Option<Item> {
        self.lock()
            .generated_items
            .values()
            .find(|item| item.name_matches(name))
            .cloned()
    }

    #[must_use]
    pub fn is_provisioned(&self, thing_uid: &ThingUid) -> bool {
        self.lock().provisioned_things.contains(thing_uid)
    }

    /// Bindings provisioned automatically, in registration order.
    #[must_use]
    pub fn auto_provision_bindings(&self) -> Vec<String> {
        self.lock().auto_provision_bindings.clone()
    }

    // -- provisioning -------------------------------------------------------

    /// Generate and link items for every channel of `thing`.
    ///
    /// Channels with an unsupported type are skipped with a warning; the
    /// remaining channels are still processed. When an item named after the
    /// channel already exists in the item registry it is reused.
    ///
    /// # Errors
    ///
    /// - [`LinkHubError::AlreadyProvisioned`] when `thing` was processed before
    /// - [`LinkHubError::Precondition`] when the engine is not active
    #[tracing::instrument(skip(self, thing), fields(thing = %thing.uid))]
    pub fn provide_items(&self, thing: &Thing) -> Result<ProvisionReport, LinkHubError> {
        {
            let mut state = self.lock();
            state.ensure_active("provide_items")?;
            if !state.provisioned_things.insert(thing.uid.clone()) {
                tracing::debug!("items already provided, generation skipped");
                return Err(LinkHubError::AlreadyProvisioned(thing.uid.clone()));
            }
        }

        tracing::debug!(channels = thing.channels.len(), "generating items");
        let mut report = ProvisionReport {
            thing_uid: thing.uid.clone(),
            items: Vec::with_capacity(thing.channels.len()),
            skipped: Vec::new(),
        };
        for channel in &thing.channels {
            match self.generate_item(channel) {
                Some(item) => {
                    self.link_channel_with_item(channel, &item);
                    report.items.push(item);
                }
                None => report.skipped.push(channel.uid.clone()),
            }
        }
        self.publish_added(&report.items);
        Ok(report)
    }

    /// Provision several things; things that fail are left out of the result.
    pub fn provide_items_for_things(&self, things: &[Thing]) -> Vec<ProvisionReport> {
        things
            .iter()
            .filter_map(|thing| self.provide_items(thing).ok())
            .collect()
    }

    /// Allow-list `binding_id` and provision every known thing of that binding.
    ///
    /// Registering a binding twice does nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Precondition`] when the engine is not active.
    #[tracing::instrument(skip(self))]
    pub fn provide_items_for_binding(
        &self,
        binding_id: &str,
    ) -> Result<Vec<ProvisionReport>, LinkHubError> {
        {
            let mut state = self.lock();
            state.ensure_active("provide_items_for_binding")?;
            if state.is_auto_provisioned(binding_id) {
                tracing::debug!("binding already provisioned automatically");
                return Ok(Vec::new());
            }
            state.auto_provision_bindings.push(binding_id.to_string());
        }

        let Some(source) = self.thing_source() else {
            tracing::debug!("no thing source attached, nothing to provision yet");
            return Ok(Vec::new());
        };
        let things: Vec<Thing> = source
            .get_all()
            .into_iter()
            .filter(|thing| thing.binding_id() == binding_id)
            .collect();
        Ok(self.provide_items_for_things(&things))
    }

    /// Remove the items and links of `thing`'s channels.
    ///
    /// Removal only runs when `thing` is **not** recorded as provisioned, and
    /// only when its binding is allow-listed. Things provisioned through
    /// [`provide_items`](Self::provide_items) are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Precondition`] when the engine is not active.
    #[tracing::instrument(skip(self, thing), fields(thing = %thing.uid))]
    pub fn remove_items(&self, thing: &Thing) -> Result<Vec<Item>, LinkHubError> {
        {
            let state = self.lock();
            state.ensure_active("remove_items")?;
            if state.provisioned_things.contains(&thing.uid) {
                tracing::debug!("thing is provisioned, automatic removal skipped");
                return Ok(Vec::new());
            }
        }
        Ok(self.auto_remove_items(thing))
    }

    /// Stop provisioning `binding_id` automatically.
    ///
    /// Items and links already generated for the binding are kept. Returns
    /// whether the binding was allow-listed.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Precondition`] when the engine is not active.
    #[tracing::instrument(skip(self))]
    pub fn remove_items_for_binding(&self, binding_id: &str) -> Result<bool, LinkHubError> {
        let mut state = self.lock();
        state.ensure_active("remove_items_for_binding")?;
        let before = state.auto_provision_bindings.len();
        state
            .auto_provision_bindings
            .retain(|binding| binding != binding_id);
        Ok(state.auto_provision_bindings.len() != before)
    }

    // -- internals ----------------------------------------------------------

    fn auto_add_items(&self, thing: &Thing) -> Option<ProvisionReport> {
        if !self.lock().is_auto_provisioned(thing.binding_id()) {
            return None;
        }
        self.provide_items(thing).ok()
    }

    fn auto_remove_items(&self, thing: &Thing) -> Vec<Item> {
        if !self.lock().is_auto_provisioned(thing.binding_id()) {
            return Vec::new();
        }
        thing
            .channels
            .iter()
            .filter_map(|channel| self.remove_channel(channel))
            .collect()
    }

    /// Resolve the item for `channel`: reuse a registry item with the
    /// generated name, otherwise ask the item factory.
    fn generate_item(&self, channel: &Channel) -> Option<Item> {
        let name = item_name_for(&channel.uid);
        // An existing item with this name is assumed to belong to the channel.
        if let Some(existing) = self.item_registry().and_then(|registry| registry.get(&name)) {
            tracing::debug!(item = %name, "reusing item already present in the item registry");
            return Some(existing);
        }
        match item_factory::create_item(&name, &channel.accepted_item_type) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(
                    channel = %channel.uid,
                    accepted_type = %channel.accepted_item_type,
                    error = %err,
                    "unable to generate item, channel skipped"
                );
                None
            }
        }
    }

    fn link_channel_with_item(&self, channel: &Channel, item: &Item) {
        let Some(linker) = self.linker() else {
            tracing::debug!(channel = %channel.uid, "no linker attached, link skipped");
            return;
        };
        if let Err(err) = linker.link(channel, item) {
            tracing::warn!(channel = %channel.uid, item = %item.name, error = %err, "linking failed");
        }
    }

    fn unlink_channel_with_item(&self, channel: &Channel, item: &Item) {
        if let Some(linker) = self.linker() {
            if let Err(err) = linker.unlink(channel, item) {
                tracing::debug!(channel = %channel.uid, item = %item.name, error = %err, "unlinking failed");
            }
        }
    }

    /// Unlink and drop the generated item of `channel`, if there is one.
    fn remove_channel(&self, channel: &Channel) -> Option<Item> {
        let item = self.get_item(&item_name_for(&channel.uid))?;
        self.unlink_channel_with_item(channel, &item);
        self.remove_item(&item)
    }

    fn remove_item(&self, item: &Item) -> Option<Item> {
        let (removed, listeners) = {
            let mut state = self.lock();
            let removed = state.generated_items.remove(&item.name)?;
            (removed, state.listeners.snapshot())
        };
        listeners.notify_removed(&removed);
        Some(removed)
    }

    /// Record `items` as generated and notify listeners about the new ones.
    fn publish_added(&self, items: &[Item]) {
        let mut added = Vec::new();
        let mut updated = Vec::new();
        let listeners = {
            let mut state = self.lock();
            for item in items {
                match state.generated_items.insert(item.name.clone(), item.clone()) {
                    None => added.push(item),
                    Some(previous) if &previous != item => updated.push((previous, item)),
                    Some(_) => {}
                }
            }
            state.listeners.snapshot()
        };
        for item in added {
            listeners.notify_added(item);
        }
        for (previous, item) in updated {
            listeners.notify_updated(&previous, item);
        }
    }

    fn on_thing_added(&self, thing: &Thing) {
        if let Some(report) = self.auto_add_items(thing) {
            tracing::info!(
                thing = %thing.uid,
                items = report.items.len(),
                skipped = report.skipped.len(),
                "thing provisioned"
            );
        }
    }

    /// Unlink and drop the items of a removed thing of an allow-listed
    /// binding, then forget it so a later re-add provisions it again. Things
    /// of other bindings stay recorded, keeping their links unique.
    fn on_thing_removed(&self, thing: &Thing) {
        {
            let state = self.lock();
            if state.ensure_active("thing_removed").is_err()
                || !state.is_auto_provisioned(thing.binding_id())
            {
                return;
            }
        }
        let removed = self.auto_remove_items(thing);
        self.lock().provisioned_things.remove(&thing.uid);
        if !removed.is_empty() {
            tracing::info!(thing = %thing.uid, items = removed.len(), "thing items removed");
        }
    }

    /// Apply the channel difference between `old` and `new` to a provisioned
    /// thing. A channel whose declared type changed is removed and generated
    /// again.
    fn on_thing_updated(&self, old: &Thing, new: &Thing) {
        if old.uid != new.uid {
            self.on_thing_removed(old);
            self.on_thing_added(new);
            return;
        }
        {
            let state = self.lock();
            if state.ensure_active("thing_updated").is_err() {
                return;
            }
            if !state.is_auto_provisioned(new.binding_id())
                || !state.provisioned_things.contains(&new.uid)
            {
                return;
            }
        }

        let unchanged = |channel: &Channel, other: &Thing| {
            other
                .channel(&channel.uid)
                .is_some_and(|c| c.accepted_item_type == channel.accepted_item_type)
        };

        let mut removed = 0;
        for channel in old.channels.iter().filter(|c| !unchanged(*c, new)) {
            if self.remove_channel(channel).is_some() {
                removed += 1;
            }
        }

        let mut items = Vec::new();
        for channel in new.channels.iter().filter(|c| !unchanged(*c, old)) {
            if let Some(item) = self.generate_item(channel) {
                self.link_channel_with_item(channel, &item);
                items.push(item);
            }
        }
        self.publish_added(&items);
        tracing::info!(thing = %new.uid, added = items.len(), removed, "thing channels updated");
    }

    fn replay(listeners: &ListenerSnapshot<Item>, items: &[Item]) {
        for item in items {
            listeners.notify_added(item);
        }
    }
}

impl Provider<Item> for ProvisioningEngine {
    fn get_all(&self) -> Vec<Item> {
        ProvisioningEngine::get_all(self)
    }

    /// Subscribes and immediately replays every generated item as `added`.
    fn add_provider_change_listener(
        &self,
        listener: Arc<dyn ProviderChangeListener<Item>>,
    ) -> SubscriptionId {
        let (id, items) = {
            let mut state = self.lock();
            let id = state.listeners.subscribe(Arc::clone(&listener));
            (id, state.generated_items.values().cloned().collect::<Vec<_>>())
        };
        Self::replay(&ListenerSnapshot::single(listener), &items);
        id
    }

    fn remove_provider_change_listener(&self, id: SubscriptionId) -> bool {
        self.lock().listeners.unsubscribe(id)
    }
}

/// Topology events from the thing source.
impl ProviderChangeListener<Thing> for ProvisioningEngine {
    fn added(&self, element: &Thing) {
        tracing::debug!(thing = %element.uid, "thing added");
        self.on_thing_added(element);
    }

    fn removed(&self, element: &Thing) {
        tracing::debug!(thing = %element.uid, "thing removed");
        self.on_thing_removed(element);
    }

    fn updated(&self, old: &Thing, new: &Thing) {
        tracing::debug!(thing = %new.uid, "thing updated");
        self.on_thing_updated(old, new);
    }
}

impl Lifecycle for ProvisioningEngine {
    fn activate(&self) -> Result<(), LinkHubError> {
        self.lock().lifecycle.activate()?;
        tracing::info!("provisioning engine activated");
        Ok(())
    }

    /// Detaches every collaborator and drops items, things, bindings and
    /// listeners without notifying.
    fn deactivate(&self) -> Result<(), LinkHubError> {
        let (items, things) = {
            let mut state = self.lock();
            state.lifecycle.deactivate()?;
            let items = std::mem::take(&mut state.generated_items).len();
            let things = std::mem::take(&mut state.provisioned_things).len();
            state.auto_provision_bindings.clear();
            state.listeners.clear();
            (items, things)
        };
        self.detach_thing_source();
        self.detach_linker();
        self.detach_item_registry();
        tracing::info!(items, things, "provisioning engine deactivated");
        Ok(())
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.lock().lifecycle
    }
}
