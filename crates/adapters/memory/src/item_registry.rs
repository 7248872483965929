//! Item registry kept in memory.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use linkhub_app::ports::{ItemLookup, ProviderChangeListener};
use linkhub_domain::item::Item;

/// Stand-in for the host's item registry.
///
/// Items can be registered up front (items the user created by hand), and
/// the registry mirrors a provider when subscribed to it as a listener.
#[derive(Debug, Default)]
pub struct InMemoryItemRegistry {
    items: RwLock<BTreeMap<String, Item>>,
}

impl InMemoryItemRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with `items`.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: RwLock::new(
                items
                    .into_iter()
                    .map(|item| (item.name.clone(), item))
                    .collect(),
            ),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Item>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Item>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `item`, returning the item it replaced.
    pub fn add(&self, item: Item) -> Option<Item> {
        self.write().insert(item.name.clone(), item)
    }

    pub fn remove(&self, name: &str) -> Option<Item> {
        self.write().remove(name)
    }

    /// Every registered item, ordered by name.
    #[must_use]
    pub fn all(&self) -> Vec<Item> {
        self.read().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl ItemLookup for InMemoryItemRegistry {
    fn get(&self, name: &str) -> Option<Item> {
        self.read().get(name).cloned()
    }
}

impl ProviderChangeListener<Item> for InMemoryItemRegistry {
    fn added(&self, element: &Item) {
        tracing::trace!(item = %element.name, "item registered");
        self.add(element.clone());
    }

    fn removed(&self, element: &Item) {
        tracing::trace!(item = %element.name, "item unregistered");
        self.remove(&element.name);
    }

    fn updated(&self, old: &Item, new: &Item) {
        let mut items = self.write();
        items.remove(&old.name);
        items.insert(new.name.clone(), new.clone());
    }
}
