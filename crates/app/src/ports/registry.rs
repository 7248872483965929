//! External registry ports: the item and thing registries this core reads.

use linkhub_domain::item::Item;
use linkhub_domain::thing::Thing;

use super::provider::Provider;

/// Read access to the external item registry.
///
/// Only used to check whether an item name is already taken; this core never
/// writes to the item registry.
pub trait ItemLookup: Send + Sync {
    /// Item registered under exactly `name`, if any.
    fn get(&self, name: &str) -> Option<Item>;
}

/// The external thing registry: its current things and topology events.
pub trait ThingSource: Provider<Thing> + Send + Sync {}

impl<T: Provider<Thing> + Send + Sync> ThingSource for T {}
