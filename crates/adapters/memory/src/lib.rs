//! # linkhub-adapter-memory
//!
//! In-memory implementations of the collaborators the provisioning engine
//! expects the host to provide.
//!
//! | Type | Port | Role |
//! |------|------|------|
//! | [`InMemoryItemRegistry`] | `ItemLookup`, `ProviderChangeListener<Item>` | External item registry; mirrors provided items |
//! | [`InMemoryThingRegistry`] | `Provider<Thing>` | Thing registry emitting topology events |
//! | [`ChangeJournal`] | `ProviderChangeListener<E>` | Records every change it receives |
//! | [`TracingListener`] | `ProviderChangeListener<E>` | Logs every change it receives |
//!
//! ## Dependency rule
//!
//! Depends on `linkhub-app` (port traits) and `linkhub-domain` only.

mod item_registry;
mod journal;
mod thing_registry;

pub use item_registry::InMemoryItemRegistry;
pub use journal::{ChangeJournal, TracingListener};
pub use thing_registry::InMemoryThingRegistry;
