//! # linkhub-app
//!
//! Application layer: the link registry, the provisioning engine and the
//! **port definitions** (traits) they are wired through.
//!
//! ## Responsibilities
//! - Define **port traits** for collaborators:
//!   - `Provider` / `ProviderChangeListener`: publish/subscribe contract
//!   - `ItemChannelLinker`: create and drop channel ↔ item links
//!   - `ItemLookup`: existence check against the external item registry
//!   - `ThingSource`: the external thing registry and its topology events
//!   - `Lifecycle`: `activate` / `deactivate` hooks called by the host
//! - Provide the **subscription manager** shared by every provider
//! - Implement the **link registry** and the **provisioning engine**
//!
//! ## Dependency rule
//! Depends on `linkhub-domain` only (plus `tracing`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.
//!
//! ## Concurrency
//! Every operation is synchronous and runs on the caller's thread. Each
//! component keeps its mutable state behind one mutex; listeners are
//! snapshotted under that mutex and invoked after it is released, so a
//! listener may call back into the component that notified it.

pub mod listeners;
pub mod ports;
pub mod services;
