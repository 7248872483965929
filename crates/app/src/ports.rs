//! Port definitions: traits that components and adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod lifecycle;
pub mod linker;
pub mod provider;
pub mod registry;

pub use lifecycle::Lifecycle;
pub use linker::ItemChannelLinker;
pub use provider::{Change, Provider, ProviderChangeListener};
pub use registry::{ItemLookup, ThingSource};
