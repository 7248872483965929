//! Application services: the link registry and the provisioning engine.
//!
//! Both are constructed explicitly and own their state; collaborators are
//! injected as port trait objects.

pub mod link_registry;
pub mod provisioning;
