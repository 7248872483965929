//! # linkhub-domain
//!
//! Pure domain model for the linkhub provisioning layer.
//!
//! ## Responsibilities
//! - Structured identifiers: [`ThingUid`](uid::ThingUid), [`ChannelUid`](uid::ChannelUid),
//!   subscription ids
//! - Define **Things** (devices exposing one or more channels) and **Channels**
//!   (typed data points)
//! - Define **Items** (addressable entities) and **Links** (channel ↔ item)
//! - Item naming and the item factory policy table
//! - Error taxonomy shared by every layer
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates.
//! Collaborator boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod lifecycle;
pub mod uid;

pub mod channel;
pub mod item;
pub mod item_factory;
pub mod link;
pub mod naming;
pub mod thing;
