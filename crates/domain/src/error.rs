//! Common error types used across the workspace.
//!
//! Each failure family has its own typed error and converts into
//! [`LinkHubError`] via `#[from]`. None of these are fatal: callers of the
//! registry and the provisioning engine receive them as status values.

use crate::lifecycle::LifecycleState;
use crate::uid::ThingUid;

/// Top-level error for every linkhub operation.
#[derive(Debug, thiserror::Error)]
pub enum LinkHubError {
    /// A value violated a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The target of an operation does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A channel declares an item type the factory cannot produce.
    #[error("unsupported item type")]
    UnsupportedType(#[from] UnsupportedTypeError),

    /// Items were already generated for this thing.
    #[error("thing {0} is already provisioned")]
    AlreadyProvisioned(ThingUid),

    /// The component was used outside of its active lifetime.
    #[error("precondition violated")]
    Precondition(#[from] PreconditionError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name {0:?} contains characters outside [A-Za-z0-9_-]")]
    InvalidName(String),

    #[error("uid segment must not be empty")]
    EmptySegment,

    #[error("uid segment {0:?} contains characters outside [A-Za-z0-9_-]")]
    InvalidSegment(String),

    #[error("malformed {kind} uid {value:?}")]
    MalformedUid { kind: &'static str, value: String },

    #[error("thing uid is missing")]
    MissingUid,

    #[error("channel {channel} does not belong to thing {thing}")]
    ForeignChannel { thing: String, channel: String },

    #[error("thing {0} is already registered")]
    DuplicateThing(String),

    #[error("channel {0} is declared twice")]
    DuplicateChannel(String),

    #[error("unknown item kind {0:?}")]
    UnknownItemKind(String),
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// The item factory has no mapping for an accepted item type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no item kind is produced for accepted type {accepted_type:?}")]
pub struct UnsupportedTypeError {
    pub accepted_type: String,
}

/// Lifecycle misuse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    /// An operation ran before `activate` or after `deactivate`.
    #[error("{operation} called while the component is {state}")]
    Inactive {
        operation: &'static str,
        state: LifecycleState,
    },

    /// `activate`/`deactivate` called out of order.
    #[error("cannot {transition} a component that is {state}")]
    InvalidTransition {
        transition: &'static str,
        state: LifecycleState,
    },
}
