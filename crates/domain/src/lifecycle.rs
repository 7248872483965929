//! Component lifecycle states.

use serde::{Deserialize, Serialize};

use crate::error::PreconditionError;

/// Where a component is in its `activate` → `deactivate` lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Created,
    Active,
    Deactivated,
}

impl LifecycleState {
    /// Whether operations other than the lifecycle hooks are valid.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// `Created` → `Active`.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::InvalidTransition`] from any other state.
    pub fn activate(&mut self) -> Result<(), PreconditionError> {
        match self {
            Self::Created => {
                *self = Self::Active;
                Ok(())
            }
            _ => Err(PreconditionError::InvalidTransition {
                transition: "activate",
                state: *self,
            }),
        }
    }

    /// `Active` → `Deactivated`.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::InvalidTransition`] from any other state.
    pub fn deactivate(&mut self) -> Result<(), PreconditionError> {
        match self {
            Self::Active => {
                *self = Self::Deactivated;
                Ok(())
            }
            _ => Err(PreconditionError::InvalidTransition {
                transition: "deactivate",
                state: *self,
            }),
        }
    }

    /// Gate for every operation other than the lifecycle hooks.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::Inactive`] unless the state is `Active`.
    pub fn ensure_active(self, operation: &'static str) -> Result<(), PreconditionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(PreconditionError::Inactive {
                operation,
                state: self,
            })
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Active => f.write_str("active"),
            Self::Deactivated => f.write_str("deactivated"),
        }
    }
}
