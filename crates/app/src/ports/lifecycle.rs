//! Lifecycle port: start/stop hooks called by the host.

use linkhub_domain::error::LinkHubError;
use linkhub_domain::lifecycle::LifecycleState;

/// A component with an explicit usable lifetime.
///
/// The host calls [`activate`](Self::activate) once before using the
/// component and [`deactivate`](Self::deactivate) once afterwards. Outside
/// that window every other operation is a precondition violation and
/// degrades to a logged no-op.
pub trait Lifecycle {
    /// Start the component.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Precondition`] unless the component was just created.
    fn activate(&self) -> Result<(), LinkHubError>;

    /// Stop the component and drop its state.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Precondition`] unless the component is active.
    fn deactivate(&self) -> Result<(), LinkHubError>;

    /// Current lifecycle state.
    fn lifecycle_state(&self) -> LifecycleState;
}
