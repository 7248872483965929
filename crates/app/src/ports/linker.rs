//! Linker port: create and drop channel ↔ item links.

use linkhub_domain::channel::Channel;
use linkhub_domain::error::LinkHubError;
use linkhub_domain::item::Item;
use linkhub_domain::link::ItemChannelLink;

/// Dynamically links channels with items.
///
/// Implemented by [`LinkRegistry`](crate::services::link_registry::LinkRegistry);
/// consumed by the provisioning engine.
pub trait ItemChannelLinker: Send + Sync {
    /// Link `channel` with `item`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Precondition`] when the linker is not active.
    fn link(&self, channel: &Channel, item: &Item) -> Result<ItemChannelLink, LinkHubError>;

    /// Drop the link between `channel` and `item`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::NotFound`] when no such link exists.
    fn unlink(&self, channel: &Channel, item: &Item) -> Result<ItemChannelLink, LinkHubError>;

    /// Drop every link of `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::NotFound`] when the channel has no link.
    fn unlink_all(&self, channel: &Channel) -> Result<Vec<ItemChannelLink>, LinkHubError>;
}
