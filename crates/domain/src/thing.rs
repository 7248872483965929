//! Thing: a physical or virtual device exposing one or more channels.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{LinkHubError, ValidationError};
use crate::uid::{ChannelUid, ThingUid};

/// A device or logical unit, owned by the external thing registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    pub uid: ThingUid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Thing {
    /// Create a builder for constructing a [`Thing`].
    #[must_use]
    pub fn builder() -> ThingBuilder {
        ThingBuilder::default()
    }

    /// The binding this thing belongs to.
    #[must_use]
    pub fn binding_id(&self) -> &str {
        self.uid.binding_id()
    }

    /// Find a channel by uid.
    #[must_use]
    pub fn channel(&self, uid: &ChannelUid) -> Option<&Channel> {
        self.channels.iter().find(|c| &c.uid == uid)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Validation`] when:
    /// - a channel uid is not below this thing's uid ([`ValidationError::ForeignChannel`])
    /// - two channels share a uid ([`ValidationError::DuplicateChannel`])
    pub fn validate(&self) -> Result<(), LinkHubError> {
        let mut seen = HashSet::with_capacity(self.channels.len());
        for channel in &self.channels {
            if channel.uid.thing_uid() != &self.uid {
                return Err(ValidationError::ForeignChannel {
                    thing: self.uid.to_string(),
                    channel: channel.uid.to_string(),
                }
                .into());
            }
            if !seen.insert(&channel.uid) {
                return Err(ValidationError::DuplicateChannel(channel.uid.to_string()).into());
            }
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Thing`].
#[derive(Debug, Default)]
pub struct ThingBuilder {
    uid: Option<ThingUid>,
    label: Option<String>,
    channels: Vec<Channel>,
}

impl ThingBuilder {
    #[must_use]
    pub fn uid(mut self, uid: ThingUid) -> Self {
        self.uid = Some(uid);
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }

    #[must_use]
    pub fn channels(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
        self.channels.extend(channels);
        self
    }

    /// Consume the builder, validate, and return a [`Thing`].
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Validation`] if the uid is missing or a
    /// channel invariant fails.
    pub fn build(self) -> Result<Thing, LinkHubError> {
        let thing = Thing {
            uid: self.uid.ok_or(ValidationError::MissingUid)?,
            label: self.label,
            channels: self.channels,
        };
        thing.validate()?;
        Ok(thing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid() -> ThingUid {
        ThingUid::new("acme", "sensor", "living-room").unwrap()
    }

    #[test]
    fn should_build_thing_with_channels_in_order() {
        let thing_uid = uid();
        let thing = Thing::builder()
            .uid(thing_uid.clone())
            .label("Living room sensor")
            .channel(Channel::new(thing_uid.channel("temperature").unwrap(), "Number"))
            .channel(Channel::new(thing_uid.channel("power").unwrap(), "Switch"))
            .build()
            .unwrap();

        assert_eq!(thing.binding_id(), "acme");
        let ids: Vec<&str> = thing.channels.iter().map(|c| c.uid.id()).collect();
        assert_eq!(ids, vec!["temperature", "power"]);
    }

    #[test]
    fn should_return_validation_error_when_uid_missing() {
        let result = Thing::builder().build();
        assert!(matches!(
            result,
            Err(LinkHubError::Validation(ValidationError::MissingUid))
        ));
    }

    #[test]
    fn should_reject_channel_of_another_thing() {
        let other = ThingUid::new("acme", "sensor", "kitchen").unwrap();
        let result = Thing::builder()
            .uid(uid())
            .channel(Channel::new(other.channel("temperature").unwrap(), "Number"))
            .build();
        assert!(matches!(
            result,
            Err(LinkHubError::Validation(ValidationError::ForeignChannel { .. }))
        ));
    }

    #[test]
    fn should_reject_duplicate_channel() {
        let thing_uid = uid();
        let channel = Channel::new(thing_uid.channel("temperature").unwrap(), "Number");
        let result = Thing::builder()
            .uid(thing_uid)
            .channels([channel.clone(), channel])
            .build();
        assert!(matches!(
            result,
            Err(LinkHubError::Validation(ValidationError::DuplicateChannel(_)))
        ));
    }

    #[test]
    fn should_find_channel_by_uid() {
        let thing_uid = uid();
        let channel_uid = thing_uid.channel("temperature").unwrap();
        let thing = Thing::builder()
            .uid(thing_uid)
            .channel(Channel::new(channel_uid.clone(), "Number"))
            .build()
            .unwrap();
        assert!(thing.channel(&channel_uid).is_some());
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let thing_uid = uid();
        let thing = Thing::builder()
            .uid(thing_uid.clone())
            .channel(Channel::new(thing_uid.channel("temperature").unwrap(), "Number"))
            .build()
            .unwrap();
        let json = serde_json::to_string(&thing).unwrap();
        let parsed: Thing = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, thing);
    }
}
