//! Structured identifiers for things and channels.
//!
//! A thing is addressed as `binding:type:id`. A channel extends its thing's
//! uid with one more segment, optionally prefixed by a channel group:
//! `binding:type:id:channel` or `binding:type:id:group#channel`.
//!
//! Every segment is restricted to `[A-Za-z0-9_-]`, so `:` and `#` only ever
//! appear as separators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const SEPARATOR: char = ':';
const GROUP_SEPARATOR: char = '#';

fn check_segment(segment: &str) -> Result<(), ValidationError> {
    if segment.is_empty() {
        return Err(ValidationError::EmptySegment);
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

/// Identifier of a [`Thing`](crate::thing::Thing).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThingUid {
    binding_id: String,
    thing_type_id: String,
    id: String,
}

impl ThingUid {
    /// Build a uid from its three segments.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySegment`] or
    /// [`ValidationError::InvalidSegment`] when a segment is not a plain token.
    pub fn new(
        binding_id: impl Into<String>,
        thing_type_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let uid = Self {
            binding_id: binding_id.into(),
            thing_type_id: thing_type_id.into(),
            id: id.into(),
        };
        check_segment(&uid.binding_id)?;
        check_segment(&uid.thing_type_id)?;
        check_segment(&uid.id)?;
        Ok(uid)
    }

    /// The binding (integration family) this thing belongs to.
    #[must_use]
    pub fn binding_id(&self) -> &str {
        &self.binding_id
    }

    #[must_use]
    pub fn thing_type_id(&self) -> &str {
        &self.thing_type_id
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Uid of a channel of this thing.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `channel_id` is not a plain token.
    pub fn channel(&self, channel_id: impl Into<String>) -> Result<ChannelUid, ValidationError> {
        ChannelUid::new(self.clone(), None, channel_id)
    }

    /// Uid of a grouped channel of this thing.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when either segment is not a plain token.
    pub fn grouped_channel(
        &self,
        group_id: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Result<ChannelUid, ValidationError> {
        ChannelUid::new(self.clone(), Some(group_id.into()), channel_id)
    }
}

impl fmt::Display for ThingUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.binding_id, self.thing_type_id, self.id
        )
    }
}

impl FromStr for ThingUid {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        match parts.as_slice() {
            [binding, thing_type, id] => Self::new(*binding, *thing_type, *id),
            _ => Err(ValidationError::MalformedUid {
                kind: "thing",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ThingUid {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ThingUid> for String {
    fn from(uid: ThingUid) -> Self {
        uid.to_string()
    }
}

/// Identifier of a [`Channel`](crate::channel::Channel).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelUid {
    thing_uid: ThingUid,
    group_id: Option<String>,
    id: String,
}

impl ChannelUid {
    /// Build a channel uid below `thing_uid`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the group or channel segment is not
    /// a plain token.
    pub fn new(
        thing_uid: ThingUid,
        group_id: Option<String>,
        id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let uid = Self {
            thing_uid,
            group_id,
            id: id.into(),
        };
        if let Some(group) = &uid.group_id {
            check_segment(group)?;
        }
        check_segment(&uid.id)?;
        Ok(uid)
    }

    #[must_use]
    pub fn thing_uid(&self) -> &ThingUid {
        &self.thing_uid
    }

    /// The binding of the owning thing.
    #[must_use]
    pub fn binding_id(&self) -> &str {
        self.thing_uid.binding_id()
    }

    #[must_use]
    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ChannelUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}", self.thing_uid)?;
        if let Some(group) = &self.group_id {
            write!(f, "{group}{GROUP_SEPARATOR}")?;
        }
        f.write_str(&self.id)
    }
}

impl FromStr for ChannelUid {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedUid {
            kind: "channel",
            value: s.to_string(),
        };
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        let [binding, thing_type, thing_id, last] = parts.as_slice() else {
            return Err(malformed());
        };
        let thing_uid = ThingUid::new(*binding, *thing_type, *thing_id)?;
        match last.split_once(GROUP_SEPARATOR) {
            Some((group, id)) => {
                if id.contains(GROUP_SEPARATOR) {
                    return Err(malformed());
                }
                Self::new(thing_uid, Some(group.to_string()), id)
            }
            None => Self::new(thing_uid, None, *last),
        }
    }
}

impl TryFrom<String> for ChannelUid {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelUid> for String {
    fn from(uid: ChannelUid) -> Self {
        uid.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_thing_uid_with_colons() {
        let uid = ThingUid::new("acme", "sensor", "living-room").unwrap();
        assert_eq!(uid.to_string(), "acme:sensor:living-room");
        assert_eq!(uid.binding_id(), "acme");
    }

    #[test]
    fn should_parse_thing_uid() {
        let uid: ThingUid = "hue:bulb:kitchen_1".parse().unwrap();
        assert_eq!(uid.binding_id(), "hue");
        assert_eq!(uid.thing_type_id(), "bulb");
        assert_eq!(uid.id(), "kitchen_1");
    }

    #[test]
    fn should_reject_thing_uid_with_wrong_segment_count() {
        let result = ThingUid::from_str("hue:bulb");
        assert!(matches!(
            result,
            Err(ValidationError::MalformedUid { kind: "thing", .. })
        ));
    }

    #[test]
    fn should_reject_empty_segment() {
        let result = ThingUid::new("hue", "", "x");
        assert_eq!(result, Err(ValidationError::EmptySegment));
    }

    #[test]
    fn should_reject_segment_with_separator_characters() {
        let result = ThingUid::new("hue", "bulb", "a#b");
        assert_eq!(
            result,
            Err(ValidationError::InvalidSegment("a#b".to_string()))
        );
    }

    #[test]
    fn should_render_plain_channel_uid() {
        let thing = ThingUid::new("acme", "sensor", "living-room").unwrap();
        let channel = thing.channel("temperature").unwrap();
        assert_eq!(
            channel.to_string(),
            "acme:sensor:living-room:temperature"
        );
        assert_eq!(channel.binding_id(), "acme");
    }

    #[test]
    fn should_render_grouped_channel_uid_with_hash() {
        let thing = ThingUid::new("acme", "meter", "m1").unwrap();
        let channel = thing.grouped_channel("phase1", "power").unwrap();
        assert_eq!(channel.to_string(), "acme:meter:m1:phase1#power");
        assert_eq!(channel.group_id(), Some("phase1"));
    }

    #[test]
    fn should_parse_grouped_channel_uid() {
        let uid: ChannelUid = "acme:meter:m1:phase1#power".parse().unwrap();
        assert_eq!(uid.thing_uid().to_string(), "acme:meter:m1");
        assert_eq!(uid.group_id(), Some("phase1"));
        assert_eq!(uid.id(), "power");
    }

    #[test]
    fn should_reject_channel_uid_with_two_group_separators() {
        let result = ChannelUid::from_str("acme:meter:m1:a#b#c");
        assert!(matches!(
            result,
            Err(ValidationError::MalformedUid {
                kind: "channel",
                ..
            })
        ));
    }

    #[test]
    fn should_reject_channel_uid_without_channel_segment() {
        assert!(ChannelUid::from_str("acme:meter:m1").is_err());
    }

    #[test]
    fn should_serialize_channel_uid_as_string() {
        let uid: ChannelUid = "acme:sensor:s1:humidity".parse().unwrap();
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"acme:sensor:s1:humidity\"");
        let parsed: ChannelUid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, uid);
    }

    #[test]
    fn should_reject_invalid_uid_when_deserializing() {
        let result: Result<ThingUid, _> = serde_json::from_str("\"only:two\"");
        assert!(result.is_err());
    }
}
