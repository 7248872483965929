//! Link: the association between one item and one channel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::uid::ChannelUid;

/// An `(item name, channel uid)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemChannelLink {
    pub item_name: String,
    pub channel_uid: ChannelUid,
}

impl ItemChannelLink {
    #[must_use]
    pub fn new(item_name: impl Into<String>, channel_uid: ChannelUid) -> Self {
        Self {
            item_name: item_name.into(),
            channel_uid,
        }
    }

    /// Exact match on both ends of the link.
    #[must_use]
    pub fn connects(&self, item_name: &str, channel_uid: &ChannelUid) -> bool {
        self.item_name == item_name && &self.channel_uid == channel_uid
    }
}

impl fmt::Display for ItemChannelLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.item_name, self.channel_uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uid::ThingUid;

    fn channel(id: &str) -> ChannelUid {
        ThingUid::new("acme", "sensor", "s1")
            .unwrap()
            .channel(id)
            .unwrap()
    }

    #[test]
    fn should_connect_exact_pair_only() {
        let link = ItemChannelLink::new("acme_sensor_s1_temp", channel("temp"));
        assert!(link.connects("acme_sensor_s1_temp", &channel("temp")));
        assert!(!link.connects("ACME_SENSOR_S1_TEMP", &channel("temp")));
        assert!(!link.connects("acme_sensor_s1_temp", &channel("humidity")));
    }

    #[test]
    fn should_display_item_then_channel() {
        let link = ItemChannelLink::new("t", channel("temp"));
        assert_eq!(link.to_string(), "t -> acme:sensor:s1:temp");
    }
}
