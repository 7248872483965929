//! Channel: a single typed data point exposed by a thing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::uid::ChannelUid;

/// A data point of a [`Thing`](crate::thing::Thing).
///
/// `accepted_item_type` is the item type the channel declares it can be
/// bound to (`"Number"`, `"Switch"`, …). It is kept as the raw declared
/// string; the [item factory](crate::item_factory) decides what it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub uid: ChannelUid,
    pub accepted_item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Channel {
    #[must_use]
    pub fn new(uid: ChannelUid, accepted_item_type: impl Into<String>) -> Self {
        Self {
            uid,
            accepted_item_type: accepted_item_type.into(),
            label: None,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a property by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
