//! Item: a software-addressable entity representing a channel's value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LinkHubError, ValidationError};

/// The closed set of item kinds known to linkhub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Number,
    Switch,
    String,
    Contact,
}

impl ItemKind {
    /// Canonical type name, as declared by channels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::Switch => "Switch",
            Self::String => "String",
            Self::Contact => "Contact",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ValidationError;

    /// Case-insensitive parse of a type name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Number, Self::Switch, Self::String, Self::Contact]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownItemKind(s.to_string()))
    }
}

/// An item, identified by its unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Item {
    /// Create an item after checking its name.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Validation`] when `name` is empty or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Result<Self, LinkHubError> {
        let item = Self {
            name: name.into(),
            kind,
            label: None,
        };
        item.validate()?;
        Ok(item)
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LinkHubError::Validation`] when the name is empty or invalid.
    pub fn validate(&self) -> Result<(), LinkHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::InvalidName(self.name.clone()).into());
        }
        Ok(())
    }

    /// Name comparison used for lookups (case-insensitive).
    #[must_use]
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_kind_case_insensitively() {
        assert_eq!("number".parse::<ItemKind>(), Ok(ItemKind::Number));
        assert_eq!("SWITCH".parse::<ItemKind>(), Ok(ItemKind::Switch));
    }

    #[test]
    fn should_reject_unknown_kind() {
        assert_eq!(
            "Dimmer".parse::<ItemKind>(),
            Err(ValidationError::UnknownItemKind("Dimmer".to_string()))
        );
    }

    #[test]
    fn should_display_canonical_kind_name() {
        assert_eq!(ItemKind::Contact.to_string(), "Contact");
    }

    #[test]
    fn should_create_item_with_valid_name() {
        let item = Item::new("acme_sensor_s1_temperature", ItemKind::Number).unwrap();
        assert_eq!(item.kind, ItemKind::Number);
        assert!(item.label.is_none());
    }

    #[test]
    fn should_reject_empty_name() {
        let result = Item::new("", ItemKind::Switch);
        assert!(matches!(
            result,
            Err(LinkHubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_name_with_separator() {
        let result = Item::new("acme:sensor", ItemKind::Switch);
        assert!(matches!(
            result,
            Err(LinkHubError::Validation(ValidationError::InvalidName(_)))
        ));
    }

    #[test]
    fn should_match_names_ignoring_case() {
        let item = Item::new("Kitchen_Light", ItemKind::Switch).unwrap();
        assert!(item.name_matches("kitchen_light"));
        assert!(!item.name_matches("kitchen"));
    }
}
