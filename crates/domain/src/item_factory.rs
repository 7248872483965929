//! Item factory: map a channel's accepted item type to an item.
//!
//! | accepted type (case-insensitive) | item kind |
//! |---|---|
//! | `Number` | [`ItemKind::Number`] |
//! | `Switch` | [`ItemKind::Switch`] |
//! | anything else | unsupported |

use crate::error::{LinkHubError, UnsupportedTypeError};
use crate::item::{Item, ItemKind};

const SUPPORTED: [ItemKind; 2] = [ItemKind::Number, ItemKind::Switch];

/// Item kind produced for an accepted type, if any.
#[must_use]
pub fn kind_for(accepted_type: &str) -> Option<ItemKind> {
    SUPPORTED
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(accepted_type))
}

/// Create the item called `name` for a channel declaring `accepted_type`.
///
/// # Errors
///
/// Returns [`LinkHubError::UnsupportedType`] when `accepted_type` has no
/// mapping, or [`LinkHubError::Validation`] when `name` is not a valid item
/// name.
pub fn create_item(name: &str, accepted_type: &str) -> Result<Item, LinkHubError> {
    let kind = kind_for(accepted_type).ok_or_else(|| UnsupportedTypeError {
        accepted_type: accepted_type.to_string(),
    })?;
    Item::new(name, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_number_item() {
        let item = create_item("t", "Number").unwrap();
        assert_eq!(item.kind, ItemKind::Number);
        assert_eq!(item.name, "t");
    }

    #[test]
    fn should_create_switch_item_ignoring_case() {
        let item = create_item("s", "sWiTcH").unwrap();
        assert_eq!(item.kind, ItemKind::Switch);
    }

    #[test]
    fn should_refuse_contact_type() {
        let result = create_item("c", "Contact");
        assert!(matches!(
            result,
            Err(LinkHubError::UnsupportedType(UnsupportedTypeError { ref accepted_type }))
                if accepted_type == "Contact"
        ));
    }

    #[test]
    fn should_refuse_empty_type() {
        assert!(kind_for("").is_none());
    }
}
