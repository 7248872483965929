//! Item naming: derive an item name from a channel uid.
//!
//! The uid's separators (`:` and `#`) are each replaced by `_`; everything
//! else is kept. Because uid segments may themselves contain `_`, two uids
//! that differ only at a separator position map to the same name
//! (`a:b_c:d:e` and `a:b:c_d:e` → `a_b_c_d_e`). Names are therefore unique
//! only for uid grammars that avoid this; callers should not rely on it.

use crate::uid::ChannelUid;

const REPLACED: [char; 2] = [':', '#'];
const REPLACEMENT: &str = "_";

/// Canonical item name for a channel.
#[must_use]
pub fn item_name_for(channel_uid: &ChannelUid) -> String {
    channel_uid.to_string().replace(REPLACED, REPLACEMENT)
}
