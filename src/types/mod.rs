//! Protocol documents exchanged with clients.
//!
//! Field names follow the wire format (camelCase); optional fields are
//! omitted from the JSON when empty so responses stay byte-compatible with
//! what clients expect. Every model derives `Clone` as a full deep copy, so
//! per-response variants of a shared value never alias it.

mod manifest;
mod meta;
mod stream;
mod subtitle;

pub use manifest::{
    CatalogItem, ConfigItem, ExtraItem, Manifest, ManifestBehaviorHints, ResourceItem,
};
pub use meta::{MetaBehaviorHints, MetaItem, MetaLinkItem, MetaPreviewItem, VideoItem};
pub use stream::{StreamBehaviorHints, StreamItem};
pub use subtitle::SubtitleItem;

use serde::{Deserialize, Deserializer};

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

pub(crate) fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Reads `null` as the field's default, as Cinemeta sends nulls for unset fields
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
