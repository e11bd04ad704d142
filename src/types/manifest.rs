use serde::{Deserialize, Serialize};

use super::{is_false, is_zero};

/// Describes the capabilities of the addon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceItem>,

    /// Clients understand "movie", "series", "channel" and "tv"
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub catalogs: Vec<CatalogItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub id_prefixes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub background: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub logo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contact_email: String,
    #[serde(default)]
    pub behavior_hints: ManifestBehaviorHints,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addon_catalogs: Vec<CatalogItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config: Vec<ConfigItem>,
}

impl Manifest {
    /// The variant served to clients that already supplied user data.
    ///
    /// Clients only offer installation when `configurationRequired` is false,
    /// so a configured request always sees it switched off.
    pub fn configured(&self) -> Manifest {
        let mut manifest = self.clone();
        manifest.behavior_hints.configuration_required = false;
        manifest
    }

    pub fn requires_configuration(&self) -> bool {
        self.behavior_hints.configuration_required
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestBehaviorHints {
    #[serde(default, skip_serializing_if = "is_false")]
    pub adult: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub p2p: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub configurable: bool,
    /// True on `/manifest.json`, forced to false on `/{userData}/manifest.json`
    #[serde(default, skip_serializing_if = "is_false")]
    pub configuration_required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceItem {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub id_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ExtraItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraItem {
    pub name: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub options_limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    /// One of "text", "number", "password", "checkbox" or "select"
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}
