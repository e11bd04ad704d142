use serde::{Deserialize, Serialize};

use super::{SubtitleItem, is_false, is_zero, null_as_default};

/// A playable source for a meta item.
///
/// Exactly one of `url`, `yt_id`, `info_hash` or `external_url` should be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamItem {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub yt_id: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub info_hash: String,
    /// Only meaningful together with `info_hash`
    #[serde(rename = "fileIdx", default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub file_index: u8,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub external_url: String,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Usually the stream quality
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<SubtitleItem>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub behavior_hints: StreamBehaviorHints,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamBehaviorHints {
    /// ISO 3166-1 alpha-3 codes, lowercase
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub country_whitelist: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_false")]
    pub not_web_ready: bool,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Option::is_none")]
    pub binge_group: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub proxy_headers: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub video_hash: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub video_size: u64,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_stream_serialization() {
        let stream = StreamItem {
            info_hash: "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c".into(),
            file_index: 1,
            title: "1080p (torrent)".into(),
            ..Default::default()
        };

        let json = serde_json::to_string(&stream).unwrap();
        assert_eq!(
            json,
            r#"{"infoHash":"dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c","fileIdx":1,"title":"1080p (torrent)","behaviorHints":{}}"#
        );
    }
}
