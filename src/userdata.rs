//! Decoding of the opaque user-data path segment.
//!
//! Addons that never register a structured type receive the segment
//! verbatim as [`UserData::Raw`]. Once a type is registered with
//! [`UserDataCodec::typed`], non-empty segments are transport-decoded
//! (URL path escaping or URL-safe base64) and parsed as JSON into that type.
//! An empty segment is always [`UserData::None`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::utils::{UnescapeError, path_unescape};

type DecodeFn =
    Arc<dyn Fn(&[u8]) -> Result<Arc<dyn Any + Send + Sync>, serde_json::Error> + Send + Sync>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("user data is not a valid escaped path segment: {0}")]
    Unescape(#[from] UnescapeError),

    #[error("user data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("user data is not valid JSON for the registered type: {0}")]
    Json(#[from] serde_json::Error),
}

/// Transport encoding of structured user data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserDataEncoding {
    /// URL path escaping, then JSON
    #[default]
    Url,
    /// URL-safe base64 (padding optional), then JSON
    Base64,
}

/// User data attached to a request
#[derive(Clone, Default)]
pub enum UserData {
    /// No user-data segment in the URL
    #[default]
    None,
    /// Segment passed through verbatim (no structured type registered)
    Raw(String),
    /// Segment decoded into the registered type
    Typed(Arc<dyn Any + Send + Sync>),
}

impl UserData {
    pub fn is_none(&self) -> bool {
        matches!(self, UserData::None)
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            UserData::Raw(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the decoded value if it is of type `T`
    pub fn typed<T: Any>(&self) -> Option<&T> {
        match self {
            UserData::Typed(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserData::None => f.write_str("None"),
            UserData::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
            UserData::Typed(_) => f.write_str("Typed(..)"),
        }
    }
}

/// Decoder for user-data segments, fixed at setup time
#[derive(Clone, Default)]
pub struct UserDataCodec {
    decoder: Option<DecodeFn>,
    encoding: UserDataEncoding,
}

impl UserDataCodec {
    /// Codec that passes segments through as [`UserData::Raw`]
    pub fn raw() -> Self {
        Self::default()
    }

    /// Codec that decodes segments into `T`
    pub fn typed<T>(encoding: UserDataEncoding) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let decoder: DecodeFn = Arc::new(|bytes: &[u8]| {
            let value: T = serde_json::from_slice(bytes)?;
            Ok(Arc::new(value) as Arc<dyn Any + Send + Sync>)
        });

        Self {
            decoder: Some(decoder),
            encoding,
        }
    }

    pub fn with_encoding(mut self, encoding: UserDataEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn is_typed(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn encoding(&self) -> UserDataEncoding {
        self.encoding
    }

    pub fn decode(&self, segment: &str) -> Result<UserData, DecodeError> {
        if segment.is_empty() {
            return Ok(UserData::None);
        }

        let Some(decoder) = &self.decoder else {
            return Ok(UserData::Raw(segment.to_string()));
        };

        debug!(user_data = segment, "Decoding user data");

        // Most likely an encoding error on the client side, hence warn
        let bytes = self.transport_decode(segment).inspect_err(|err| {
            warn!(error = %err, "Couldn't decode user data");
        })?;

        let value = decoder(&bytes).inspect_err(|err| {
            warn!(error = %err, "Couldn't unmarshal user data");
        })?;

        Ok(UserData::Typed(value))
    }

    fn transport_decode(&self, segment: &str) -> Result<Vec<u8>, DecodeError> {
        match self.encoding {
            UserDataEncoding::Url => Ok(path_unescape(segment)?.into_bytes()),
            UserDataEncoding::Base64 => {
                // Accept both padded and unpadded values
                let trimmed = segment.trim_end_matches('=');
                Ok(URL_SAFE_NO_PAD.decode(trimmed)?)
            }
        }
    }
}

impl fmt::Debug for UserDataCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDataCodec")
            .field("typed", &self.is_typed())
            .field("encoding", &self.encoding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;

    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    struct Settings {
        token: String,
        quality: u32,
    }

    fn sample() -> Settings {
        Settings {
            token: "abc?/+=".to_string(),
            quality: 1080,
        }
    }

    #[test]
    fn test_raw_codec_passes_segment_through() {
        let codec = UserDataCodec::raw();

        let decoded = codec.decode("some%20thing").unwrap();
        assert_eq!(decoded.raw(), Some("some%20thing"));
    }

    #[test]
    fn test_empty_segment_is_none() {
        assert!(UserDataCodec::raw().decode("").unwrap().is_none());
        assert!(
            UserDataCodec::typed::<Settings>(UserDataEncoding::Base64)
                .decode("")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_base64_with_and_without_padding() {
        let codec = UserDataCodec::typed::<Settings>(UserDataEncoding::Base64);
        let json = serde_json::to_vec(&sample()).unwrap();

        let padded = URL_SAFE.encode(&json);
        let unpadded = URL_SAFE_NO_PAD.encode(&json);
        assert!(padded.ends_with('='), "fixture should exercise padding");

        for segment in [padded, unpadded] {
            let decoded = codec.decode(&segment).unwrap();
            assert_eq!(decoded.typed::<Settings>(), Some(&sample()));
        }
    }

    #[test]
    fn test_url_escaped_json() {
        let codec = UserDataCodec::typed::<Settings>(UserDataEncoding::Url);

        let decoded = codec
            .decode("%7B%22token%22%3A%22abc%3F%2F%2B%3D%22%2C%22quality%22%3A1080%7D")
            .unwrap();
        assert_eq!(decoded.typed::<Settings>(), Some(&sample()));
    }

    #[test]
    fn test_invalid_transport_is_an_error() {
        let base64 = UserDataCodec::typed::<Settings>(UserDataEncoding::Base64);
        assert!(matches!(base64.decode("not*base64"), Err(DecodeError::Base64(_))));

        let url = UserDataCodec::typed::<Settings>(UserDataEncoding::Url);
        assert!(matches!(url.decode("%zz"), Err(DecodeError::Unescape(_))));
    }

    #[test]
    fn test_wrong_shape_is_a_json_error() {
        let codec = UserDataCodec::typed::<Settings>(UserDataEncoding::Base64);
        let segment = URL_SAFE_NO_PAD.encode(br#"{"token": 5}"#);

        assert!(matches!(codec.decode(&segment), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_typed_downcast_to_other_type_is_none() {
        let codec = UserDataCodec::typed::<Settings>(UserDataEncoding::Base64);
        let segment = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&sample()).unwrap());

        let decoded = codec.decode(&segment).unwrap();
        assert!(decoded.typed::<String>().is_none());
        assert!(decoded.raw().is_none());
    }
}
