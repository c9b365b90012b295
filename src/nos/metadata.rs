//! Object metadata carried as HTTP headers

use crate::nos::consts::{CONTENT_LENGTH, X_NOS_META_PREFIX};
use http::HeaderMap;
use std::collections::BTreeMap;

/// Header keys a caller may attach to an upload.
///
/// Anything else must use the `x-nos-meta-` user metadata prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    CacheControl,
    ContentDisposition,
    ContentEncoding,
    ContentLanguage,
    ContentMd5,
    ContentType,
    Expires,
    NosStorageClass,
}

impl MetadataKey {
    pub const ALL: [MetadataKey; 8] = [
        MetadataKey::CacheControl,
        MetadataKey::ContentDisposition,
        MetadataKey::ContentEncoding,
        MetadataKey::ContentLanguage,
        MetadataKey::ContentMd5,
        MetadataKey::ContentType,
        MetadataKey::Expires,
        MetadataKey::NosStorageClass,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            MetadataKey::CacheControl => "Cache-Control",
            MetadataKey::ContentDisposition => "Content-Disposition",
            MetadataKey::ContentEncoding => "Content-Encoding",
            MetadataKey::ContentLanguage => "Content-Language",
            MetadataKey::ContentMd5 => "Content-MD5",
            MetadataKey::ContentType => "Content-Type",
            MetadataKey::Expires => "Expires",
            MetadataKey::NosStorageClass => "x-nos-storage-class",
        }
    }

    /// Case-insensitive lookup
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(key))
    }
}

/// Returns true when `key` may be sent as caller metadata
pub fn is_allowed_key(key: &str) -> bool {
    MetadataKey::parse(key).is_some()
        || (key.len() > X_NOS_META_PREFIX.len()
            && key
                .get(..X_NOS_META_PREFIX.len())
                .is_some_and(|p| p.eq_ignore_ascii_case(X_NOS_META_PREFIX)))
}

/// Header bag attached to uploads and returned by GET/HEAD
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Header name to value
    pub metadata: BTreeMap<String, String>,
    /// Declared body length in bytes, `None` when unknown
    pub content_length: Option<u64>,
}

impl ObjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = Some(content_length);
        self
    }

    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header(MetadataKey::ContentType, content_type)
    }

    pub fn with_header(mut self, key: MetadataKey, value: impl Into<String>) -> Self {
        self.metadata.insert(key.as_str().to_string(), value.into());
        self
    }

    /// Adds an `x-nos-meta-{name}` user metadata entry
    pub fn with_user_meta(mut self, name: &str, value: impl Into<String>) -> Self {
        self.metadata
            .insert(format!("{}{}", X_NOS_META_PREFIX, name), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(MetadataKey::ContentType.as_str())
    }

    pub fn etag(&self) -> Option<&str> {
        self.get("ETag")
    }

    /// User metadata with the `x-nos-meta-` prefix stripped
    pub fn user_meta(&self) -> BTreeMap<&str, &str> {
        self.metadata
            .iter()
            .filter(|(k, _)| is_allowed_key(k) && MetadataKey::parse(k).is_none())
            .map(|(k, v)| (&k[X_NOS_META_PREFIX.len()..], v.as_str()))
            .collect()
    }

    /// First key not covered by [`MetadataKey`] or the user metadata prefix
    pub fn first_invalid_key(&self) -> Option<&str> {
        self.metadata
            .keys()
            .find(|k| !is_allowed_key(k))
            .map(String::as_str)
    }

    /// Builds metadata from every response header
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut metadata = BTreeMap::new();
        for (name, value) in headers {
            if let Ok(value) = value.to_str() {
                metadata.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        Self {
            metadata,
            content_length,
        }
    }
}
