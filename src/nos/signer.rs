//! NOS request signer
//!
//! String to sign:
//! ```text
//! METHOD\nContent-MD5\nContent-Type\nDate\n{x-nos-* headers}{resource}
//! ```
//! The signature is `base64(HMAC-SHA256(secret_key, string_to_sign))` and the
//! Authorization value is `NOS {access_key}:{signature}`.
//!
//! Signing is pure: the Date header is whatever the caller put on the request.

use crate::nos::consts::{CONTENT_MD5, CONTENT_TYPE, DATE, SUB_RESOURCES, X_NOS_PREFIX};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Hex lookup table for zero-allocation percent encoding
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Authorization scheme prefix
const NOS_SCHEME: &str = "NOS";

/// Signs requests with an access key / secret key pair
#[derive(Clone)]
pub struct NosSigner {
    access_key: String,
    secret_key: String,
}

impl std::fmt::Debug for NosSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NosSigner")
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

impl NosSigner {
    /// Returns `None` when either key is empty (anonymous access)
    pub fn new(access_key: &str, secret_key: &str) -> Option<Self> {
        if access_key.is_empty() || secret_key.is_empty() {
            return None;
        }
        Some(Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// Authorization header value for a request
    pub fn sign(&self, method: &str, headers: &HeaderMap, resource: &str) -> String {
        let string_to_sign = Self::string_to_sign(method, headers, resource);
        tracing::debug!(string_to_sign = %string_to_sign, "signing request");

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(string_to_sign.as_bytes());
        let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());

        format!("{} {}:{}", NOS_SCHEME, self.access_key, signature)
    }

    pub(crate) fn string_to_sign(method: &str, headers: &HeaderMap, resource: &str) -> String {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
        };

        let mut result = String::with_capacity(128 + resource.len());
        result.push_str(method);
        result.push('\n');
        result.push_str(header(CONTENT_MD5));
        result.push('\n');
        result.push_str(header(CONTENT_TYPE));
        result.push('\n');
        result.push_str(header(DATE));
        result.push('\n');
        result.push_str(&Self::canonicalized_headers(headers));
        result.push_str(resource);
        result
    }

    /// `x-nos-*` headers, lowercased and sorted by name, one `name:value` per line
    fn canonicalized_headers(headers: &HeaderMap) -> String {
        // HeaderName is already lowercase; BTreeMap gives the ordering
        let mut nos_headers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, value) in headers {
            if name.as_str().starts_with(X_NOS_PREFIX) {
                if let Ok(value) = value.to_str() {
                    nos_headers
                        .entry(name.as_str())
                        .or_default()
                        .push(value.trim());
                }
            }
        }

        let mut result = String::with_capacity(nos_headers.len() * 48);
        for (name, values) in nos_headers {
            result.push_str(name);
            result.push(':');
            result.push_str(&values.join(","));
            result.push('\n');
        }
        result
    }

    /// `/{bucket}/{encoded_object}` followed by the signed sub-resources
    pub fn canonical_resource(
        bucket: &str,
        encoded_object: &str,
        params: &BTreeMap<String, String>,
    ) -> String {
        let mut resource = String::with_capacity(bucket.len() + encoded_object.len() + 32);
        resource.push('/');
        resource.push_str(bucket);
        resource.push('/');
        resource.push_str(encoded_object);

        let mut first = true;
        for (key, value) in params {
            if !SUB_RESOURCES.contains(&key.as_str()) {
                continue;
            }
            resource.push(if first { '?' } else { '&' });
            first = false;
            resource.push_str(key);
            if !value.is_empty() {
                resource.push('=');
                resource.push_str(value);
            }
        }
        resource
    }

    /// URI encode a string (RFC 3986) using hex lookup table
    pub fn uri_encode(s: &str, encode_slash: bool) -> String {
        let mut result = String::with_capacity(s.len() + 16);
        for byte in s.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    result.push(byte as char);
                }
                b'/' if !encode_slash => {
                    result.push('/');
                }
                _ => {
                    result.push('%');
                    result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                    result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
                }
            }
        }
        result
    }
}
