//! Request builder: typed parameters in, signed `http::Request` out

use crate::config::Protocol;
use crate::nos::body::{self, RequestBody};
use crate::nos::consts::{RFC1123_NOS, X_NOS_ENTITY_TYPE};
use crate::nos::error::{ClientError, ClientErrorCode, Result};
use crate::nos::metadata::ObjectMetadata;
use crate::nos::signer::NosSigner;
use chrono::{DateTime, Utc};
use http::header::{AUTHORIZATION, CONTENT_LENGTH, DATE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use std::collections::BTreeMap;

/// Selects how the service encodes error bodies for this request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStyle {
    Json,
    Xml,
}

impl BodyStyle {
    pub const fn as_str(self) -> &'static str {
        match self {
            BodyStyle::Json => "json",
            BodyStyle::Xml => "xml",
        }
    }
}

/// Everything needed to build one request
pub(crate) struct NosRequest<'a> {
    pub method: Method,
    pub bucket: &'a str,
    pub object: &'a str,
    pub metadata: Option<&'a ObjectMetadata>,
    pub headers: Vec<(&'static str, String)>,
    pub params: BTreeMap<String, String>,
    pub body: RequestBody,
    pub body_style: BodyStyle,
}

impl<'a> NosRequest<'a> {
    pub fn new(method: Method, bucket: &'a str, object: &'a str, body_style: BodyStyle) -> Self {
        Self {
            method,
            bucket,
            object,
            metadata: None,
            headers: Vec::new(),
            params: BTreeMap::new(),
            body: body::empty(),
            body_style,
        }
    }

    pub fn metadata(mut self, metadata: Option<&'a ObjectMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Adds a query parameter; an empty value is sent as a bare flag
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

/// Scheme and host the bucket subdomains hang off
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
    scheme: &'static str,
    host: String,
}

impl Endpoint {
    pub fn new(protocol: Protocol, host: &str) -> Self {
        let host = host
            .trim()
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/');
        Self {
            scheme: protocol.scheme(),
            host: host.to_string(),
        }
    }

    /// `{scheme}://{bucket}.{host}/{encoded_object}[?query]`
    pub fn url(&self, bucket: &str, encoded_object: &str, params: &BTreeMap<String, String>) -> String {
        let mut url = String::with_capacity(
            self.scheme.len() + bucket.len() + self.host.len() + encoded_object.len() + 64,
        );
        url.push_str(self.scheme);
        url.push_str("://");
        url.push_str(bucket);
        url.push('.');
        url.push_str(&self.host);
        url.push('/');
        url.push_str(encoded_object);

        let mut first = true;
        for (key, value) in params {
            url.push(if first { '?' } else { '&' });
            first = false;
            url.push_str(&urlencoding::encode(key));
            if !value.is_empty() {
                url.push('=');
                url.push_str(&urlencoding::encode(value));
            }
        }
        url
    }
}

/// Percent-encodes an object key, keeping `/` separators
pub(crate) fn encode_object_key(object: &str) -> String {
    NosSigner::uri_encode(object, false)
}

fn invalid_request(message: impl Into<String>) -> ClientError {
    ClientError::new(ClientErrorCode::InvalidRequest).with_message(message)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| invalid_request(format!("header name {:?}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| invalid_request(format!("header {}: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

/// Builds the signed request.
///
/// The encoded key is placed in the request target verbatim, so characters
/// escaped here reach the wire without being re-normalized.
pub(crate) fn build_request(
    endpoint: &Endpoint,
    signer: Option<&NosSigner>,
    request: NosRequest<'_>,
    date: DateTime<Utc>,
) -> Result<Request<RequestBody>> {
    let encoded_object = encode_object_key(request.object);
    let url = endpoint.url(request.bucket, &encoded_object, &request.params);

    let mut headers = HeaderMap::new();
    insert_header(&mut headers, DATE.as_str(), &date.format(RFC1123_NOS).to_string())?;
    insert_header(&mut headers, X_NOS_ENTITY_TYPE, request.body_style.as_str())?;

    if let Some(metadata) = request.metadata {
        for (key, value) in &metadata.metadata {
            if !value.is_empty() {
                insert_header(&mut headers, key, value)?;
            }
        }
        if let Some(content_length) = metadata.content_length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(content_length));
        }
    }

    for (name, value) in &request.headers {
        if !value.is_empty() {
            insert_header(&mut headers, name, value)?;
        }
    }

    if let Some(signer) = signer {
        let resource = NosSigner::canonical_resource(request.bucket, &encoded_object, &request.params);
        let authorization = signer.sign(request.method.as_str(), &headers, &resource);
        insert_header(&mut headers, AUTHORIZATION.as_str(), &authorization)?;
    }

    let mut http_request = Request::builder()
        .method(request.method)
        .uri(url)
        .body(request.body)?;
    *http_request.headers_mut() = headers;

    Ok(http_request)
}
