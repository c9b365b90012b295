//! Response mapping: headers, XML bodies and server errors

use crate::nos::body::ResponseBody;
use crate::nos::consts::{ETAG, X_NOS_REQUEST_ID};
use crate::nos::error::{NosError, Result, ServerError, TransportError};
use crate::nos::request::BodyStyle;
use crate::nos::types::{DeleteError, DeleteObjectsResult, DeletedObject};
use bytes::Bytes;
use http::{HeaderMap, Response};
use http_body_util::BodyExt;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Deserialize;

fn header_string(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `(request_id, etag)` from the response headers
pub(crate) fn populate_response_header(headers: &HeaderMap) -> (String, String) {
    (header_string(headers, X_NOS_REQUEST_ID), header_string(headers, ETAG))
}

/// Strips one pair of surrounding double quotes
pub fn remove_quotes(s: &str) -> String {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .to_string()
}

/// Reads the whole body into memory
pub(crate) async fn read_body(body: ResponseBody) -> Result<Bytes> {
    let collected = body.collect().await.map_err(TransportError::from_body)?;
    Ok(collected.to_bytes())
}

/// Reads and discards the body so the connection can go back to the pool
pub(crate) async fn drain(response: Response<ResponseBody>) {
    if let Err(e) = response.into_body().collect().await {
        tracing::debug!(error = %e, "failed to drain response body");
    }
}

/// Deserializes an XML body into `T`
pub(crate) fn parse_xml<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    Ok(quick_xml::de::from_reader(data)?)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ErrorBody {
    #[serde(alias = "code")]
    code: String,
    #[serde(alias = "message")]
    message: String,
    #[serde(alias = "resource")]
    resource: String,
    #[serde(alias = "requestId")]
    request_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonErrorBody {
    Wrapped {
        #[serde(rename = "Error", alias = "error")]
        error: ErrorBody,
    },
    Bare(ErrorBody),
}

fn decode_error_body(data: &[u8], style: BodyStyle) -> Option<ErrorBody> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let decoded = match style {
        BodyStyle::Xml => quick_xml::de::from_reader::<_, ErrorBody>(data).ok(),
        BodyStyle::Json => serde_json::from_slice::<JsonErrorBody>(data)
            .ok()
            .map(|body| match body {
                JsonErrorBody::Wrapped { error } => error,
                JsonErrorBody::Bare(error) => error,
            }),
    };
    decoded.filter(|body| !body.code.is_empty() || !body.request_id.is_empty())
}

/// Consumes a non-success response and decodes it into a [`ServerError`].
///
/// The body is always read to the end. When it is empty or cannot be decoded
/// the code falls back to the status reason and the request id to the
/// `x-nos-request-id` header.
pub(crate) async fn server_error(
    response: Response<ResponseBody>,
    style: BodyStyle,
    bucket: &str,
    object: &str,
) -> NosError {
    let (parts, body) = response.into_parts();
    let status = parts.status;
    let header_request_id = header_string(&parts.headers, X_NOS_REQUEST_ID);
    let reason = status.canonical_reason().unwrap_or("Unknown").to_string();

    let data = match read_body(body).await {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!(error = %e, "failed to read error body");
            Bytes::new()
        }
    };

    let error = match decode_error_body(&data, style) {
        Some(body) => ServerError {
            status,
            code: if body.code.is_empty() { reason } else { body.code },
            message: body.message,
            request_id: if body.request_id.is_empty() {
                header_request_id
            } else {
                body.request_id
            },
            resource: body.resource,
            bucket: bucket.to_string(),
            object: object.to_string(),
        },
        None => ServerError {
            status,
            code: reason,
            message: String::from_utf8_lossy(&data).trim().to_string(),
            request_id: header_request_id,
            resource: String::new(),
            bucket: bucket.to_string(),
            object: object.to_string(),
        },
    };

    tracing::debug!(
        status = status.as_u16(),
        code = %error.code,
        request_id = %error.request_id,
        "server returned error"
    );
    NosError::Server(error)
}

/// Parses a batch delete result.
///
/// Byte-slice tag matching, `std::mem::take` to move text into the entries.
pub(crate) fn parse_delete_result(xml_data: &[u8]) -> Result<DeleteObjectsResult> {
    let mut reader = Reader::from_reader(xml_data);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut result = DeleteObjectsResult::default();
    let mut current_deleted: Option<DeletedObject> = None;
    let mut current_error: Option<DeleteError> = None;
    let mut current_text = String::with_capacity(256);

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Deleted" => current_deleted = Some(DeletedObject::default()),
                b"Error" => current_error = Some(DeleteError::default()),
                _ => {}
            },
            Event::Text(e) => {
                current_text.clear();
                current_text.push_str(&e.unescape()?);
            }
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"Key" => {
                        if let Some(ref mut deleted) = current_deleted {
                            deleted.key = std::mem::take(&mut current_text);
                        } else if let Some(ref mut error) = current_error {
                            error.key = std::mem::take(&mut current_text);
                        }
                    }
                    b"Code" => {
                        if let Some(ref mut error) = current_error {
                            error.code = std::mem::take(&mut current_text);
                        }
                    }
                    b"Message" => {
                        if let Some(ref mut error) = current_error {
                            error.message = std::mem::take(&mut current_text);
                        }
                    }
                    b"Deleted" => {
                        if let Some(deleted) = current_deleted.take() {
                            result.deleted.push(deleted);
                        }
                    }
                    b"Error" => {
                        if let Some(error) = current_error.take() {
                            result.errors.push(error);
                        }
                    }
                    _ => {}
                }
                current_text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(result)
}
