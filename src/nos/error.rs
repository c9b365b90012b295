//! Error types for the NOS client
//!
//! Four families reach the caller:
//! - [`ClientError`]: request rejected locally, before any network call
//! - [`TransportError`]: the HTTP exchange itself failed
//! - [`ServerError`]: the service answered with a non-success status
//! - `Decode`: a success response carried a body we could not parse

use http::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, NosError>;

/// Top-level error returned by every client operation
#[derive(Error, Debug)]
pub enum NosError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("XML decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NosError {
    /// Returns the client error code when the request was rejected locally.
    pub fn client_code(&self) -> Option<ClientErrorCode> {
        match self {
            NosError::Client(e) => Some(e.code),
            _ => None,
        }
    }

    /// Returns the decoded server error, if any.
    pub fn as_server_error(&self) -> Option<&ServerError> {
        match self {
            NosError::Server(e) => Some(e),
            _ => None,
        }
    }
}

impl From<quick_xml::DeError> for NosError {
    fn from(err: quick_xml::DeError) -> Self {
        NosError::Decode(err.to_string())
    }
}

impl From<quick_xml::Error> for NosError {
    fn from(err: quick_xml::Error) -> Self {
        NosError::Decode(err.to_string())
    }
}

impl From<http::Error> for NosError {
    fn from(err: http::Error) -> Self {
        NosError::Client(ClientError::new(ClientErrorCode::InvalidRequest).with_message(err.to_string()))
    }
}

/// Catalog of client-side error codes.
///
/// Every code carries a stable numeric value and a fixed description, so the
/// catalog is a plain value available from anywhere without initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientErrorCode {
    ConfigEndpoint,
    ConfigTimeout,
    ConfigMaxIdleConnection,
    ConfigTls,
    BucketInvalid,
    ObjectInvalid,
    ContentLengthInvalid,
    FileInvalid,
    SrcBucketAndObjectError,
    DeleteMultiObjectsError,
    ObjectsTooLarge,
    MetadataInvalid,
    UploadIdInvalid,
    PartNumberInvalid,
    InvalidRequest,
}

impl ClientErrorCode {
    pub const ALL: [ClientErrorCode; 15] = [
        ClientErrorCode::ConfigEndpoint,
        ClientErrorCode::ConfigTimeout,
        ClientErrorCode::ConfigMaxIdleConnection,
        ClientErrorCode::ConfigTls,
        ClientErrorCode::BucketInvalid,
        ClientErrorCode::ObjectInvalid,
        ClientErrorCode::ContentLengthInvalid,
        ClientErrorCode::FileInvalid,
        ClientErrorCode::SrcBucketAndObjectError,
        ClientErrorCode::DeleteMultiObjectsError,
        ClientErrorCode::ObjectsTooLarge,
        ClientErrorCode::MetadataInvalid,
        ClientErrorCode::UploadIdInvalid,
        ClientErrorCode::PartNumberInvalid,
        ClientErrorCode::InvalidRequest,
    ];

    pub const fn code(self) -> u16 {
        match self {
            ClientErrorCode::ConfigEndpoint => 420,
            ClientErrorCode::ConfigTimeout => 421,
            ClientErrorCode::ConfigMaxIdleConnection => 422,
            ClientErrorCode::ConfigTls => 423,
            ClientErrorCode::BucketInvalid => 430,
            ClientErrorCode::ObjectInvalid => 431,
            ClientErrorCode::ContentLengthInvalid => 432,
            ClientErrorCode::FileInvalid => 434,
            ClientErrorCode::SrcBucketAndObjectError => 435,
            ClientErrorCode::DeleteMultiObjectsError => 436,
            ClientErrorCode::ObjectsTooLarge => 437,
            ClientErrorCode::MetadataInvalid => 438,
            ClientErrorCode::UploadIdInvalid => 439,
            ClientErrorCode::PartNumberInvalid => 440,
            ClientErrorCode::InvalidRequest => 441,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            ClientErrorCode::ConfigEndpoint => "endpoint is not configured",
            ClientErrorCode::ConfigTimeout => "timeouts must be greater than zero",
            ClientErrorCode::ConfigMaxIdleConnection => {
                "max idle connections must be greater than zero"
            }
            ClientErrorCode::ConfigTls => "failed to build TLS connector",
            ClientErrorCode::BucketInvalid => "bucket name is empty",
            ClientErrorCode::ObjectInvalid => "object name is empty",
            ClientErrorCode::ContentLengthInvalid => "content length exceeds the single upload limit",
            ClientErrorCode::FileInvalid => "local file cannot be read",
            ClientErrorCode::SrcBucketAndObjectError => "source bucket or object is invalid",
            ClientErrorCode::DeleteMultiObjectsError => "no objects given for batch delete",
            ClientErrorCode::ObjectsTooLarge => "batch delete exceeds the key count or body size limit",
            ClientErrorCode::MetadataInvalid => "metadata key is not allowed",
            ClientErrorCode::UploadIdInvalid => "upload id is empty",
            ClientErrorCode::PartNumberInvalid => "part number must be within 1..=10000",
            ClientErrorCode::InvalidRequest => "request could not be constructed",
        }
    }
}

impl fmt::Display for ClientErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Request rejected before reaching the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub code: ClientErrorCode,
    pub bucket: String,
    pub object: String,
    pub message: String,
}

impl ClientError {
    pub fn new(code: ClientErrorCode) -> Self {
        Self {
            code,
            bucket: String::new(),
            object: String::new(),
            message: String::new(),
        }
    }

    pub fn with_resource(mut self, bucket: &str, object: &str) -> Self {
        self.bucket = bucket.to_string();
        self.object = object.to_string();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client error {}: {}", self.code, self.code.description())?;
        if !self.bucket.is_empty() {
            write!(f, " (bucket={}", self.bucket)?;
            if !self.object.is_empty() {
                write!(f, ", object={}", self.object)?;
            }
            f.write_str(")")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ClientError {}

/// Structured error answered by the service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("server error {status} {code}: {message} (request id: {request_id}, resource: {resource})")]
pub struct ServerError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub resource: String,
    pub bucket: String,
    pub object: String,
}

impl ServerError {
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// Failure of the HTTP exchange itself. Never retried.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[source] BoxError),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("response body stalled for {0:?}")]
    ReadTimeout(Duration),

    #[error("body error: {0}")]
    Body(#[source] BoxError),
}

impl TransportError {
    /// Unwraps a transport error carried through a body error, if any
    pub(crate) fn from_body(err: BoxError) -> Self {
        match err.downcast::<TransportError>() {
            Ok(err) => *err,
            Err(err) => TransportError::Body(err),
        }
    }
}

impl From<hyper_util::client::legacy::Error> for TransportError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        TransportError::Request(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_codes_are_unique() {
        let codes: HashSet<u16> = ClientErrorCode::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), ClientErrorCode::ALL.len());
    }

    #[test]
    fn test_client_error_display() {
        let err = ClientError::new(ClientErrorCode::ObjectInvalid).with_resource("photos", "");
        assert_eq!(err.to_string(), "client error 431: object name is empty (bucket=photos)");

        let err = ClientError::new(ClientErrorCode::FileInvalid).with_message("No such file");
        assert_eq!(err.to_string(), "client error 434: local file cannot be read: No such file");
    }

    #[test]
    fn test_client_code_accessor() {
        let err: NosError = ClientError::new(ClientErrorCode::BucketInvalid).into();
        assert_eq!(err.client_code(), Some(ClientErrorCode::BucketInvalid));
        assert!(err.as_server_error().is_none());
    }

    #[test]
    fn test_http_error_is_client_side() {
        let err = http::Request::builder()
            .uri("http://bad uri")
            .body(())
            .unwrap_err();
        let err: NosError = err.into();
        assert_eq!(err.client_code(), Some(ClientErrorCode::InvalidRequest));
    }
}
