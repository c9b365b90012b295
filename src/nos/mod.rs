//! NOS object storage client
//!
//! This module provides:
//! - NOS HMAC-SHA256 request signing
//! - Async object, bucket and multipart operations
//! - Typed requests, results and errors

pub mod body;
pub mod client;
pub mod consts;
pub mod error;
pub mod metadata;
pub mod request;
pub mod response;
pub mod signer;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use body::{ObjectStream, RequestBody, ResponseBody};
pub use client::NosClient;
pub use error::{ClientError, ClientErrorCode, NosError, Result, ServerError, TransportError};
pub use metadata::{MetadataKey, ObjectMetadata};
pub use request::BodyStyle;
pub use signer::NosSigner;
pub use transport::{HyperTransport, ReadTimeoutBody, Transport};
pub use types::{
    AbortMultiUploadRequest, BucketAcl, CommonPrefix, CompleteMultiUploadRequest,
    CompleteMultiUploadResult, CopyObjectRequest, CreateBucketRequest, DeleteError,
    DeleteMultiObjectsRequest, DeleteObjectsResult, DeletedObject, GetObjectRequest,
    InitMultiUploadRequest, InitMultiUploadResult, ListMultiUploadsRequest,
    ListMultiUploadsResult, ListObjectsRequest, ListObjectsResult, ListPartsResult,
    ListUploadPartsRequest, MoveObjectRequest, MultipartConfig, MultipartUpload, NosObject,
    ObjectRequest, ObjectResult, ObjectSummary, Owner, PartReader, PartSummary,
    PutFileRequest, PutObjectRequest, UploadPart, UploadPartRequest,
};
