//! NOS client: one async method per storage operation
//!
//! Every call runs the same pipeline:
//! - validate required fields (no network traffic on failure)
//! - build and sign the request
//! - await exactly one HTTP exchange
//! - map the status code to a typed result or error
//!
//! Nothing is cached between calls and nothing is retried.

use crate::config::Config;
use crate::nos::body;
use crate::nos::consts::{
    CONTENT_MD5, DEFAULT_MAX_KEYS, DEFAULT_MAX_PARTS, DEFAULT_MAX_UPLOADS, DELETE,
    IF_MODIFIED_SINCE, LIST_DELIMITER, LIST_KEY_MARKER, LIST_MARKER, LIST_MAX_KEYS,
    LIST_MAX_UPLOADS, LIST_PREFIX, MAX_DELETE_BODY, MAX_DELETE_OBJECTS, MAX_PARTS,
    MAX_PART_NUMBER, MAX_SINGLE_UPLOAD_SIZE, MIN_PART_NUMBER, PART_NUMBER, PART_NUMBER_MARKER,
    RANGE, UPLOADS, UPLOAD_ID, X_NOS_ACL, X_NOS_COPY_SOURCE, X_NOS_MOVE_SOURCE,
};
use crate::nos::body::{ObjectStream, ResponseBody};
use crate::nos::error::{ClientError, ClientErrorCode, NosError, Result};
use crate::nos::metadata::ObjectMetadata;
use crate::nos::request::{build_request, encode_object_key, BodyStyle, Endpoint, NosRequest};
use crate::nos::response::{
    drain, parse_delete_result, parse_xml, populate_response_header, read_body, remove_quotes,
    server_error,
};
use crate::nos::signer::NosSigner;
use crate::nos::transport::{HyperTransport, Transport};
use crate::nos::types::{
    AbortMultiUploadRequest, CompleteMultiUploadRequest, CompleteMultiUploadResult,
    CopyObjectRequest, CreateBucketRequest, DeleteMultiObjectsRequest, DeleteObjectsResult,
    GetObjectRequest, InitMultiUploadRequest, InitMultiUploadResult, ListMultiUploadsRequest,
    ListMultiUploadsResult, ListObjectsRequest, ListObjectsResult, ListPartsResult,
    ListUploadPartsRequest, MoveObjectRequest, MultipartConfig, NosObject, ObjectRequest,
    ObjectResult, PutFileRequest, PutObjectRequest, UploadPart, UploadPartRequest,
};
use crate::nos::types::{complete_multipart_xml, delete_objects_xml};
use chrono::Utc;
use http::{Method, Response, StatusCode};
use std::path::Path;
use tokio::io::AsyncSeekExt;

/// Async NOS client
///
/// Clone is cheap when the transport is (the default hyper transport uses Arc
/// internally).
#[derive(Clone)]
pub struct NosClient<T = HyperTransport> {
    transport: T,
    endpoint: Endpoint,
    signer: Option<NosSigner>,
}

impl NosClient<HyperTransport> {
    /// Validates `config` and builds a client over the default hyper transport
    pub fn new(config: &Config) -> Result<Self> {
        let transport = HyperTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> NosClient<T> {
    /// Builds a client over a caller-supplied transport
    pub fn with_transport(config: &Config, transport: T) -> Result<Self> {
        config.check()?;
        let signer = NosSigner::new(&config.access_key, &config.secret_key);
        if signer.is_none() {
            tracing::debug!(endpoint = %config.endpoint, "no credentials configured, requests are anonymous");
        }

        Ok(Self {
            transport,
            endpoint: Endpoint::new(config.protocol, &config.endpoint),
            signer,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build, sign and send one request
    async fn execute(&self, request: NosRequest<'_>) -> Result<Response<ResponseBody>> {
        let method = request.method.clone();
        let bucket = request.bucket;
        let object = request.object;

        let http_request = build_request(&self.endpoint, self.signer.as_ref(), request, Utc::now())?;
        let response = self.transport.send(http_request).await?;

        tracing::debug!(
            %method,
            bucket,
            object,
            status = response.status().as_u16(),
            "response received"
        );
        Ok(response)
    }

    /// Send a request and require a 200 response
    async fn execute_ok(&self, request: NosRequest<'_>) -> Result<Response<ResponseBody>> {
        let (style, bucket, object) = (request.body_style, request.bucket, request.object);
        let response = self.execute(request).await?;
        if response.status() != StatusCode::OK {
            return Err(server_error(response, style, bucket, object).await);
        }
        Ok(response)
    }

    /// Send a request, require a 200 response and decode its XML body
    async fn execute_xml<R>(&self, request: NosRequest<'_>) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let response = self.execute_ok(request).await?;
        let data = read_body(response.into_body()).await?;
        parse_xml(&data)
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Upload an object from a request body
    pub async fn put_object_by_stream(&self, request: PutObjectRequest) -> Result<ObjectResult> {
        let PutObjectRequest {
            bucket,
            object,
            body,
            metadata,
        } = request;

        verify_object(&bucket, &object)?;
        let content_length = metadata
            .as_ref()
            .and_then(|m| m.content_length)
            .unwrap_or(0);
        if content_length > MAX_SINGLE_UPLOAD_SIZE {
            return Err(ClientError::new(ClientErrorCode::ContentLengthInvalid)
                .with_resource(&bucket, &object)
                .with_message(format!("{} bytes", content_length))
                .into());
        }
        verify_metadata(&bucket, &object, metadata.as_ref())?;

        let request = NosRequest::new(Method::PUT, &bucket, &object, BodyStyle::Json)
            .metadata(metadata.as_ref())
            .body(body);
        let response = self.execute_ok(request).await?;

        let (request_id, etag) = populate_response_header(response.headers());
        drain(response).await;
        Ok(ObjectResult { etag, request_id })
    }

    /// Upload a local file, streaming it from disk
    ///
    /// The content length defaults to the file size when not set, including
    /// an explicit zero for an empty file.
    pub async fn put_object_by_file(&self, request: PutFileRequest) -> Result<ObjectResult> {
        let PutFileRequest {
            bucket,
            object,
            file_path,
            metadata,
        } = request;

        verify_object(&bucket, &object)?;

        let file = tokio::fs::File::open(&file_path)
            .await
            .map_err(|e| file_invalid(&bucket, &object, &file_path, e))?;

        let mut metadata = metadata.unwrap_or_default();
        if metadata.content_length.is_none() {
            let file_meta = file
                .metadata()
                .await
                .map_err(|e| file_invalid(&bucket, &object, &file_path, e))?;
            metadata.content_length = Some(file_meta.len());
        }

        let request = PutObjectRequest::new(bucket, object, body::from_reader(file))
            .with_metadata(metadata);
        self.put_object_by_stream(request).await
    }

    /// Server-side copy
    pub async fn copy_object(&self, request: &CopyObjectRequest) -> Result<()> {
        let source = verify_source(request)?;

        let req = NosRequest::new(Method::PUT, &request.dest_bucket, &request.dest_object, BodyStyle::Json)
            .header(X_NOS_COPY_SOURCE, source);
        let response = self.execute_ok(req).await?;
        drain(response).await;
        Ok(())
    }

    /// Server-side rename
    pub async fn move_object(&self, request: &MoveObjectRequest) -> Result<()> {
        let source = verify_source(request)?;

        let req = NosRequest::new(Method::PUT, &request.dest_bucket, &request.dest_object, BodyStyle::Json)
            .header(X_NOS_MOVE_SOURCE, source);
        let response = self.execute_ok(req).await?;
        drain(response).await;
        Ok(())
    }

    pub async fn delete_object(&self, request: &ObjectRequest) -> Result<()> {
        verify_object(&request.bucket, &request.object)?;

        let req = NosRequest::new(Method::DELETE, &request.bucket, &request.object, BodyStyle::Json);
        let response = self.execute_ok(req).await?;
        drain(response).await;
        Ok(())
    }

    /// Batch delete, up to 1000 keys and 2MB of request body
    pub async fn delete_multi_objects(
        &self,
        request: &DeleteMultiObjectsRequest,
    ) -> Result<DeleteObjectsResult> {
        verify_bucket(&request.bucket)?;

        if request.objects.is_empty() {
            return Err(ClientError::new(ClientErrorCode::DeleteMultiObjectsError)
                .with_resource(&request.bucket, "")
                .into());
        }
        if request.objects.len() > MAX_DELETE_OBJECTS {
            return Err(ClientError::new(ClientErrorCode::ObjectsTooLarge)
                .with_resource(&request.bucket, "")
                .with_message(format!("{} keys", request.objects.len()))
                .into());
        }

        let xml = delete_objects_xml(&request.objects, request.quiet);
        if xml.len() > MAX_DELETE_BODY {
            return Err(ClientError::new(ClientErrorCode::ObjectsTooLarge)
                .with_resource(&request.bucket, "")
                .with_message(format!("{} byte body", xml.len()))
                .into());
        }

        let content_md5 = hex::encode(md5::compute(xml.as_bytes()).0);
        let metadata = ObjectMetadata::new().with_content_length(xml.len() as u64);

        let req = NosRequest::new(Method::POST, &request.bucket, "", BodyStyle::Xml)
            .metadata(Some(&metadata))
            .header(CONTENT_MD5, content_md5)
            .param(DELETE, "")
            .body(body::full(xml));
        let response = self.execute_ok(req).await?;

        let data = read_body(response.into_body()).await?;
        parse_delete_result(&data)
    }

    /// Download an object as a stream
    ///
    /// Returns `Ok(None)` when the object was not modified since the
    /// requested time (304).
    pub async fn get_object(&self, request: &GetObjectRequest) -> Result<Option<NosObject>> {
        verify_object(&request.bucket, &request.object)?;

        let mut req = NosRequest::new(Method::GET, &request.bucket, &request.object, BodyStyle::Json);
        if let Some(range) = &request.range {
            req = req.header(RANGE, range.as_str());
        }
        if let Some(since) = &request.if_modified_since {
            req = req.header(IF_MODIFIED_SINCE, since.as_str());
        }
        let response = self.execute(req).await?;

        match response.status() {
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => {
                let (parts, body) = response.into_parts();
                Ok(Some(NosObject {
                    bucket: request.bucket.clone(),
                    object: request.object.clone(),
                    metadata: ObjectMetadata::from_headers(&parts.headers),
                    body: ObjectStream::new(body),
                }))
            }
            StatusCode::NOT_MODIFIED => {
                drain(response).await;
                Ok(None)
            }
            _ => Err(server_error(response, BodyStyle::Json, &request.bucket, &request.object).await),
        }
    }

    /// HEAD the object; 404 maps to `false`
    pub async fn does_object_exist(&self, request: &ObjectRequest) -> Result<bool> {
        verify_object(&request.bucket, &request.object)?;

        let req = NosRequest::new(Method::HEAD, &request.bucket, &request.object, BodyStyle::Json);
        self.head_exists(req).await
    }

    /// All response headers of a HEAD request
    pub async fn get_object_metadata(&self, request: &ObjectRequest) -> Result<ObjectMetadata> {
        verify_object(&request.bucket, &request.object)?;

        let req = NosRequest::new(Method::HEAD, &request.bucket, &request.object, BodyStyle::Json);
        let response = self.execute_ok(req).await?;
        let metadata = ObjectMetadata::from_headers(response.headers());
        drain(response).await;
        Ok(metadata)
    }

    pub async fn list_objects(&self, request: &ListObjectsRequest) -> Result<ListObjectsResult> {
        verify_bucket(&request.bucket)?;

        let max_keys = request
            .max_keys
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_KEYS);

        let mut req = NosRequest::new(Method::GET, &request.bucket, "", BodyStyle::Xml)
            .param(LIST_MAX_KEYS, max_keys.to_string());
        for (key, value) in [
            (LIST_PREFIX, &request.prefix),
            (LIST_DELIMITER, &request.delimiter),
            (LIST_MARKER, &request.marker),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                req = req.param(key, value);
            }
        }

        self.execute_xml(req).await
    }

    // =========================================================================
    // Buckets
    // =========================================================================

    pub async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<()> {
        verify_bucket(&request.bucket)?;

        let mut req = NosRequest::new(Method::PUT, &request.bucket, "", BodyStyle::Json);
        if let Some(acl) = request.acl {
            req = req.header(X_NOS_ACL, acl.as_str());
        }
        let response = self.execute_ok(req).await?;
        drain(response).await;
        Ok(())
    }

    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        verify_bucket(bucket)?;

        let req = NosRequest::new(Method::DELETE, bucket, "", BodyStyle::Json);
        let response = self.execute_ok(req).await?;
        drain(response).await;
        Ok(())
    }

    /// HEAD the bucket; 404 maps to `false`
    pub async fn does_bucket_exist(&self, bucket: &str) -> Result<bool> {
        verify_bucket(bucket)?;

        let req = NosRequest::new(Method::HEAD, bucket, "", BodyStyle::Json);
        self.head_exists(req).await
    }

    async fn head_exists(&self, request: NosRequest<'_>) -> Result<bool> {
        let (style, bucket, object) = (request.body_style, request.bucket, request.object);
        let response = self.execute(request).await?;

        match response.status() {
            StatusCode::OK => {
                drain(response).await;
                Ok(true)
            }
            StatusCode::NOT_FOUND => {
                drain(response).await;
                Ok(false)
            }
            _ => Err(server_error(response, style, bucket, object).await),
        }
    }

    // =========================================================================
    // Multipart Uploads
    // =========================================================================

    pub async fn init_multi_upload(
        &self,
        request: &InitMultiUploadRequest,
    ) -> Result<InitMultiUploadResult> {
        verify_object(&request.bucket, &request.object)?;
        verify_metadata(&request.bucket, &request.object, request.metadata.as_ref())?;

        let req = NosRequest::new(Method::POST, &request.bucket, &request.object, BodyStyle::Xml)
            .metadata(request.metadata.as_ref())
            .param(UPLOADS, "");
        self.execute_xml(req).await
    }

    /// Upload one part; never sends more than `part_size` bytes
    pub async fn upload_part(&self, request: UploadPartRequest) -> Result<ObjectResult> {
        let UploadPartRequest {
            bucket,
            object,
            upload_id,
            part_number,
            part_size,
            content,
        } = request;

        verify_object(&bucket, &object)?;
        verify_upload_id(&bucket, &object, &upload_id)?;
        verify_part_number(&bucket, &object, part_number)?;

        let metadata = ObjectMetadata::new().with_content_length(part_size);
        let req = NosRequest::new(Method::PUT, &bucket, &object, BodyStyle::Json)
            .metadata(Some(&metadata))
            .param(UPLOAD_ID, upload_id.as_str())
            .param(PART_NUMBER, part_number.to_string())
            .body(body::capped(content, part_size));
        let response = self.execute_ok(req).await?;

        let (request_id, etag) = populate_response_header(response.headers());
        drain(response).await;
        Ok(ObjectResult { etag, request_id })
    }

    /// Complete an upload; parts are sent in ascending part number order and
    /// the returned ETag has its quotes stripped
    pub async fn complete_multi_upload(
        &self,
        request: &CompleteMultiUploadRequest,
    ) -> Result<CompleteMultiUploadResult> {
        verify_object(&request.bucket, &request.object)?;
        verify_upload_id(&request.bucket, &request.object, &request.upload_id)?;
        for part in &request.parts {
            verify_part_number(&request.bucket, &request.object, part.part_number)?;
        }

        let xml = complete_multipart_xml(&request.parts);
        let metadata = ObjectMetadata::new().with_content_length(xml.len() as u64);

        let req = NosRequest::new(Method::POST, &request.bucket, &request.object, BodyStyle::Xml)
            .metadata(Some(&metadata))
            .param(UPLOAD_ID, request.upload_id.as_str())
            .body(body::full(xml));

        let mut result: CompleteMultiUploadResult = self.execute_xml(req).await?;
        result.etag = remove_quotes(&result.etag);
        Ok(result)
    }

    pub async fn abort_multi_upload(&self, request: &AbortMultiUploadRequest) -> Result<()> {
        verify_object(&request.bucket, &request.object)?;
        verify_upload_id(&request.bucket, &request.object, &request.upload_id)?;

        let req = NosRequest::new(Method::DELETE, &request.bucket, &request.object, BodyStyle::Json)
            .param(UPLOAD_ID, request.upload_id.as_str());
        let response = self.execute_ok(req).await?;
        drain(response).await;
        Ok(())
    }

    pub async fn list_upload_parts(&self, request: &ListUploadPartsRequest) -> Result<ListPartsResult> {
        verify_object(&request.bucket, &request.object)?;
        verify_upload_id(&request.bucket, &request.object, &request.upload_id)?;

        let max_parts = request
            .max_parts
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_PARTS);

        let mut req = NosRequest::new(Method::GET, &request.bucket, &request.object, BodyStyle::Xml)
            .param(UPLOAD_ID, request.upload_id.as_str())
            .param(MAX_PARTS, max_parts.to_string());
        if let Some(marker) = request.part_number_marker.filter(|&n| n > 0) {
            req = req.param(PART_NUMBER_MARKER, marker.to_string());
        }

        self.execute_xml(req).await
    }

    pub async fn list_multi_uploads(
        &self,
        request: &ListMultiUploadsRequest,
    ) -> Result<ListMultiUploadsResult> {
        verify_bucket(&request.bucket)?;

        let max_uploads = request
            .max_uploads
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_UPLOADS);

        let mut req = NosRequest::new(Method::GET, &request.bucket, "", BodyStyle::Xml)
            .param(UPLOADS, "")
            .param(LIST_MAX_UPLOADS, max_uploads.to_string());
        if let Some(marker) = request.key_marker.as_deref().filter(|m| !m.is_empty()) {
            req = req.param(LIST_KEY_MARKER, marker);
        }

        self.execute_xml(req).await
    }

    /// Upload a local file as a multipart upload
    ///
    /// Parts are read straight from disk one at a time. If any part fails the
    /// upload is aborted and the part error is returned.
    pub async fn upload_file_multipart(
        &self,
        bucket: &str,
        object: &str,
        path: impl AsRef<Path>,
        config: &MultipartConfig,
    ) -> Result<CompleteMultiUploadResult> {
        let path = path.as_ref();
        verify_object(bucket, object)?;

        let file_size = tokio::fs::metadata(path)
            .await
            .map_err(|e| file_invalid(bucket, object, path, e))?
            .len();

        let part_size = config.part_size.max(1);
        let num_parts = file_size.div_ceil(part_size).max(1);
        if num_parts > u64::from(MAX_PART_NUMBER) {
            return Err(ClientError::new(ClientErrorCode::PartNumberInvalid)
                .with_resource(bucket, object)
                .with_message(format!("{} parts of {} bytes", num_parts, part_size))
                .into());
        }

        let init = self
            .init_multi_upload(&InitMultiUploadRequest::new(bucket, object))
            .await?;
        let upload_id = init.upload_id;

        let mut parts = Vec::with_capacity(num_parts as usize);
        let mut upload_error: Option<NosError> = None;

        for index in 0..num_parts {
            let offset = index * part_size;
            let size = part_size.min(file_size - offset);
            let part_number = (index + 1) as u32;

            match self
                .upload_file_part(bucket, object, &upload_id, path, part_number, offset, size)
                .await
            {
                Ok(result) => parts.push(UploadPart::new(part_number, result.etag)),
                Err(e) => {
                    upload_error = Some(e);
                    break;
                }
            }
        }

        // If any upload failed, abort
        if let Some(err) = upload_error {
            let abort = AbortMultiUploadRequest::new(bucket, object, upload_id.as_str());
            if let Err(abort_err) = self.abort_multi_upload(&abort).await {
                tracing::warn!(
                    bucket,
                    object,
                    upload_id = %upload_id,
                    error = %abort_err,
                    "failed to abort multipart upload"
                );
            }
            return Err(err);
        }

        self.complete_multi_upload(&CompleteMultiUploadRequest::new(
            bucket, object, upload_id, parts,
        ))
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn upload_file_part(
        &self,
        bucket: &str,
        object: &str,
        upload_id: &str,
        path: &Path,
        part_number: u32,
        offset: u64,
        size: u64,
    ) -> Result<ObjectResult> {
        let mut file = tokio::fs::File::open(path).await?;
        file.seek(std::io::SeekFrom::Start(offset)).await?;

        let request = UploadPartRequest::new(bucket, object, upload_id, part_number, size, file);
        self.upload_part(request).await
    }
}

impl<T> std::fmt::Debug for NosClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NosClient")
            .field("endpoint", &self.endpoint)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Validation
// =============================================================================

fn verify_bucket(bucket: &str) -> std::result::Result<(), ClientError> {
    if bucket.is_empty() {
        return Err(ClientError::new(ClientErrorCode::BucketInvalid));
    }
    Ok(())
}

fn verify_object(bucket: &str, object: &str) -> std::result::Result<(), ClientError> {
    verify_bucket(bucket)?;
    if object.is_empty() {
        return Err(ClientError::new(ClientErrorCode::ObjectInvalid).with_resource(bucket, ""));
    }
    Ok(())
}

fn verify_upload_id(bucket: &str, object: &str, upload_id: &str) -> std::result::Result<(), ClientError> {
    if upload_id.trim().is_empty() {
        return Err(ClientError::new(ClientErrorCode::UploadIdInvalid).with_resource(bucket, object));
    }
    Ok(())
}

fn verify_part_number(bucket: &str, object: &str, part_number: u32) -> std::result::Result<(), ClientError> {
    if !(MIN_PART_NUMBER..=MAX_PART_NUMBER).contains(&part_number) {
        return Err(ClientError::new(ClientErrorCode::PartNumberInvalid)
            .with_resource(bucket, object)
            .with_message(format!("part number {}", part_number)));
    }
    Ok(())
}

fn verify_metadata(
    bucket: &str,
    object: &str,
    metadata: Option<&ObjectMetadata>,
) -> std::result::Result<(), ClientError> {
    if let Some(key) = metadata.and_then(ObjectMetadata::first_invalid_key) {
        return Err(ClientError::new(ClientErrorCode::MetadataInvalid)
            .with_resource(bucket, object)
            .with_message(format!("key {:?}", key)));
    }
    Ok(())
}

/// Validates both ends of a copy or move and returns the encoded source
///
/// A bad destination is reported with the usual bucket/object codes, a bad
/// source with `SrcBucketAndObjectError`.
fn verify_source(request: &CopyObjectRequest) -> std::result::Result<String, ClientError> {
    verify_object(&request.dest_bucket, &request.dest_object)?;
    if verify_object(&request.src_bucket, &request.src_object).is_err() {
        return Err(ClientError::new(ClientErrorCode::SrcBucketAndObjectError)
            .with_resource(&request.dest_bucket, &request.dest_object));
    }
    Ok(format!(
        "/{}/{}",
        encode_object_key(&request.src_bucket),
        encode_object_key(&request.src_object)
    ))
}

fn file_invalid(bucket: &str, object: &str, path: &Path, err: std::io::Error) -> ClientError {
    ClientError::new(ClientErrorCode::FileInvalid)
        .with_resource(bucket, object)
        .with_message(format!("{}: {}", path.display(), err))
}
