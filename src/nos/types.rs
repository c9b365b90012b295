//! Operation requests and results

use crate::nos::body::{self, ObjectStream, RequestBody};
use crate::nos::consts::RFC1123_NOS;
use crate::nos::metadata::ObjectMetadata;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::AsyncRead;

// =============================================================================
// Object Requests
// =============================================================================

/// Upload from an arbitrary body
pub struct PutObjectRequest {
    pub bucket: String,
    pub object: String,
    pub body: RequestBody,
    pub metadata: Option<ObjectMetadata>,
}

impl PutObjectRequest {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>, body: RequestBody) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            body,
            metadata: None,
        }
    }

    /// In-memory upload with the content length filled in
    pub fn from_bytes(bucket: impl Into<String>, object: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let metadata = ObjectMetadata::new().with_content_length(data.len() as u64);
        Self::new(bucket, object, body::full(data)).with_metadata(metadata)
    }

    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl fmt::Debug for PutObjectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutObjectRequest")
            .field("bucket", &self.bucket)
            .field("object", &self.object)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Upload of a local file
#[derive(Debug, Clone)]
pub struct PutFileRequest {
    pub bucket: String,
    pub object: String,
    pub file_path: PathBuf,
    pub metadata: Option<ObjectMetadata>,
}

impl PutFileRequest {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            file_path: file_path.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetObjectRequest {
    pub bucket: String,
    pub object: String,
    /// Raw `Range` header value, e.g. `bytes=0-99`
    pub range: Option<String>,
    /// Raw `If-Modified-Since` header value
    pub if_modified_since: Option<String>,
}

impl GetObjectRequest {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            ..Default::default()
        }
    }

    /// Inclusive byte range
    pub fn with_range(mut self, start: u64, end: u64) -> Self {
        self.range = Some(format!("bytes={}-{}", start, end));
        self
    }

    pub fn with_if_modified_since(mut self, since: DateTime<Utc>) -> Self {
        self.if_modified_since = Some(since.format(RFC1123_NOS).to_string());
        self
    }
}

/// Bucket and key of one object (delete, head, exists)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRequest {
    pub bucket: String,
    pub object: String,
}

impl ObjectRequest {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyObjectRequest {
    pub src_bucket: String,
    pub src_object: String,
    pub dest_bucket: String,
    pub dest_object: String,
}

impl CopyObjectRequest {
    pub fn new(
        src_bucket: impl Into<String>,
        src_object: impl Into<String>,
        dest_bucket: impl Into<String>,
        dest_object: impl Into<String>,
    ) -> Self {
        Self {
            src_bucket: src_bucket.into(),
            src_object: src_object.into(),
            dest_bucket: dest_bucket.into(),
            dest_object: dest_object.into(),
        }
    }
}

/// Server-side rename; same shape as a copy
pub type MoveObjectRequest = CopyObjectRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMultiObjectsRequest {
    pub bucket: String,
    pub objects: Vec<String>,
    /// Only report failed keys
    pub quiet: bool,
}

impl DeleteMultiObjectsRequest {
    pub fn new<I, S>(bucket: impl Into<String>, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bucket: bucket.into(),
            objects: objects.into_iter().map(Into::into).collect(),
            quiet: false,
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub marker: Option<String>,
    /// Defaults to 100 when unset or zero
    pub max_keys: Option<u32>,
}

impl ListObjectsRequest {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = Some(max_keys);
        self
    }
}

// =============================================================================
// Bucket Requests
// =============================================================================

/// Canned ACL applied when creating a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketAcl {
    Private,
    PublicRead,
}

impl BucketAcl {
    pub const fn as_str(self) -> &'static str {
        match self {
            BucketAcl::Private => "private",
            BucketAcl::PublicRead => "public-read",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketRequest {
    pub bucket: String,
    pub acl: Option<BucketAcl>,
}

impl CreateBucketRequest {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            acl: None,
        }
    }

    pub fn with_acl(mut self, acl: BucketAcl) -> Self {
        self.acl = Some(acl);
        self
    }
}

// =============================================================================
// Multipart Upload Requests
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct InitMultiUploadRequest {
    pub bucket: String,
    pub object: String,
    pub metadata: Option<ObjectMetadata>,
}

impl InitMultiUploadRequest {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Reader supplying the bytes of one part
pub type PartReader = Pin<Box<dyn AsyncRead + Send>>;

/// One part of a multipart upload.
///
/// At most `part_size` bytes are read from `content`.
pub struct UploadPartRequest {
    pub bucket: String,
    pub object: String,
    pub upload_id: String,
    pub part_number: u32,
    pub part_size: u64,
    pub content: PartReader,
}

impl UploadPartRequest {
    pub fn new<R>(
        bucket: impl Into<String>,
        object: impl Into<String>,
        upload_id: impl Into<String>,
        part_number: u32,
        part_size: u64,
        content: R,
    ) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            upload_id: upload_id.into(),
            part_number,
            part_size,
            content: Box::pin(content),
        }
    }

    /// In-memory part with `part_size` set to the data length
    pub fn from_bytes(
        bucket: impl Into<String>,
        object: impl Into<String>,
        upload_id: impl Into<String>,
        part_number: u32,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        let part_size = data.len() as u64;
        Self::new(bucket, object, upload_id, part_number, part_size, std::io::Cursor::new(data))
    }
}

impl fmt::Debug for UploadPartRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadPartRequest")
            .field("bucket", &self.bucket)
            .field("object", &self.object)
            .field("upload_id", &self.upload_id)
            .field("part_number", &self.part_number)
            .field("part_size", &self.part_size)
            .finish_non_exhaustive()
    }
}

/// Part number and ETag of an uploaded part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    /// Part number (1-10000)
    pub part_number: u32,
    /// ETag returned from UploadPart
    pub etag: String,
}

impl UploadPart {
    pub fn new(part_number: u32, etag: impl Into<String>) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompleteMultiUploadRequest {
    pub bucket: String,
    pub object: String,
    pub upload_id: String,
    pub parts: Vec<UploadPart>,
}

impl CompleteMultiUploadRequest {
    pub fn new(
        bucket: impl Into<String>,
        object: impl Into<String>,
        upload_id: impl Into<String>,
        parts: Vec<UploadPart>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            upload_id: upload_id.into(),
            parts,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbortMultiUploadRequest {
    pub bucket: String,
    pub object: String,
    pub upload_id: String,
}

impl AbortMultiUploadRequest {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>, upload_id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            upload_id: upload_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUploadPartsRequest {
    pub bucket: String,
    pub object: String,
    pub upload_id: String,
    /// Defaults to 1000 when unset or zero
    pub max_parts: Option<u32>,
    /// List parts after this part number
    pub part_number_marker: Option<u32>,
}

impl ListUploadPartsRequest {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>, upload_id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            upload_id: upload_id.into(),
            ..Default::default()
        }
    }

    pub fn with_max_parts(mut self, max_parts: u32) -> Self {
        self.max_parts = Some(max_parts);
        self
    }

    pub fn with_part_number_marker(mut self, marker: u32) -> Self {
        self.part_number_marker = Some(marker);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMultiUploadsRequest {
    pub bucket: String,
    pub key_marker: Option<String>,
    /// Defaults to 1000 when unset or zero
    pub max_uploads: Option<u32>,
}

impl ListMultiUploadsRequest {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_key_marker(mut self, key_marker: impl Into<String>) -> Self {
        self.key_marker = Some(key_marker.into());
        self
    }

    pub fn with_max_uploads(mut self, max_uploads: u32) -> Self {
        self.max_uploads = Some(max_uploads);
        self
    }
}

/// Settings for [`crate::NosClient::upload_file_multipart`]
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Part size in bytes (default: 16MB)
    pub part_size: u64,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            part_size: 16 * 1024 * 1024,
        }
    }
}

impl MultipartConfig {
    pub fn with_part_size(mut self, size: u64) -> Self {
        self.part_size = size.max(1);
        self
    }
}

// =============================================================================
// Results
// =============================================================================

/// ETag and request id of a write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectResult {
    pub etag: String,
    pub request_id: String,
}

/// Streaming result of a GetObject call.
///
/// The connection stays checked out until `body` is read to the end or dropped.
#[derive(Debug)]
pub struct NosObject {
    pub bucket: String,
    pub object: String,
    pub metadata: ObjectMetadata,
    pub body: ObjectStream,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Owner {
    #[serde(rename = "ID")]
    pub id: String,
    pub display_name: String,
}

/// One entry of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: String,
    #[serde(rename = "ETag", alias = "Etag")]
    pub etag: String,
    pub size: u64,
    pub storage_class: String,
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CommonPrefix {
    pub prefix: String,
}

/// `ListBucketResult` body
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListObjectsResult {
    pub name: String,
    pub prefix: String,
    pub marker: String,
    pub delimiter: String,
    pub next_marker: String,
    pub max_keys: u32,
    pub is_truncated: bool,
    pub contents: Vec<ObjectSummary>,
    pub common_prefixes: Vec<CommonPrefix>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedObject {
    pub key: String,
}

/// Per-key failure inside a batch delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteError {
    pub key: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteObjectsResult {
    pub deleted: Vec<DeletedObject>,
    pub errors: Vec<DeleteError>,
}

/// `InitiateMultipartUploadResult` body
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InitMultiUploadResult {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
}

/// `CompleteMultipartUploadResult` body; `etag` is returned without quotes
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CompleteMultiUploadResult {
    pub location: String,
    pub bucket: String,
    pub key: String,
    #[serde(rename = "ETag", alias = "Etag")]
    pub etag: String,
}

/// One part of a `ListPartsResult`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PartSummary {
    pub part_number: u32,
    pub last_modified: String,
    #[serde(rename = "ETag", alias = "Etag")]
    pub etag: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListPartsResult {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub owner: Option<Owner>,
    pub storage_class: String,
    pub part_number_marker: u32,
    pub next_part_number_marker: u32,
    pub max_parts: u32,
    pub is_truncated: bool,
    #[serde(rename = "Part")]
    pub parts: Vec<PartSummary>,
}

/// One in-progress upload of a `ListMultipartUploadsResult`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MultipartUpload {
    pub key: String,
    pub upload_id: String,
    pub storage_class: String,
    pub owner: Option<Owner>,
    pub initiated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListMultiUploadsResult {
    pub bucket: String,
    pub key_marker: String,
    pub upload_id_marker: String,
    pub next_key_marker: String,
    pub next_upload_id_marker: String,
    pub max_uploads: u32,
    pub is_truncated: bool,
    #[serde(rename = "Upload")]
    pub uploads: Vec<MultipartUpload>,
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Escape XML special characters into an existing buffer (no intermediate allocation)
fn xml_escape_into(buf: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            '\'' => buf.push_str("&apos;"),
            _ => buf.push(ch),
        }
    }
}

/// Batch delete body
pub(crate) fn delete_objects_xml(objects: &[String], quiet: bool) -> String {
    let mut xml = String::with_capacity(objects.len() * 60 + 80);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Delete><Quiet>");
    xml.push_str(if quiet { "true" } else { "false" });
    xml.push_str("</Quiet>");
    for key in objects {
        xml.push_str("<Object><Key>");
        xml_escape_into(&mut xml, key);
        xml.push_str("</Key></Object>");
    }
    xml.push_str("</Delete>");
    xml
}

/// Completion body, parts in ascending part number order
pub(crate) fn complete_multipart_xml(parts: &[UploadPart]) -> String {
    let mut sorted: Vec<&UploadPart> = parts.iter().collect();
    sorted.sort_by_key(|p| p.part_number);

    let mut xml = String::with_capacity(parts.len() * 100 + 80);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?><CompleteMultipartUpload>");
    for part in sorted {
        xml.push_str("<Part><PartNumber>");
        xml.push_str(&part.part_number.to_string());
        xml.push_str("</PartNumber><ETag>\"");
        xml_escape_into(&mut xml, part.etag.trim_matches('"'));
        xml.push_str("\"</ETag></Part>");
    }
    xml.push_str("</CompleteMultipartUpload>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nos::response::parse_xml;

    #[test]
    fn test_xml_escape() {
        let mut buf = String::new();
        xml_escape_into(&mut buf, "a<b>&\"c'");
        assert_eq!(buf, "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn test_delete_objects_xml() {
        let xml = delete_objects_xml(&["a.txt".to_string(), "x&y".to_string()], true);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Delete><Quiet>true</Quiet>\
             <Object><Key>a.txt</Key></Object><Object><Key>x&amp;y</Key></Object></Delete>"
        );
    }

    #[test]
    fn test_complete_xml_sorts_parts() {
        let parts = vec![
            UploadPart::new(3, "c"),
            UploadPart::new(1, "\"a\""),
            UploadPart::new(2, "b"),
        ];
        let xml = complete_multipart_xml(&parts);
        let one = xml.find("<PartNumber>1<").unwrap();
        let two = xml.find("<PartNumber>2<").unwrap();
        let three = xml.find("<PartNumber>3<").unwrap();
        assert!(one < two && two < three);
        assert!(xml.contains("<ETag>\"a\"</ETag>"));
        assert!(xml.contains("<ETag>\"c\"</ETag>"));
    }

    #[test]
    fn test_parse_list_objects_result() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
  <Name>photos</Name>
  <Prefix>2024/</Prefix>
  <Marker></Marker>
  <MaxKeys>100</MaxKeys>
  <NextMarker>2024/b.jpg</NextMarker>
  <IsTruncated>true</IsTruncated>
  <Contents>
    <Key>2024/a.jpg</Key>
    <LastModified>2024-01-01T00:00:00.000Z</LastModified>
    <Etag>"e1"</Etag>
    <Size>10</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <CommonPrefixes><Prefix>2024/raw/</Prefix></CommonPrefixes>
  <Contents>
    <Key>2024/b.jpg</Key>
    <ETag>"e2"</ETag>
    <Size>20</Size>
  </Contents>
</ListBucketResult>"#;
        let result: ListObjectsResult = parse_xml(xml).unwrap();
        assert_eq!(result.name, "photos");
        assert_eq!(result.max_keys, 100);
        assert!(result.is_truncated);
        assert_eq!(result.next_marker, "2024/b.jpg");
        assert_eq!(result.contents.len(), 2);
        assert_eq!(result.contents[0].etag, "\"e1\"");
        assert_eq!(result.contents[1].size, 20);
        assert_eq!(result.common_prefixes[0].prefix, "2024/raw/");
    }

    #[test]
    fn test_parse_list_parts_result() {
        let xml = br#"<ListPartsResult>
  <Bucket>b</Bucket><Key>k</Key><UploadId>u1</UploadId>
  <Owner><ID>42</ID><DisplayName>ops</DisplayName></Owner>
  <PartNumberMarker>0</PartNumberMarker>
  <NextPartNumberMarker>2</NextPartNumberMarker>
  <MaxParts>1000</MaxParts>
  <IsTruncated>false</IsTruncated>
  <Part><PartNumber>1</PartNumber><ETag>"p1"</ETag><Size>5</Size></Part>
  <Part><PartNumber>2</PartNumber><ETag>"p2"</ETag><Size>3</Size></Part>
</ListPartsResult>"#;
        let result: ListPartsResult = parse_xml(xml).unwrap();
        assert_eq!(result.upload_id, "u1");
        assert_eq!(result.owner.as_ref().map(|o| o.id.as_str()), Some("42"));
        assert_eq!(result.next_part_number_marker, 2);
        assert_eq!(result.parts.len(), 2);
        assert_eq!(result.parts[1].part_number, 2);
    }

    #[test]
    fn test_parse_list_multi_uploads_result() {
        let xml = br#"<ListMultipartUploadsResult>
  <Bucket>b</Bucket>
  <NextKeyMarker>k2</NextKeyMarker>
  <MaxUploads>1000</MaxUploads>
  <IsTruncated>false</IsTruncated>
  <Upload><Key>k1</Key><UploadId>u1</UploadId><Initiated>2024-01-01</Initiated></Upload>
  <Upload><Key>k2</Key><UploadId>u2</UploadId></Upload>
</ListMultipartUploadsResult>"#;
        let result: ListMultiUploadsResult = parse_xml(xml).unwrap();
        assert_eq!(result.uploads.len(), 2);
        assert_eq!(result.uploads[1].upload_id, "u2");
        assert_eq!(result.next_key_marker, "k2");
    }

    #[test]
    fn test_get_object_request_headers() {
        let req = GetObjectRequest::new("b", "k").with_range(0, 9);
        assert_eq!(req.range.as_deref(), Some("bytes=0-9"));
    }
}
