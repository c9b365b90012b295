//! Header names, query parameters and limits used on the NOS wire

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_MD5: &str = "Content-MD5";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const DATE: &str = "Date";
pub const ETAG: &str = "ETag";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";
pub const RANGE: &str = "Range";

pub const X_NOS_ACL: &str = "x-nos-acl";
pub const X_NOS_COPY_SOURCE: &str = "x-nos-copy-source";
pub const X_NOS_MOVE_SOURCE: &str = "x-nos-move-source";
pub const X_NOS_ENTITY_TYPE: &str = "x-nos-entity-type";
pub const X_NOS_REQUEST_ID: &str = "x-nos-request-id";

/// Prefix shared by every vendor header; these take part in signing.
pub const X_NOS_PREFIX: &str = "x-nos-";
/// Prefix for user-defined object metadata.
pub const X_NOS_META_PREFIX: &str = "x-nos-meta-";

pub const LIST_PREFIX: &str = "prefix";
pub const LIST_DELIMITER: &str = "delimiter";
pub const LIST_MARKER: &str = "marker";
pub const LIST_MAX_KEYS: &str = "max-keys";
pub const LIST_KEY_MARKER: &str = "key-marker";
pub const LIST_MAX_UPLOADS: &str = "max-uploads";
pub const UPLOADS: &str = "uploads";
pub const UPLOAD_ID: &str = "uploadId";
pub const PART_NUMBER: &str = "partNumber";
pub const MAX_PARTS: &str = "max-parts";
pub const PART_NUMBER_MARKER: &str = "part-number-marker";
pub const DELETE: &str = "delete";

/// Maximum number of keys in one batch delete.
pub const MAX_DELETE_OBJECTS: usize = 1000;
/// Maximum serialized size of a batch delete body.
pub const MAX_DELETE_BODY: usize = 2 * 1024 * 1024;
/// Largest content length accepted by a single PUT.
pub const MAX_SINGLE_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

pub const DEFAULT_MAX_KEYS: u32 = 100;
pub const DEFAULT_MAX_UPLOADS: u32 = 1000;
pub const DEFAULT_MAX_PARTS: u32 = 1000;
pub const MIN_PART_NUMBER: u32 = 1;
pub const MAX_PART_NUMBER: u32 = 10_000;

/// `Date` header layout (RFC 1123, always GMT).
pub const RFC1123_NOS: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Query parameters that belong to the signed resource.
pub const SUB_RESOURCES: &[&str] = &[
    "acl",
    "delete",
    "location",
    "partNumber",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
];
