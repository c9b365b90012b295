//! Integration tests for multipart uploads and bucket operations

mod common;

use common::{client, StubResponse};
use http::Method;
use nos_client::{
    AbortMultiUploadRequest, BucketAcl, ClientErrorCode, CompleteMultiUploadRequest,
    CreateBucketRequest, InitMultiUploadRequest, ListMultiUploadsRequest, ListUploadPartsRequest,
    MultipartConfig, ObjectMetadata, UploadPart, UploadPartRequest,
};
use std::fs;
use tempfile::TempDir;

fn init_response(upload_id: &str) -> StubResponse {
    StubResponse::ok().body(format!(
        "<InitiateMultipartUploadResult><Bucket>b</Bucket><Key>big.bin</Key>\
         <UploadId>{}</UploadId></InitiateMultipartUploadResult>",
        upload_id
    ))
}

fn complete_response(etag: &str) -> StubResponse {
    StubResponse::ok().body(format!(
        "<CompleteMultipartUploadResult><Location>/b/big.bin</Location><Bucket>b</Bucket>\
         <Key>big.bin</Key><ETag>{}</ETag></CompleteMultipartUploadResult>",
        etag
    ))
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

#[tokio::test]
async fn test_init_multi_upload() {
    let (client, stub) = client();
    stub.push(init_response("upload-1"));

    let request = InitMultiUploadRequest::new("b", "big.bin")
        .with_metadata(ObjectMetadata::new().with_content_type("application/octet-stream"));
    let result = client.init_multi_upload(&request).await.unwrap();

    assert_eq!(result.upload_id, "upload-1");
    assert_eq!(result.key, "big.bin");

    let sent = stub.last_request();
    assert_eq!(sent.method, Method::POST);
    assert_eq!(sent.query(), "uploads");
    assert_eq!(sent.header("x-nos-entity-type"), Some("xml"));
    assert_eq!(sent.header("content-type"), Some("application/octet-stream"));
}

#[tokio::test]
async fn test_upload_part_caps_reader() {
    let (client, stub) = client();
    stub.push(
        StubResponse::ok()
            .header("ETag", "\"part-etag\"")
            .header("x-nos-request-id", "req-part"),
    );

    let reader = std::io::Cursor::new(b"abcdefghijklmnopqrst".to_vec());
    let result = client
        .upload_part(UploadPartRequest::new("b", "big.bin", "upload-1", 3, 8, reader))
        .await
        .unwrap();

    assert_eq!(result.etag, "\"part-etag\"");
    assert_eq!(result.request_id, "req-part");

    let sent = stub.last_request();
    assert_eq!(sent.method, Method::PUT);
    assert_eq!(sent.body_str(), "abcdefgh");
    assert_eq!(sent.header("content-length"), Some("8"));
    assert_eq!(
        query_pairs(sent.query()),
        vec![
            ("partNumber".to_string(), "3".to_string()),
            ("uploadId".to_string(), "upload-1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_upload_part_validation() {
    let (client, stub) = client();

    let err = client
        .upload_part(UploadPartRequest::from_bytes("b", "k", "  ", 1, "data"))
        .await
        .unwrap_err();
    assert_eq!(err.client_code(), Some(ClientErrorCode::UploadIdInvalid));

    let err = client
        .upload_part(UploadPartRequest::from_bytes("b", "k", "u", 0, "data"))
        .await
        .unwrap_err();
    assert_eq!(err.client_code(), Some(ClientErrorCode::PartNumberInvalid));

    let err = client
        .upload_part(UploadPartRequest::from_bytes("b", "k", "u", 10_001, "data"))
        .await
        .unwrap_err();
    assert_eq!(err.client_code(), Some(ClientErrorCode::PartNumberInvalid));

    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_complete_multi_upload() {
    let (client, stub) = client();
    stub.push(complete_response("\"abc123\""));

    let parts = vec![
        UploadPart::new(3, "\"e3\""),
        UploadPart::new(1, "\"e1\""),
        UploadPart::new(2, "e2"),
    ];
    let result = client
        .complete_multi_upload(&CompleteMultiUploadRequest::new("b", "big.bin", "upload-1", parts))
        .await
        .unwrap();

    assert_eq!(result.etag, "abc123");
    assert_eq!(result.location, "/b/big.bin");

    let sent = stub.last_request();
    assert_eq!(sent.method, Method::POST);
    assert_eq!(sent.query(), "uploadId=upload-1");

    let body = sent.body_str();
    let p1 = body.find("<PartNumber>1</PartNumber>").unwrap();
    let p2 = body.find("<PartNumber>2</PartNumber>").unwrap();
    let p3 = body.find("<PartNumber>3</PartNumber>").unwrap();
    assert!(p1 < p2 && p2 < p3);
    assert!(body.contains("<ETag>\"e2\"</ETag>"));
    assert_eq!(sent.header("content-length"), Some(body.len().to_string().as_str()));
}

#[tokio::test]
async fn test_complete_rejects_bad_part_number() {
    let (client, stub) = client();

    let err = client
        .complete_multi_upload(&CompleteMultiUploadRequest::new(
            "b",
            "k",
            "u",
            vec![UploadPart::new(0, "e")],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.client_code(), Some(ClientErrorCode::PartNumberInvalid));
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_abort_multi_upload() {
    let (client, stub) = client();

    client
        .abort_multi_upload(&AbortMultiUploadRequest::new("b", "big.bin", "upload-1"))
        .await
        .unwrap();

    let sent = stub.last_request();
    assert_eq!(sent.method, Method::DELETE);
    assert_eq!(sent.query(), "uploadId=upload-1");

    let err = client
        .abort_multi_upload(&AbortMultiUploadRequest::new("b", "big.bin", ""))
        .await
        .unwrap_err();
    assert_eq!(err.client_code(), Some(ClientErrorCode::UploadIdInvalid));
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_list_upload_parts() {
    let (client, stub) = client();
    stub.push(StubResponse::ok().body(
        "<ListPartsResult><Bucket>b</Bucket><Key>big.bin</Key><UploadId>upload-1</UploadId>\
         <MaxParts>1000</MaxParts><IsTruncated>false</IsTruncated>\
         <Part><PartNumber>1</PartNumber><ETag>\"e1\"</ETag><Size>10</Size></Part>\
         <Part><PartNumber>2</PartNumber><ETag>\"e2\"</ETag><Size>5</Size></Part>\
         </ListPartsResult>",
    ));

    let result = client
        .list_upload_parts(&ListUploadPartsRequest::new("b", "big.bin", "upload-1"))
        .await
        .unwrap();

    assert_eq!(result.parts.len(), 2);
    assert_eq!(result.parts[1].part_number, 2);
    assert_eq!(result.parts[1].size, 5);
    assert_eq!(stub.last_request().query(), "max-parts=1000&uploadId=upload-1");

    stub.push(StubResponse::ok().body("<ListPartsResult></ListPartsResult>"));
    client
        .list_upload_parts(
            &ListUploadPartsRequest::new("b", "big.bin", "upload-1")
                .with_max_parts(2)
                .with_part_number_marker(4),
        )
        .await
        .unwrap();
    assert_eq!(
        stub.last_request().query(),
        "max-parts=2&part-number-marker=4&uploadId=upload-1"
    );
}

#[tokio::test]
async fn test_list_multi_uploads() {
    let (client, stub) = client();
    stub.push(StubResponse::ok().body(
        "<ListMultipartUploadsResult><Bucket>b</Bucket><MaxUploads>1000</MaxUploads>\
         <IsTruncated>false</IsTruncated>\
         <Upload><Key>a.bin</Key><UploadId>u1</UploadId></Upload>\
         <Upload><Key>b.bin</Key><UploadId>u2</UploadId></Upload>\
         </ListMultipartUploadsResult>",
    ));

    let result = client
        .list_multi_uploads(&ListMultiUploadsRequest::new("b"))
        .await
        .unwrap();

    let ids: Vec<_> = result.uploads.iter().map(|u| u.upload_id.as_str()).collect();
    assert_eq!(ids, ["u1", "u2"]);
    assert_eq!(stub.last_request().query(), "max-uploads=1000&uploads");

    stub.push(StubResponse::ok().body("<ListMultipartUploadsResult></ListMultipartUploadsResult>"));
    client
        .list_multi_uploads(
            &ListMultiUploadsRequest::new("b")
                .with_key_marker("a.bin")
                .with_max_uploads(10),
        )
        .await
        .unwrap();
    assert_eq!(
        stub.last_request().query(),
        "key-marker=a.bin&max-uploads=10&uploads"
    );
}

#[tokio::test]
async fn test_upload_file_multipart() {
    let (client, stub) = client();
    stub.push(init_response("upload-9"));
    for i in 1..=3 {
        stub.push(StubResponse::ok().header("ETag", format!("\"etag-{}\"", i)));
    }
    stub.push(complete_response("\"final\""));

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("big.bin");
    fs::write(&path, b"aaaaaaaaaabbbbbbbbbbccccc").unwrap();

    let result = client
        .upload_file_multipart("b", "big.bin", &path, &MultipartConfig::default().with_part_size(10))
        .await
        .unwrap();
    assert_eq!(result.etag, "final");

    let requests = stub.requests();
    assert_eq!(requests.len(), 5);

    let parts = &requests[1..4];
    let bodies: Vec<&str> = parts.iter().map(|r| r.body_str()).collect();
    assert_eq!(bodies, ["aaaaaaaaaa", "bbbbbbbbbb", "ccccc"]);
    for (i, part) in parts.iter().enumerate() {
        assert_eq!(part.method, Method::PUT);
        assert!(part.query().contains(&format!("partNumber={}", i + 1)));
        assert!(part.query().contains("uploadId=upload-9"));
    }
    assert_eq!(parts[2].header("content-length"), Some("5"));

    let complete = requests[4].body_str();
    for i in 1..=3 {
        assert!(complete.contains(&format!("<ETag>\"etag-{}\"</ETag>", i)));
    }
}

#[tokio::test]
async fn test_upload_file_multipart_aborts_on_failure() {
    let (client, stub) = client();
    stub.push(init_response("upload-7"));
    stub.push(StubResponse::ok().header("ETag", "\"etag-1\""));
    stub.push(StubResponse::new(500).body(r#"{"Code":"InternalError","Message":"boom"}"#));

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("big.bin");
    fs::write(&path, vec![7u8; 25]).unwrap();

    let err = client
        .upload_file_multipart("b", "big.bin", &path, &MultipartConfig::default().with_part_size(10))
        .await
        .unwrap_err();
    assert_eq!(err.as_server_error().unwrap().code, "InternalError");

    let requests = stub.requests();
    assert_eq!(requests.len(), 4);
    let abort = &requests[3];
    assert_eq!(abort.method, Method::DELETE);
    assert_eq!(abort.query(), "uploadId=upload-7");
}

#[tokio::test]
async fn test_upload_file_multipart_empty_file() {
    let (client, stub) = client();
    stub.push(init_response("upload-0"));
    stub.push(StubResponse::ok().header("ETag", "\"empty\""));
    stub.push(complete_response("\"final\""));

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.bin");
    fs::write(&path, b"").unwrap();

    client
        .upload_file_multipart("b", "empty.bin", &path, &MultipartConfig::default())
        .await
        .unwrap();

    let requests = stub.requests();
    assert_eq!(requests.len(), 3);
    let part = &requests[1];
    assert_eq!(part.method, Method::PUT);
    assert_eq!(part.header("content-length"), Some("0"));
    assert!(part.body.is_empty());
}

#[tokio::test]
async fn test_empty_names_never_reach_transport() {
    let (client, stub) = client();
    let parts = vec![UploadPart::new(1, "e1")];

    for (bucket, object) in [("", "k"), ("b", "")] {
        assert!(client
            .init_multi_upload(&InitMultiUploadRequest::new(bucket, object))
            .await
            .is_err());
        assert!(client
            .upload_part(UploadPartRequest::from_bytes(bucket, object, "u", 1, "data"))
            .await
            .is_err());
        assert!(client
            .complete_multi_upload(&CompleteMultiUploadRequest::new(
                bucket,
                object,
                "u",
                parts.clone()
            ))
            .await
            .is_err());
        assert!(client
            .abort_multi_upload(&AbortMultiUploadRequest::new(bucket, object, "u"))
            .await
            .is_err());
        assert!(client
            .list_upload_parts(&ListUploadPartsRequest::new(bucket, object, "u"))
            .await
            .is_err());
    }

    let err = client
        .list_multi_uploads(&ListMultiUploadsRequest::new(""))
        .await
        .unwrap_err();
    assert_eq!(err.client_code(), Some(ClientErrorCode::BucketInvalid));

    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_upload_file_multipart_too_many_parts() {
    let (client, stub) = client();

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("big.bin");
    fs::write(&path, vec![0u8; 10_001]).unwrap();

    let err = client
        .upload_file_multipart("b", "big.bin", &path, &MultipartConfig::default().with_part_size(1))
        .await
        .unwrap_err();
    assert_eq!(err.client_code(), Some(ClientErrorCode::PartNumberInvalid));
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_bucket_operations() {
    let (client, stub) = client();

    client
        .create_bucket(&CreateBucketRequest::new("new-bucket").with_acl(BucketAcl::PublicRead))
        .await
        .unwrap();
    let sent = stub.last_request();
    assert_eq!(sent.method, Method::PUT);
    assert_eq!(sent.uri.path(), "/");
    assert_eq!(sent.header("x-nos-acl"), Some("public-read"));

    stub.push(StubResponse::new(404));
    assert!(!client.does_bucket_exist("new-bucket").await.unwrap());
    stub.push(StubResponse::ok());
    assert!(client.does_bucket_exist("new-bucket").await.unwrap());

    client.delete_bucket("new-bucket").await.unwrap();
    assert_eq!(stub.last_request().method, Method::DELETE);

    let err = client.delete_bucket("").await.unwrap_err();
    assert_eq!(err.client_code(), Some(ClientErrorCode::BucketInvalid));
    assert_eq!(stub.calls(), 4);
}
