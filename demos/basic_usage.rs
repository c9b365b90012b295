//! Basic usage example for nos-client
//!
//! Reads the configuration from `NOS_*` environment variables (or a `.env`
//! file) and walks through the common object operations.
//!
//! Run with:
//! ```
//! NOS_ENDPOINT=nos-eastchina1.126.net NOS_ACCESS_KEY=... NOS_SECRET_KEY=... \
//!     cargo run --example basic_usage -- my-bucket
//! ```

use nos_client::config::load_config;
use nos_client::logging::init_tracing;
use nos_client::{
    DeleteMultiObjectsRequest, GetObjectRequest, ListObjectsRequest, MultipartConfig, NosClient,
    ObjectMetadata, ObjectRequest, PutObjectRequest,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config(None)?;
    init_tracing(&config.log_level);

    let bucket = std::env::args().nth(1).unwrap_or_else(|| "my-bucket".to_string());
    let client = NosClient::new(&config)?;

    println!("nos-client - Basic Usage Example");
    println!("================================\n");

    // Example 1: Put object
    println!("1. Uploading object...");
    let metadata = ObjectMetadata::new()
        .with_content_type("text/plain")
        .with_user_meta("example", "basic_usage");
    let result = client
        .put_object_by_stream(
            PutObjectRequest::from_bytes(&bucket, "test/example.txt", "Hello, NOS!")
                .with_metadata(metadata),
        )
        .await?;
    println!("   Uploaded with ETag: {} (request id {})\n", result.etag, result.request_id);

    // Example 2: Ranged get
    println!("2. Downloading the first 5 bytes...");
    let request = GetObjectRequest::new(&bucket, "test/example.txt").with_range(0, 4);
    if let Some(object) = client.get_object(&request).await? {
        let data = object.body.bytes().await?;
        println!("   Content: {}\n", String::from_utf8_lossy(&data));
    }

    // Example 3: List objects
    println!("3. Listing objects with prefix 'test/'...");
    let list = client
        .list_objects(&ListObjectsRequest::new(&bucket).with_prefix("test/").with_max_keys(10))
        .await?;
    println!("   Found {} objects:", list.contents.len());
    for obj in &list.contents {
        println!("   - {} ({} bytes)", obj.key, obj.size);
    }
    println!();

    // Example 4: Multipart upload from a local file
    println!("4. Uploading a file in parts...");
    let dir = std::env::temp_dir().join("nos-basic-usage");
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join("large.bin");
    tokio::fs::write(&path, vec![b'x'; 12 * 1024 * 1024]).await?;
    let complete = client
        .upload_file_multipart(
            &bucket,
            "test/large.bin",
            &path,
            &MultipartConfig::default().with_part_size(5 * 1024 * 1024),
        )
        .await?;
    println!("   Completed with ETag: {}\n", complete.etag);

    // Example 5: Existence check and batch delete
    println!("5. Cleaning up...");
    let exists = client
        .does_object_exist(&ObjectRequest::new(&bucket, "test/example.txt"))
        .await?;
    println!("   test/example.txt exists: {}", exists);
    let deleted = client
        .delete_multi_objects(&DeleteMultiObjectsRequest::new(
            &bucket,
            ["test/example.txt", "test/large.bin"],
        ))
        .await?;
    println!("   Deleted {} objects, {} errors", deleted.deleted.len(), deleted.errors.len());
    tokio::fs::remove_dir_all(&dir).await?;

    Ok(())
}
