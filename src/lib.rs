//! nos-client - async client for NOS object storage
//!
//! ```no_run
//! use nos_client::{Config, NosClient, PutObjectRequest};
//!
//! # async fn run() -> nos_client::Result<()> {
//! let config = Config::new("nos-eastchina1.126.net").with_credentials("ak", "sk");
//! let client = NosClient::new(&config)?;
//! let result = client
//!     .put_object_by_stream(PutObjectRequest::from_bytes("bucket", "hello.txt", "hello"))
//!     .await?;
//! println!("etag: {}", result.etag);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod nos;

pub use config::{Config, Protocol};
pub use nos::*;
