//! Request body constructors and the streaming download handle

use crate::nos::error::{BoxError, Result, TransportError};
use bytes::Bytes;
use futures::TryStreamExt;
use http_body::Frame;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use std::fmt;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio_util::io::ReaderStream;

/// Body handed to the transport
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// Body returned by the transport
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Empty request body (GET, HEAD, DELETE, copy/move)
pub fn empty() -> RequestBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// In-memory request body
pub fn full(data: impl Into<Bytes>) -> RequestBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Streams an async reader as the request body without buffering it
pub fn from_reader<R>(reader: R) -> RequestBody
where
    R: AsyncRead + Send + 'static,
{
    let stream = ReaderStream::new(reader)
        .map_ok(Frame::data)
        .map_err(|e| Box::new(e) as BoxError);
    StreamBody::new(stream).boxed_unsync()
}

/// Streams at most `limit` bytes of `reader`.
///
/// Used for multipart parts so a part never sends more than it advertises.
pub fn capped<R>(reader: R, limit: u64) -> RequestBody
where
    R: AsyncRead + Send + 'static,
{
    from_reader(reader.take(limit))
}

/// Open response body of a GetObject call.
///
/// The underlying connection goes back to the pool once the stream has been
/// read to the end, or is released when the stream is dropped or closed.
pub struct ObjectStream {
    body: ResponseBody,
}

impl ObjectStream {
    pub(crate) fn new(body: ResponseBody) -> Self {
        Self { body }
    }

    /// Next data chunk, or `None` at end of body
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        while let Some(frame) = self.body.frame().await {
            let frame = frame.map_err(TransportError::from_body)?;
            if let Ok(data) = frame.into_data() {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }

    /// Reads the remaining body into memory
    pub async fn bytes(self) -> Result<Bytes> {
        let collected = self.body.collect().await.map_err(TransportError::from_body)?;
        Ok(collected.to_bytes())
    }

    /// Streams the remaining body into a local file, returning bytes written.
    ///
    /// BufWriter batches small network chunks into large disk writes.
    pub async fn save_to_file(mut self, path: impl AsRef<Path>) -> Result<u64> {
        let file = tokio::fs::File::create(path.as_ref()).await?;
        let mut writer = BufWriter::with_capacity(256 * 1024, file);
        let mut total_bytes = 0u64;

        while let Some(chunk) = self.chunk().await? {
            writer.write_all(&chunk).await?;
            total_bytes += chunk.len() as u64;
        }

        writer.flush().await?;
        Ok(total_bytes)
    }

    /// Releases the body without reading it
    pub fn close(self) {}
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream").finish_non_exhaustive()
    }
}
