//! HTTP transport
//!
//! [`Transport`] is the seam between the operation facade and the network.
//! [`HyperTransport`] is the default implementation:
//! - HTTP/1.1 over a pooled hyper-util client
//! - TCP_NODELAY and keepalive on every connection
//! - native-tls for `https` endpoints
//! - connect timeout on the connector, request timeout until response headers,
//!   read/write timeout per response body frame
//!
//! Nothing here retries. Errors reach the caller as they happened.

use crate::config::Config;
use crate::nos::body::{RequestBody, ResponseBody};
use crate::nos::error::{BoxError, ClientError, ClientErrorCode, TransportError};
use bytes::Bytes;
use http::{Request, Response};
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use native_tls::TlsConnector;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Sleep;

/// Sends one request and returns the response with its body still unread
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: Request<RequestBody>,
    ) -> impl Future<Output = Result<Response<ResponseBody>, TransportError>> + Send;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(
        &self,
        request: Request<RequestBody>,
    ) -> impl Future<Output = Result<Response<ResponseBody>, TransportError>> + Send {
        (**self).send(request)
    }
}

/// Pooled hyper client
///
/// Clone is cheap - the underlying HTTP client uses Arc internally.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient<HttpsConnector<HttpConnector>, RequestBody>,
    request_timeout: Duration,
    read_write_timeout: Duration,
}

impl HyperTransport {
    /// Builds the connection pool described by `config`
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(config.connect_timeout()));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let tls = TlsConnector::new().map_err(|e| {
            ClientError::new(ClientErrorCode::ConfigTls).with_message(e.to_string())
        })?;
        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_idle_connections)
            .set_host(true)
            .build(https);

        Ok(Self {
            client,
            request_timeout: config.request_timeout(),
            read_write_timeout: config.read_write_timeout(),
        })
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("request_timeout", &self.request_timeout)
            .field("read_write_timeout", &self.read_write_timeout)
            .finish_non_exhaustive()
    }
}

impl Transport for HyperTransport {
    async fn send(
        &self,
        request: Request<RequestBody>,
    ) -> Result<Response<ResponseBody>, TransportError> {
        tracing::trace!(method = %request.method(), uri = %request.uri(), "sending request");

        let response: Response<Incoming> =
            tokio::time::timeout(self.request_timeout, self.client.request(request))
                .await
                .map_err(|_| TransportError::Timeout(self.request_timeout))??;

        let read_write_timeout = self.read_write_timeout;
        Ok(response.map(|body| ReadTimeoutBody::new(body, read_write_timeout).boxed_unsync()))
    }
}

pin_project! {
    /// Fails the body when no frame arrives within `timeout`
    pub struct ReadTimeoutBody<B> {
        #[pin]
        inner: B,
        timeout: Duration,
        sleep: Option<Pin<Box<Sleep>>>,
    }
}

impl<B> ReadTimeoutBody<B> {
    pub fn new(inner: B, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            sleep: None,
        }
    }
}

impl<B> Body for ReadTimeoutBody<B>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();

        if let Poll::Ready(frame) = this.inner.poll_frame(cx) {
            *this.sleep = None;
            return Poll::Ready(frame.map(|f| f.map_err(Into::into)));
        }

        let timeout = *this.timeout;
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(tokio::time::sleep(timeout)));
        let fired = sleep.as_mut().poll(cx).is_ready();

        if fired {
            *this.sleep = None;
            return Poll::Ready(Some(Err(Box::new(TransportError::ReadTimeout(timeout)))));
        }
        Poll::Pending
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
