//! Recording stub transport shared by the integration tests

#![allow(dead_code)]

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use http_body_util::BodyExt;
use nos_client::body;
use nos_client::{Config, NosClient, RequestBody, ResponseBody, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Canned response returned by [`StubTransport`]
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl StubResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Request as seen by the transport, body fully read
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self) -> &str {
        self.uri.query().unwrap_or_default()
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }
}

#[derive(Default)]
struct Inner {
    responses: VecDeque<Result<StubResponse, String>>,
    requests: Vec<RecordedRequest>,
}

/// Answers requests from a queue; an empty queue answers 200 with no body
#[derive(Clone, Default)]
pub struct StubTransport {
    inner: Arc<Mutex<Inner>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: StubResponse) -> &Self {
        self.inner.lock().unwrap().responses.push_back(Ok(response));
        self
    }

    pub fn push_transport_error(&self, message: &str) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .responses
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request was sent")
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }
}

impl Transport for StubTransport {
    async fn send(
        &self,
        request: Request<RequestBody>,
    ) -> Result<Response<ResponseBody>, TransportError> {
        let (parts, request_body) = request.into_parts();
        let data = request_body
            .collect()
            .await
            .map_err(TransportError::Body)?
            .to_bytes();

        let next = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(RecordedRequest {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body: data,
            });
            inner.responses.pop_front()
        };

        let stub = match next {
            Some(Ok(stub)) => stub,
            Some(Err(message)) => return Err(TransportError::Request(message.into())),
            None => StubResponse::ok(),
        };

        let mut builder = Response::builder().status(stub.status);
        for (name, value) in &stub.headers {
            builder = builder.header(*name, value.as_str());
        }
        Ok(builder.body(body::full(stub.body)).unwrap())
    }
}

pub const ENDPOINT: &str = "nos-eastchina1.126.net";

/// Signed client over a fresh stub
pub fn client() -> (NosClient<StubTransport>, StubTransport) {
    let config = Config::new(ENDPOINT).with_credentials("test-ak", "test-sk");
    client_with(&config)
}

pub fn client_with(config: &Config) -> (NosClient<StubTransport>, StubTransport) {
    let stub = StubTransport::new();
    let client = NosClient::with_transport(config, stub.clone()).unwrap();
    (client, stub)
}
