//! Shared test doubles for command tests.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use parking_lot::Mutex;

use nimbus_rest::{
    Connection, Connector, Credentials, Destination, RestClient, RestConfig, RestResponse,
};

use crate::context::Application;

/// One request captured by the stub transport.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub body: Bytes,
}

/// Transport stub that records requests and answers with a fixed
/// status and body.
#[derive(Clone)]
pub(crate) struct StubConnector {
    status: StatusCode,
    body: Bytes,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubConnector {
    pub(crate) fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Bytes::from_static(b"{}"),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_body(status: StatusCode, body: &'static [u8]) -> Self {
        Self {
            body: Bytes::from_static(body),
            ..Self::new(status)
        }
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn connect(&self, _destination: &Destination) -> io::Result<Box<dyn Connection>> {
        Ok(Box::new(StubConnection { stub: self.clone() }))
    }
}

struct StubConnection {
    stub: StubConnector,
}

#[async_trait]
impl Connection for StubConnection {
    async fn send(&mut self, request: Request<Full<Bytes>>) -> io::Result<RestResponse> {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(_) => Bytes::new(),
        };
        self.stub.requests.lock().push(RecordedRequest {
            method: parts.method,
            uri: parts.uri.to_string(),
            body,
        });

        Ok(RestResponse {
            status: self.stub.status,
            headers: HeaderMap::new(),
            body: self.stub.body.clone(),
        })
    }

    fn is_open(&self) -> bool {
        true
    }
}

/// Usage collaborator that records which commands asked for help.
pub(crate) struct MockApplication {
    usage_calls: Mutex<Vec<String>>,
}

impl MockApplication {
    pub(crate) fn new() -> Self {
        Self {
            usage_calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn usage_calls(&self) -> Vec<String> {
        self.usage_calls.lock().clone()
    }
}

impl Application for MockApplication {
    fn print_usage(&self, command_name: &str) {
        self.usage_calls.lock().push(command_name.to_string());
    }
}

pub(crate) fn test_client(connector: &StubConnector) -> RestClient {
    let config = RestConfig::new(
        "https://localhost:9443",
        Credentials::new("admin", "admin"),
    );
    RestClient::with_connector(config, Arc::new(connector.clone())).expect("client")
}

pub(crate) fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(ToString::to_string).collect()
}
