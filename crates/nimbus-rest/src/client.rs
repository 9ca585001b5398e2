//! The REST client: pooled, authenticated GET/POST/DELETE.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::uri::PathAndQuery;
use http::{header, Method, Request, Uri};
use http_body_util::Full;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::config::{Credentials, RestConfig};
use crate::error::RestError;
use crate::pool::ConnectionPool;
use crate::transport::{Connector, Destination, HyperConnector, RestResponse};

/// HTTP verb of a client operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP DELETE.
    Delete,
}

impl Verb {
    /// Returns the verb name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for the control plane REST API.
///
/// Every request checks a connection out of the pool, attaches the
/// Basic-Authentication header, and returns the raw response without
/// interpreting the status code. The connection is released on every
/// exit path. Construct once at process start and share by reference.
pub struct RestClient {
    pool: ConnectionPool,
    credentials: Credentials,
    base_url: String,
    request_timeout: Duration,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Creates a client with the production TCP/TLS transport.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::TlsConfiguration`] if the trust policy
    /// cannot be built, or [`RestError::InvalidEndpoint`] for an empty
    /// server URL.
    pub fn new(config: RestConfig) -> Result<Self, RestError> {
        let tls = config.trust_policy.build_client_config()?;
        let connector = Arc::new(HyperConnector::new(tls, config.connect_timeout));
        Self::with_connector(config, connector)
    }

    /// Creates a client over a caller-supplied transport.
    ///
    /// Used by embedders and tests that substitute the connector.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidEndpoint`] for an empty server URL.
    pub fn with_connector(
        config: RestConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, RestError> {
        if config.server_url.is_empty() {
            return Err(RestError::InvalidEndpoint {
                endpoint: String::new(),
                reason: "server URL must not be empty".into(),
            });
        }

        Ok(Self {
            pool: ConnectionPool::new(config.pool, connector),
            credentials: config.credentials,
            base_url: config.server_url,
            request_timeout: config.request_timeout,
        })
    }

    /// Returns the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Transport`] on transport failure; the
    /// response is returned uninterpreted otherwise.
    pub async fn get(&self, path: &str) -> Result<RestResponse, RestError> {
        self.execute(Verb::Get, path, None).await
    }

    /// Issues a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPayload`] before any network I/O if
    /// the payload serializes to nothing, or [`RestError::Transport`]
    /// on transport failure.
    pub async fn post<T>(&self, path: &str, payload: &T) -> Result<RestResponse, RestError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_string(payload).map_err(|e| RestError::InvalidPayload {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        if body.is_empty() || body == "null" {
            return Err(RestError::InvalidPayload {
                path: path.to_string(),
                reason: "serialized payload is empty".into(),
            });
        }
        self.execute(Verb::Post, path, Some(body)).await
    }

    /// Issues a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Transport`] on transport failure; the
    /// response is returned uninterpreted otherwise.
    pub async fn delete(&self, path: &str) -> Result<RestResponse, RestError> {
        self.execute(Verb::Delete, path, None).await
    }

    async fn execute(
        &self,
        verb: Verb,
        path: &str,
        body: Option<String>,
    ) -> Result<RestResponse, RestError> {
        let uri = self.resolve(path)?;
        let destination = Destination::from_uri(&uri)?;
        let request = self.build_request(verb, &uri, &destination, body)?;

        debug!(%verb, path, %destination, "executing request");

        let mut pooled = self
            .pool
            .acquire(&destination)
            .await
            .map_err(|e| match e {
                // Connect failures become the verb-scoped transport error;
                // pool exhaustion keeps its own variant.
                RestError::Connection { source, .. } => RestError::Transport {
                    verb,
                    path: path.to_string(),
                    source,
                },
                other => other,
            })?;

        let outcome = match timeout(self.request_timeout, pooled.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no response within {:?}", self.request_timeout),
            )),
        };

        match outcome {
            // Dropping the guard returns the connection to the pool.
            Ok(response) => Ok(response),
            Err(source) => {
                pooled.retire();
                error!(%verb, path, error = %source, "request failed");
                Err(RestError::Transport {
                    verb,
                    path: path.to_string(),
                    source,
                })
            }
        }
    }

    fn resolve(&self, path: &str) -> Result<Uri, RestError> {
        if path.is_empty() {
            return Err(RestError::InvalidEndpoint {
                endpoint: String::new(),
                reason: "endpoint must not be empty".into(),
            });
        }

        let absolute = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };

        absolute
            .parse::<Uri>()
            .map_err(|e| RestError::InvalidEndpoint {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })
    }

    fn build_request(
        &self,
        verb: Verb,
        uri: &Uri,
        destination: &Destination,
        body: Option<String>,
    ) -> Result<Request<Full<Bytes>>, RestError> {
        let path_and_query = uri.path_and_query().map_or("/", PathAndQuery::as_str);

        let mut builder = Request::builder()
            .method(verb.method())
            .uri(path_and_query)
            .header(header::HOST, destination.authority())
            .header(header::AUTHORIZATION, self.credentials.basic_header());

        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }

        builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| RestError::Request {
                reason: e.to_string(),
            })
    }
}
