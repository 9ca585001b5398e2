//! Transport seam: destinations, raw responses, and the connector trait.
//!
//! The pool and client operate against the [`Connector`]/[`Connection`]
//! traits so that tests can substitute a recording transport. The
//! production implementation is [`HyperConnector`], which owns the TCP
//! connect, the optional rustls handshake, and the HTTP/1 connection
//! driver.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::RestError;

/// URL scheme of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Returns the default port for this scheme.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }

    /// Returns the scheme as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// A connection destination: scheme, host and port.
///
/// Pool accounting is keyed by this type; two requests to the same
/// destination can share a pooled connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    /// URL scheme.
    pub scheme: Scheme,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Destination {
    /// Extracts the destination from a URI.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidEndpoint`] if the URI has no host or
    /// an unsupported scheme.
    pub fn from_uri(uri: &Uri) -> Result<Self, RestError> {
        let scheme = match uri.scheme_str() {
            Some("http") => Scheme::Http,
            Some("https") => Scheme::Https,
            other => {
                return Err(RestError::InvalidEndpoint {
                    endpoint: uri.to_string(),
                    reason: format!("unsupported scheme {other:?}"),
                });
            }
        };

        let host = uri
            .host()
            .ok_or_else(|| RestError::InvalidEndpoint {
                endpoint: uri.to_string(),
                reason: "missing host".into(),
            })?
            .to_string();

        let port = uri.port_u16().unwrap_or_else(|| scheme.default_port());

        Ok(Self { scheme, host, port })
    }

    /// Returns the `host:port` authority string.
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}

/// A raw HTTP response: status, headers and body, uninterpreted.
///
/// Inspecting the status code for domain-level success is the caller's
/// responsibility.
#[derive(Debug, Clone)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body bytes.
    pub body: Bytes,
}

impl RestResponse {
    /// Returns true if the status code is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A single reusable transport connection.
#[async_trait]
pub trait Connection: Send {
    /// Sends one request and reads the full response.
    async fn send(&mut self, request: Request<Full<Bytes>>) -> io::Result<RestResponse>;

    /// Returns true if the connection can serve another request.
    fn is_open(&self) -> bool;
}

/// Establishes new connections to destinations.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection to the given destination.
    async fn connect(&self, destination: &Destination) -> io::Result<Box<dyn Connection>>;
}

/// Production connector: TCP, optional rustls, HTTP/1 handshake.
pub struct HyperConnector {
    tls: tokio_rustls::TlsConnector,
    connect_timeout: Duration,
}

impl fmt::Debug for HyperConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperConnector")
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl HyperConnector {
    /// Creates a connector using the given TLS client configuration.
    #[must_use]
    pub fn new(tls_config: Arc<rustls::ClientConfig>, connect_timeout: Duration) -> Self {
        Self {
            tls: tokio_rustls::TlsConnector::from(tls_config),
            connect_timeout,
        }
    }

    async fn handshake<T>(io: T) -> io::Result<Box<dyn Connection>>
    where
        T: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
    {
        let (sender, conn) = http1::handshake(io).await.map_err(io::Error::other)?;

        // The driver task owns the socket until the peer hangs up.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "connection driver ended");
            }
        });

        Ok(Box::new(HyperConnection { sender }))
    }
}

#[async_trait]
impl Connector for HyperConnector {
    async fn connect(&self, destination: &Destination) -> io::Result<Box<dyn Connection>> {
        trace!(%destination, "opening connection");

        let tcp = timeout(
            self.connect_timeout,
            TcpStream::connect((destination.host.as_str(), destination.port)),
        )
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect to {destination} timed out"),
            )
        })??;

        match destination.scheme {
            Scheme::Http => Self::handshake(TokioIo::new(tcp)).await,
            Scheme::Https => {
                let name = ServerName::try_from(destination.host.clone())
                    .map_err(io::Error::other)?;
                let stream = self.tls.connect(name, tcp).await?;
                Self::handshake(TokioIo::new(stream)).await
            }
        }
    }
}

struct HyperConnection {
    sender: SendRequest<Full<Bytes>>,
}

#[async_trait]
impl Connection for HyperConnection {
    async fn send(&mut self, request: Request<Full<Bytes>>) -> io::Result<RestResponse> {
        let response = self
            .sender
            .send_request(request)
            .await
            .map_err(io::Error::other)?;

        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(io::Error::other)?.to_bytes();

        Ok(RestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_from_https_uri_uses_default_port() {
        let uri: Uri = "https://cp.example.com/applications".parse().expect("uri");
        let dest = Destination::from_uri(&uri).expect("destination");
        assert_eq!(dest.scheme, Scheme::Https);
        assert_eq!(dest.host, "cp.example.com");
        assert_eq!(dest.port, 443);
    }

    #[test]
    fn destination_from_uri_keeps_explicit_port() {
        let uri: Uri = "http://localhost:9763/applications".parse().expect("uri");
        let dest = Destination::from_uri(&uri).expect("destination");
        assert_eq!(dest.scheme, Scheme::Http);
        assert_eq!(dest.port, 9763);
        assert_eq!(dest.authority(), "localhost:9763");
    }

    #[test]
    fn destination_rejects_missing_scheme() {
        let uri: Uri = "/applications".parse().expect("uri");
        assert!(matches!(
            Destination::from_uri(&uri),
            Err(RestError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn destination_rejects_unsupported_scheme() {
        let uri: Uri = "ftp://host/file".parse().expect("uri");
        assert!(matches!(
            Destination::from_uri(&uri),
            Err(RestError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn destination_display_round_trip() {
        let dest = Destination {
            scheme: Scheme::Https,
            host: "cp.example.com".into(),
            port: 9443,
        };
        assert_eq!(dest.to_string(), "https://cp.example.com:9443");
    }

    #[test]
    fn response_success_and_text() {
        let response = RestResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"{\"ok\":true}"),
        };
        assert!(response.is_success());
        assert_eq!(response.body_text(), "{\"ok\":true}");

        let failed = RestResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        assert!(!failed.is_success());
    }
}
