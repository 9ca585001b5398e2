//! # nimbus-rest
//!
//! REST client layer for the Nimbus control plane.
//!
//! Provides:
//! - Connection pooling with global and per-destination caps
//! - TLS trust handling, including an opt-in self-signed trust mode
//! - Basic-Authentication header injection on every request
//! - JSON payload marshalling for POST bodies
//! - Per-verb error translation into a single typed error
//!
//! # Architecture
//!
//! [`client::RestClient`] issues GET/POST/DELETE requests through a
//! [`pool::ConnectionPool`]. The pool checks connections out for the
//! duration of one request and returns them afterwards, so repeated
//! requests to the same destination avoid handshake cost. The transport
//! behind the pool is a trait seam ([`transport::Connector`]), which the
//! production [`transport::HyperConnector`] implements over TCP and
//! rustls.
//!
//! ```text
//! ┌────────────┐   acquire/release   ┌────────────────┐
//! │ RestClient │◄───────────────────►│ ConnectionPool │
//! └────────────┘                     └───────┬────────┘
//!                                            │ connect (on miss)
//!                                    ┌───────▼────────┐
//!                                    │ HyperConnector │
//!                                    └────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod pool;
pub mod tls;
pub mod transport;

pub use client::{RestClient, Verb};
pub use config::{Credentials, RestConfig};
pub use error::{RestError, Result};
pub use pool::{ConnectionPool, PoolConfig, PooledConnection};
pub use tls::TrustPolicy;
pub use transport::{Connection, Connector, Destination, RestResponse, Scheme};
