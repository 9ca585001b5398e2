//! Error types for REST client operations.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::client::Verb;

/// Result type alias for REST client operations.
pub type Result<T> = std::result::Result<T, RestError>;

/// Errors that can occur in the REST client layer.
#[derive(Debug, Error)]
pub enum RestError {
    /// Building the TLS client configuration failed.
    ///
    /// Fatal to client construction; wraps every underlying cause
    /// (missing algorithm, unusable trust material) in one variant.
    #[error("TLS configuration failed: {reason}")]
    TlsConfiguration {
        /// Description of the configuration failure.
        reason: String,
    },

    /// A POST was attempted with a payload that serialized to nothing.
    ///
    /// Raised before any network I/O; a caller error, not a transport
    /// failure.
    #[error("invalid payload for POST {path}: {reason}")]
    InvalidPayload {
        /// Resource path the POST was addressed to.
        path: String,
        /// Why the payload was rejected.
        reason: String,
    },

    /// The endpoint string could not be resolved to a destination.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The offending endpoint string.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No connection could be acquired within the configured bound.
    #[error("connection pool exhausted for {destination} after {waited:?}")]
    PoolExhausted {
        /// Destination the acquisition was for.
        destination: String,
        /// How long the caller waited.
        waited: Duration,
    },

    /// Establishing a new connection to a destination failed.
    #[error("failed to connect to {destination}: {source}")]
    Connection {
        /// Destination the connection was for.
        destination: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A transport-level failure while executing a request.
    ///
    /// Carries the failed verb and resource path. The client never
    /// retries; retry policy is a caller concern.
    #[error("{verb} {path} failed: {source}")]
    Transport {
        /// HTTP verb of the failed request.
        verb: Verb,
        /// Resource path of the failed request.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The request could not be assembled from its parts.
    #[error("failed to build request: {reason}")]
    Request {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_names_verb_and_path() {
        let err = RestError::Transport {
            verb: Verb::Post,
            path: "/applications/deploy".into(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        let msg = err.to_string();
        assert!(msg.contains("POST"));
        assert!(msg.contains("/applications/deploy"));
    }

    #[test]
    fn invalid_payload_names_path() {
        let err = RestError::InvalidPayload {
            path: "/applications/deploy".into(),
            reason: "serialized payload is empty".into(),
        };
        assert!(err.to_string().contains("/applications/deploy"));
    }

    #[test]
    fn pool_exhausted_names_destination() {
        let err = RestError::PoolExhausted {
            destination: "https://cp.example.com:9443".into(),
            waited: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("cp.example.com"));
    }
}
