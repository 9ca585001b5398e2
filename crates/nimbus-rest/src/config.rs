//! Client configuration: credentials, endpoints and timeouts.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::pool::PoolConfig;
use crate::tls::TrustPolicy;

/// Default timeout for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for executing a request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Basic-Authentication credentials.
///
/// Built once at process start and immutable afterwards; concurrent
/// reads are safe.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Creates credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the `Basic <base64>` Authorization header value.
    #[must_use]
    pub fn basic_header(&self) -> String {
        let identity = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(identity.as_bytes()))
    }
}

/// Configuration for a [`crate::RestClient`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the control plane, e.g. `https://localhost:9443`.
    pub server_url: String,
    /// Credentials for the Authorization header.
    pub credentials: Credentials,
    /// Server certificate trust policy.
    pub trust_policy: TrustPolicy,
    /// Connection pool settings.
    pub pool: PoolConfig,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Timeout for executing one request.
    pub request_timeout: Duration,
}

impl RestConfig {
    /// Creates a configuration with default pool, trust and timeout
    /// settings.
    #[must_use]
    pub fn new(server_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            server_url: server_url.into(),
            credentials,
            trust_policy: TrustPolicy::default(),
            pool: PoolConfig::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the trust policy.
    #[must_use]
    pub const fn with_trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.trust_policy = policy;
        self
    }

    /// Sets the pool configuration.
    #[must_use]
    pub const fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
