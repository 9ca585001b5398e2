//! Connection pooling with global and per-destination caps.
//!
//! The pool owns every connection. Callers check one out with
//! [`ConnectionPool::acquire`] and get a [`PooledConnection`] guard;
//! dropping the guard returns the connection to the destination's idle
//! set (or discards it if the transport closed underneath). Acquiring
//! beyond a cap blocks until a release, or fails with
//! [`RestError::PoolExhausted`] once the configured bound elapses.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Request;
use http_body_util::Full;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

use crate::error::RestError;
use crate::transport::{Connection, Connector, Destination, RestResponse};

/// Default cap on connections across all destinations.
pub const DEFAULT_MAX_TOTAL: usize = 100;

/// Default cap on connections per destination.
pub const DEFAULT_MAX_PER_DESTINATION: usize = 20;

/// Default bound on how long an acquisition may wait.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum concurrent connections across all destinations.
    pub max_total: usize,
    /// Maximum concurrent connections per destination.
    pub max_per_destination: usize,
    /// Bound on acquisition waits; `None` blocks indefinitely.
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total: DEFAULT_MAX_TOTAL,
            max_per_destination: DEFAULT_MAX_PER_DESTINATION,
            acquire_timeout: Some(DEFAULT_ACQUIRE_TIMEOUT),
        }
    }
}

impl PoolConfig {
    /// Sets the global connection cap.
    #[must_use]
    pub const fn with_max_total(mut self, max: usize) -> Self {
        self.max_total = max;
        self
    }

    /// Sets the per-destination connection cap.
    #[must_use]
    pub const fn with_max_per_destination(mut self, max: usize) -> Self {
        self.max_per_destination = max;
        self
    }

    /// Sets the acquisition timeout; `None` blocks indefinitely.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// Idle connections and the concurrency gate for one destination.
struct DestinationSlot {
    semaphore: Arc<Semaphore>,
    idle: Mutex<Vec<Box<dyn Connection>>>,
}

/// Pool of reusable transport connections keyed by destination.
pub struct ConnectionPool {
    config: PoolConfig,
    connector: Arc<dyn Connector>,
    global: Arc<Semaphore>,
    slots: Mutex<HashMap<Destination, Arc<DestinationSlot>>>,
    new_connections: AtomicU64,
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.config)
            .field("new_connections", &self.new_connections)
            .finish_non_exhaustive()
    }
}

impl ConnectionPool {
    /// Creates a pool backed by the given connector.
    #[must_use]
    pub fn new(config: PoolConfig, connector: Arc<dyn Connector>) -> Self {
        let global = Arc::new(Semaphore::new(config.max_total));
        Self {
            config,
            connector,
            global,
            slots: Mutex::new(HashMap::new()),
            new_connections: AtomicU64::new(0),
        }
    }

    /// Returns the pool configuration.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of connections established since the pool was created.
    ///
    /// Stays flat across requests served from the idle set.
    #[must_use]
    pub fn new_connection_count(&self) -> u64 {
        self.new_connections.load(Ordering::Relaxed)
    }

    /// Number of idle connections held for a destination.
    #[must_use]
    pub fn idle_count(&self, destination: &Destination) -> usize {
        self.slots
            .lock()
            .get(destination)
            .map_or(0, |slot| slot.idle.lock().len())
    }

    fn slot(&self, destination: &Destination) -> Arc<DestinationSlot> {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(destination.clone()).or_insert_with(|| {
            Arc::new(DestinationSlot {
                semaphore: Arc::new(Semaphore::new(self.config.max_per_destination)),
                idle: Mutex::new(Vec::new()),
            })
        }))
    }

    /// Checks a connection out for one request.
    ///
    /// Reuses an idle connection to the destination when one exists;
    /// otherwise establishes a new one through the connector. Waits for
    /// a free slot when either cap is reached.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::PoolExhausted`] if the wait exceeds the
    /// configured bound, or [`RestError::Connection`] if establishing a
    /// new connection fails.
    pub async fn acquire(&self, destination: &Destination) -> Result<PooledConnection, RestError> {
        let slot = self.slot(destination);

        // Destination permit first: a caller parked on a saturated
        // destination must not pin global capacity that other
        // destinations could use.
        let permits = async {
            let dest = Arc::clone(&slot.semaphore).acquire_owned().await?;
            let global = Arc::clone(&self.global).acquire_owned().await?;
            Ok::<_, tokio::sync::AcquireError>((dest, global))
        };

        // The semaphores are never closed, so the only acquisition
        // failure is the timeout.
        let exhausted = |waited| RestError::PoolExhausted {
            destination: destination.to_string(),
            waited,
        };
        let (destination_permit, global_permit) = match self.config.acquire_timeout {
            Some(limit) => tokio::time::timeout(limit, permits)
                .await
                .map_err(|_| exhausted(limit))?
                .map_err(|_| exhausted(limit))?,
            None => permits.await.map_err(|_| exhausted(Duration::ZERO))?,
        };

        let connection = match self.checkout_idle(&slot) {
            Some(connection) => {
                trace!(%destination, "reusing pooled connection");
                connection
            }
            None => {
                debug!(%destination, "establishing new connection");
                let connection = self
                    .connector
                    .connect(destination)
                    .await
                    .map_err(|source| RestError::Connection {
                        destination: destination.to_string(),
                        source,
                    })?;
                self.new_connections.fetch_add(1, Ordering::Relaxed);
                connection
            }
        };

        Ok(PooledConnection {
            connection: Some(connection),
            slot,
            _destination_permit: destination_permit,
            _global_permit: global_permit,
        })
    }

    fn checkout_idle(&self, slot: &DestinationSlot) -> Option<Box<dyn Connection>> {
        let mut idle = slot.idle.lock();
        while let Some(connection) = idle.pop() {
            if connection.is_open() {
                return Some(connection);
            }
            // Closed while idle; discard and keep looking.
        }
        None
    }
}

/// A connection checked out of the pool for one request.
///
/// Dropping the guard releases the connection on every exit path:
/// back to the idle set when still open, discarded otherwise. The
/// concurrency permits are released either way.
pub struct PooledConnection {
    connection: Option<Box<dyn Connection>>,
    slot: Arc<DestinationSlot>,
    _destination_permit: OwnedSemaphorePermit,
    _global_permit: OwnedSemaphorePermit,
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("retired", &self.connection.is_none())
            .finish_non_exhaustive()
    }
}

impl PooledConnection {
    /// Sends one request on the checked-out connection.
    pub async fn send(&mut self, request: Request<Full<Bytes>>) -> io::Result<RestResponse> {
        match self.connection.as_mut() {
            Some(connection) => connection.send(request).await,
            None => Err(io::Error::other("connection already retired")),
        }
    }

    /// Retires the connection instead of returning it to the pool.
    ///
    /// Used after transport errors; the permits are still released when
    /// the guard drops.
    pub fn retire(&mut self) {
        self.connection = None;
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            if connection.is_open() {
                self.slot.idle.lock().push(connection);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Scheme;

    use async_trait::async_trait;
    use http::{HeaderMap, StatusCode};

    struct MockConnection {
        open: bool,
    }

    #[async_trait]
    impl Connection for MockConnection {
        async fn send(&mut self, _request: Request<Full<Bytes>>) -> io::Result<RestResponse> {
            Ok(RestResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::new(),
            })
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    struct MockConnector {
        stays_open: bool,
    }

    #[async_trait]
    impl Connector for MockConnector {
        async fn connect(&self, _destination: &Destination) -> io::Result<Box<dyn Connection>> {
            Ok(Box::new(MockConnection {
                open: self.stays_open,
            }))
        }
    }

    struct RefusingConnector;

    #[async_trait]
    impl Connector for RefusingConnector {
        async fn connect(&self, _destination: &Destination) -> io::Result<Box<dyn Connection>> {
            Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        }
    }

    fn destination(host: &str) -> Destination {
        Destination {
            scheme: Scheme::Http,
            host: host.into(),
            port: 80,
        }
    }

    fn pool(config: PoolConfig) -> ConnectionPool {
        ConnectionPool::new(config, Arc::new(MockConnector { stays_open: true }))
    }

    #[tokio::test]
    async fn released_connection_is_reused() {
        let pool = pool(PoolConfig::default());
        let dest = destination("cp");

        let first = pool.acquire(&dest).await.expect("acquire");
        drop(first);
        assert_eq!(pool.idle_count(&dest), 1);

        let _second = pool.acquire(&dest).await.expect("acquire");
        assert_eq!(pool.new_connection_count(), 1);
    }

    #[tokio::test]
    async fn retired_connection_is_not_reused() {
        let pool = pool(PoolConfig::default());
        let dest = destination("cp");

        let mut first = pool.acquire(&dest).await.expect("acquire");
        first.retire();
        drop(first);
        assert_eq!(pool.idle_count(&dest), 0);

        let _second = pool.acquire(&dest).await.expect("acquire");
        assert_eq!(pool.new_connection_count(), 2);
    }

    #[tokio::test]
    async fn closed_idle_connection_is_discarded() {
        let connector = Arc::new(MockConnector { stays_open: false });
        let pool = ConnectionPool::new(PoolConfig::default(), connector);
        let dest = destination("cp");

        let first = pool.acquire(&dest).await.expect("acquire");
        drop(first);
        // is_open() is false, so nothing was returned to the idle set.
        assert_eq!(pool.idle_count(&dest), 0);

        let _second = pool.acquire(&dest).await.expect("acquire");
        assert_eq!(pool.new_connection_count(), 2);
    }

    #[tokio::test]
    async fn acquire_beyond_destination_cap_blocks_until_release() {
        let pool = Arc::new(pool(
            PoolConfig::default()
                .with_max_per_destination(1)
                .with_acquire_timeout(None),
        ));
        let dest = destination("cp");

        let held = pool.acquire(&dest).await.expect("acquire");

        let waiter = tokio::spawn({
            let pool = Arc::clone(&pool);
            let dest = dest.clone();
            async move { pool.acquire(&dest).await.map(drop) }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished(), "excess acquire must block, not fail");

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish after release")
            .expect("join")
            .expect("acquire after release");
    }

    #[tokio::test]
    async fn acquire_beyond_global_cap_blocks() {
        let pool = Arc::new(pool(
            PoolConfig::default()
                .with_max_total(1)
                .with_acquire_timeout(None),
        ));

        let held = pool.acquire(&destination("a")).await.expect("acquire");

        let waiter = tokio::spawn({
            let pool = Arc::clone(&pool);
            async move { pool.acquire(&destination("b")).await.map(drop) }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish after release")
            .expect("join")
            .expect("acquire after release");
    }

    #[tokio::test]
    async fn waiter_on_one_destination_does_not_pin_global_capacity() {
        let pool = Arc::new(pool(
            PoolConfig::default()
                .with_max_total(2)
                .with_max_per_destination(1)
                .with_acquire_timeout(None),
        ));

        // Saturate destination "a" and park a second waiter on it.
        let held = pool.acquire(&destination("a")).await.expect("acquire");
        let parked = tokio::spawn({
            let pool = Arc::clone(&pool);
            async move { pool.acquire(&destination("a")).await.map(drop) }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!parked.is_finished());

        // "b" is within both caps; the parked waiter must not hold the
        // remaining global permit.
        let other = tokio::time::timeout(
            Duration::from_millis(500),
            pool.acquire(&destination("b")),
        )
        .await
        .expect("under-cap destination must not block on a foreign waiter")
        .expect("acquire");

        drop(other);
        drop(held);
        tokio::time::timeout(Duration::from_secs(1), parked)
            .await
            .expect("parked waiter should finish after release")
            .expect("join")
            .expect("acquire after release");
    }

    #[tokio::test]
    async fn bounded_wait_fails_with_pool_exhausted() {
        let pool = pool(
            PoolConfig::default()
                .with_max_per_destination(1)
                .with_acquire_timeout(Some(Duration::from_millis(50))),
        );
        let dest = destination("cp");

        let _held = pool.acquire(&dest).await.expect("acquire");
        let result = pool.acquire(&dest).await;
        assert!(matches!(result, Err(RestError::PoolExhausted { .. })));
    }

    #[tokio::test]
    async fn connect_failure_surfaces_and_frees_permits() {
        let pool = ConnectionPool::new(
            PoolConfig::default().with_max_per_destination(1),
            Arc::new(RefusingConnector),
        );
        let dest = destination("cp");

        let result = pool.acquire(&dest).await;
        assert!(matches!(result, Err(RestError::Connection { .. })));

        // The failed attempt must not leak its permits.
        let result = pool.acquire(&dest).await;
        assert!(matches!(result, Err(RestError::Connection { .. })));
    }
}
