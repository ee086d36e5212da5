//! Load-balancing multi-host proxy client
//!
//! Routes each request to one of a fixed set of upstream hosts, preferring
//! hosts with the fewest observed transport errors, then server-error
//! responses, then in-flight connections. Ties are broken uniformly at
//! random so equally healthy hosts share load. There is no retrying and no
//! circuit breaking: failures surface immediately and only move the
//! counters, so the next call is simply more likely to pick another host.

use std::sync::Arc;

use http::Method;
use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::blocking::BlockingProxy;
use crate::client::{normalize_base, resolve};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::request::Request;
use crate::response::Response;
use crate::transport::{ReqwestTransport, Transport};

/// Host ranking tuple: `(errors, failures, connections)`
///
/// Compared lexicographically, smaller is better.
pub type Priority = (u64, u64, u64);

/// Point-in-time copy of one host's counters
///
/// Taken under a single lock acquisition, so the three fields are always
/// mutually consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Transport-level failures (connection refused, timeout, reset)
    pub errors: u64,
    /// Responses with a server-error status (>= 500)
    pub failures: u64,
    /// Requests currently in flight
    pub connections: u64,
}

impl CounterSnapshot {
    /// The ranking tuple for this snapshot
    #[must_use]
    pub const fn priority(&self) -> Priority {
        (self.errors, self.failures, self.connections)
    }
}

/// Thread-safe health and load counters for one host
///
/// Every mutation is a whole read-modify-write under the lock; concurrent
/// updates never lose increments.
#[derive(Debug, Default)]
pub struct HostStats {
    counters: Mutex<CounterSnapshot>,
}

impl HostStats {
    fn new() -> Self {
        Self::default()
    }

    /// Snapshot all three counters under one lock acquisition
    pub fn snapshot(&self) -> CounterSnapshot {
        *self.counters.lock()
    }

    fn record_error(&self) {
        self.counters.lock().errors += 1;
    }

    fn record_failure(&self) {
        self.counters.lock().failures += 1;
    }

    /// Track an in-flight request; the guard's drop releases it
    fn begin_connection(&self) -> ConnectionGuard<'_> {
        self.counters.lock().connections += 1;
        ConnectionGuard { stats: self }
    }
}

/// RAII guard for the in-flight connection count
///
/// Dropping the guard decrements `connections`, so the decrement runs exactly
/// once on every exit path, including errors and cancelled futures.
struct ConnectionGuard<'a> {
    stats: &'a HostStats,
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        let mut counters = self.stats.counters.lock();
        counters.connections = counters.connections.saturating_sub(1);
    }
}

/// Host selection policy
///
/// Returning `None` eliminates a host from consideration for this call.
/// The `method` is available so policies can distinguish reads from writes.
pub trait RoutingPolicy: Send + Sync {
    /// Rank one host given its current counters
    fn priority(&self, host: &Url, method: &Method, stats: CounterSnapshot) -> Option<Priority>;
}

/// Default policy: minimize errors, then failures, then active connections
///
/// Never eliminates a host.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastLoaded;

impl RoutingPolicy for LeastLoaded {
    fn priority(&self, _host: &Url, _method: &Method, stats: CounterSnapshot) -> Option<Priority> {
        Some(stats.priority())
    }
}

struct HostEntry {
    url: Url,
    stats: HostStats,
}

/// An embedded proxy client balancing requests over multiple hosts
///
/// The host set is fixed at construction; per-host counters are the only
/// mutable state and each is guarded by its own lock, so requests to
/// different hosts never serialize on a shared one.
///
/// # Examples
/// ```no_run
/// use hostpool::{Proxy, Result};
///
/// # async fn example() -> Result<()> {
/// let proxy = Proxy::new(["http://replica1/", "http://replica2/"])?;
/// let response = proxy.get("status").await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
pub struct Proxy {
    transport: Arc<dyn Transport>,
    hosts: Vec<HostEntry>,
    trailing: String,
    policy: Arc<dyn RoutingPolicy>,
}

impl Proxy {
    /// Create a proxy with the default configuration
    ///
    /// # Errors
    /// Returns error if no hosts are supplied, a URL is invalid, or the
    /// HTTP client cannot be built
    pub fn new<I, S>(urls: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(urls, &ClientConfig::default())
    }

    /// Create a proxy from a configuration
    ///
    /// # Errors
    /// Returns error if no hosts are supplied, a URL is invalid, or the
    /// HTTP client cannot be built
    pub fn with_config<I, S>(urls: I, config: &ClientConfig) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Self::with_transport(urls, transport, config.trailing.clone())
    }

    /// Create a proxy over an explicit transport
    ///
    /// # Errors
    /// Returns error if no hosts are supplied or a URL is invalid
    pub fn with_transport<I, S>(
        urls: I,
        transport: Arc<dyn Transport>,
        trailing: impl Into<String>,
    ) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hosts: Vec<HostEntry> = Vec::new();
        for url in urls {
            let url = normalize_base(url.as_ref())?;
            // duplicates after normalization collapse to one entry
            if hosts.iter().any(|entry| entry.url == url) {
                continue;
            }
            hosts.push(HostEntry {
                url,
                stats: HostStats::new(),
            });
        }
        if hosts.is_empty() {
            return Err(ClientError::Config("Proxy requires at least one host".into()));
        }

        debug!(hosts = hosts.len(), "Created proxy");

        Ok(Self {
            transport,
            hosts,
            trailing: trailing.into(),
            policy: Arc::new(LeastLoaded),
        })
    }

    /// Replace the routing policy
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn RoutingPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// The configured host URLs, in insertion order
    pub fn hosts(&self) -> impl Iterator<Item = &Url> {
        self.hosts.iter().map(|entry| &entry.url)
    }

    /// Snapshot the counters of one host
    ///
    /// The host is matched after trailing-slash normalization; an unknown
    /// host returns `None`.
    pub fn stats(&self, host: &str) -> Option<CounterSnapshot> {
        let url = normalize_base(host).ok()?;
        self.hosts
            .iter()
            .find(|entry| entry.url == url)
            .map(|entry| entry.stats.snapshot())
    }

    /// Choose a host URL according to the routing policy
    ///
    /// Hosts in the minimal-priority group are picked uniformly at random.
    ///
    /// # Errors
    /// Returns [`ClientError::NoAvailableHost`] if the policy eliminates
    /// every host
    pub fn choose(&self, method: &Method) -> Result<&Url, ClientError> {
        self.choose_entry(method).map(|entry| &entry.url)
    }

    fn choose_entry(&self, method: &Method) -> Result<&HostEntry, ClientError> {
        let mut best: Option<Priority> = None;
        let mut candidates: Vec<&HostEntry> = Vec::new();
        for entry in &self.hosts {
            let Some(priority) = self
                .policy
                .priority(&entry.url, method, entry.stats.snapshot())
            else {
                continue;
            };
            match best {
                Some(current) if priority > current => {}
                Some(current) if priority == current => candidates.push(entry),
                _ => {
                    best = Some(priority);
                    candidates.clear();
                    candidates.push(entry);
                }
            }
        }
        candidates
            .choose(&mut rand::rng())
            .copied()
            .ok_or(ClientError::NoAvailableHost)
    }

    /// Send a request to the chosen host and update its counters
    ///
    /// The chosen host's `connections` counter is held for the duration of
    /// the exchange; a transport failure increments `errors` and propagates
    /// unchanged, a response with status >= 500 increments `failures` and is
    /// returned normally. The proxy never raises on 4xx/5xx.
    ///
    /// # Errors
    /// Returns error on transport-level failure or if every host is
    /// eliminated
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let entry = self.choose_entry(request.method())?;
        let url = resolve(&entry.url, request.path(), &self.trailing)?;
        trace!(host = %entry.url, url = %url, method = %request.method(), "Routing request");

        let _guard = entry.stats.begin_connection();
        match self.transport.send(url, request).await {
            Err(err) => {
                if err.is_transport() {
                    entry.stats.record_error();
                }
                Err(err)
            }
            Ok(response) => {
                if response.status().is_server_error() {
                    entry.stats.record_failure();
                }
                Ok(response)
            }
        }
    }

    /// Send a request with a method and relative path
    ///
    /// # Errors
    /// Returns error on transport-level failure or if every host is
    /// eliminated
    pub async fn request(&self, method: Method, path: &str) -> Result<Response, ClientError> {
        self.send(Request::new(method, path)).await
    }

    /// GET request with optional path
    ///
    /// # Errors
    /// Returns error on transport-level failure
    pub async fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::GET, path).await
    }

    /// OPTIONS request with optional path
    ///
    /// # Errors
    /// Returns error on transport-level failure
    pub async fn options(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::OPTIONS, path).await
    }

    /// HEAD request with optional path
    ///
    /// # Errors
    /// Returns error on transport-level failure
    pub async fn head(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::HEAD, path).await
    }

    /// POST request with a JSON body
    ///
    /// # Errors
    /// Returns error on transport-level failure or unserializable bodies
    pub async fn post<T: Serialize>(&self, path: &str, json: &T) -> Result<Response, ClientError> {
        self.send(
            Request::builder()
                .method(Method::POST)
                .path(path)
                .json(json)?
                .build(),
        )
        .await
    }

    /// PUT request with a JSON body
    ///
    /// # Errors
    /// Returns error on transport-level failure or unserializable bodies
    pub async fn put<T: Serialize>(&self, path: &str, json: &T) -> Result<Response, ClientError> {
        self.send(
            Request::builder()
                .method(Method::PUT)
                .path(path)
                .json(json)?
                .build(),
        )
        .await
    }

    /// PATCH request with a JSON body
    ///
    /// # Errors
    /// Returns error on transport-level failure or unserializable bodies
    pub async fn patch<T: Serialize>(&self, path: &str, json: &T) -> Result<Response, ClientError> {
        self.send(
            Request::builder()
                .method(Method::PATCH)
                .path(path)
                .json(json)?
                .build(),
        )
        .await
    }

    /// DELETE request with optional path
    ///
    /// # Errors
    /// Returns error on transport-level failure
    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::DELETE, path).await
    }

    /// Derive a proxy scoped to an appended path
    ///
    /// Every host URL gets the segment joined on; the derived proxy keeps the
    /// transport, trailing policy and routing policy but starts with fresh,
    /// zeroed counters, so parent and child track load independently.
    ///
    /// # Errors
    /// Returns error if the segment cannot be joined onto a host URL
    pub fn path(&self, segment: &str) -> Result<Self, ClientError> {
        let mut urls = Vec::with_capacity(self.hosts.len());
        for entry in &self.hosts {
            let joined = entry
                .url
                .join(segment)
                .map_err(|e| ClientError::BuildError(format!("Cannot join {segment:?}: {e}")))?;
            urls.push(joined.to_string());
        }
        let mut derived =
            Self::with_transport(urls, Arc::clone(&self.transport), self.trailing.clone())?;
        derived.policy = Arc::clone(&self.policy);
        Ok(derived)
    }

    /// Get a reference to the blocking API
    #[must_use]
    pub const fn blocking(&self) -> BlockingProxy<'_> {
        BlockingProxy::new(self)
    }
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field(
                "hosts",
                &self.hosts.iter().map(|e| e.url.as_str()).collect::<Vec<_>>(),
            )
            .field("trailing", &self.trailing)
            .finish()
    }
}

// ===========================================================================
// Unit Tests
// ===========================================================================
