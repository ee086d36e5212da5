//! Base-URL-scoped HTTP client

use std::sync::Arc;

use http::Method;
use serde::Serialize;
use tracing::trace;
use url::Url;

use crate::blocking::BlockingClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::request::Request;
use crate::response::Response;
use crate::transport::{ReqwestTransport, Transport};

/// Normalize a base URL to carry exactly one trailing slash
///
/// Joining relative paths against a base requires the trailing slash;
/// without it the last path segment would be replaced rather than extended.
pub(crate) fn normalize_base(url: &str) -> Result<Url, ClientError> {
    let trimmed = url.trim_end_matches('/');
    Url::parse(&format!("{trimmed}/"))
        .map_err(|e| ClientError::BuildError(format!("Invalid base url {url:?}: {e}")))
}

/// Resolve a relative (or absolute) path against a base URL
///
/// The joined URL is stripped of trailing slashes and the configured
/// `trailing` characters are appended, so e.g. a trailing policy of "/"
/// yields APIs that always end in a slash and the empty policy never does.
pub(crate) fn resolve(base: &Url, path: &str, trailing: &str) -> Result<Url, ClientError> {
    let joined = base
        .join(path)
        .map_err(|e| ClientError::BuildError(format!("Cannot join {path:?}: {e}")))?;
    if joined.query().is_some() || joined.fragment().is_some() {
        return Ok(joined);
    }
    let trimmed = joined.as_str().trim_end_matches('/');
    let resolved = format!("{trimmed}{trailing}");
    Url::parse(&resolved)
        .map_err(|e| ClientError::BuildError(format!("Invalid resolved url {resolved:?}: {e}")))
}

/// A client which sends requests relative to a base URL
///
/// Cheap to clone and to derive: [`Client::path`] returns a new client scoped
/// to a sub-resource while sharing the underlying transport and its
/// connection pool.
///
/// # Examples
/// ```no_run
/// use hostpool::{Client, Result};
///
/// # async fn example() -> Result<()> {
/// let api = Client::new("https://api.example.com/v1")?;
/// let users = api.path("users")?;
/// let response = users.get("42").await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    base: Url,
    trailing: String,
}

impl Client {
    /// Create a client with the default configuration
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn new(url: &str) -> Result<Self, ClientError> {
        Self::with_config(url, &ClientConfig::default())
    }

    /// Create a client from a configuration
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn with_config(url: &str, config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Self::with_transport(url, transport, config.trailing.clone())
    }

    /// Create a client over an explicit transport
    ///
    /// # Errors
    /// Returns error if the URL is invalid
    pub fn with_transport(
        url: &str,
        transport: Arc<dyn Transport>,
        trailing: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            transport,
            base: normalize_base(url)?,
            trailing: trailing.into(),
        })
    }

    /// Get the normalized base URL
    pub fn url(&self) -> &Url {
        &self.base
    }

    /// Get the trailing characters appended to resolved URLs
    pub fn trailing(&self) -> &str {
        &self.trailing
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Derive a client scoped to an appended path
    ///
    /// The transport (and its connection pool) is shared with the parent.
    ///
    /// # Errors
    /// Returns error if the segment cannot be joined onto the base URL
    pub fn path(&self, segment: &str) -> Result<Self, ClientError> {
        let joined = self
            .base
            .join(segment)
            .map_err(|e| ClientError::BuildError(format!("Cannot join {segment:?}: {e}")))?;
        Ok(Self {
            transport: Arc::clone(&self.transport),
            base: normalize_base(joined.as_str())?,
            trailing: self.trailing.clone(),
        })
    }

    /// Send a request built with [`Request::builder`]
    ///
    /// The request path is resolved against the base URL; the response is
    /// returned whatever its status code.
    ///
    /// # Errors
    /// Returns error on transport-level failure or unresolvable paths
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let url = resolve(&self.base, request.path(), &self.trailing)?;
        trace!(url = %url, method = %request.method(), "Resolved request");
        self.transport.send(url, request).await
    }

    /// Send a request with a method and relative path
    ///
    /// # Errors
    /// Returns error on transport-level failure or unresolvable paths
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

    /// Get a reference to the blocking API
    #[must_use]
    pub const fn blocking(&self) -> BlockingClient<'_> {
        BlockingClient::new(self)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.base.as_str())
            .field("trailing", &self.trailing)
            .finish()
    }
}

// ===========================================================================
// Unit Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base() {
        assert_eq!(
            normalize_base("http://h").unwrap().as_str(),
            "http://h/"
        );
        assert_eq!(
            normalize_base("http://h/api///").unwrap().as_str(),
            "http://h/api/"
        );
        assert!(normalize_base("not a url").is_err());
    }

    #[test]
    fn test_resolve_relative() {
        let base = normalize_base("http://h/api").unwrap();
        assert_eq!(
            resolve(&base, "items", "").unwrap().as_str(),
            "http://h/api/items"
        );
    }

    #[test]
    fn test_resolve_trailing_policy() {
        let base = normalize_base("http://h/api").unwrap();
        assert_eq!(
            resolve(&base, "items", "/").unwrap().as_str(),
            "http://h/api/items/"
        );
        assert_eq!(
            resolve(&base, "items/", "").unwrap().as_str(),
            "http://h/api/items"
        );
    }

    #[test]
    fn test_resolve_absolute_path_replaces() {
        let base = normalize_base("http://h/api/v1").unwrap();
        assert_eq!(
            resolve(&base, "/other", "").unwrap().as_str(),
            "http://h/other"
        );
    }

    #[test]
    fn test_resolve_keeps_query() {
        let base = normalize_base("http://h").unwrap();
        assert_eq!(
            resolve(&base, "search?q=1", "/").unwrap().as_str(),
            "http://h/search?q=1"
        );
    }

    #[test]
    fn test_path_derivation() {
        let client = Client::new("http://h/api").unwrap();
        let derived = client.path("users").unwrap();
        assert_eq!(derived.url().as_str(), "http://h/api/users/");
        // parent unchanged
        assert_eq!(client.url().as_str(), "http://h/api/");
    }

    #[test]
    fn test_path_derivation_preserves_trailing() {
        let config = ClientConfig::new().with_trailing("/");
        let client = Client::with_config("http://h", &config).unwrap();
        let derived = client.path("a").unwrap().path("b").unwrap();
        assert_eq!(derived.url().as_str(), "http://h/a/b/");
        assert_eq!(derived.trailing(), "/");
    }
}
