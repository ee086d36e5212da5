//! Configuration shared by clients and proxies

use crate::error::ClientError;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Client configuration
///
/// Carried by every client variant and preserved across path derivation:
/// a derived client keeps the trailing policy, default headers and timeouts
/// of its parent.
#[derive(Clone)]
pub struct ClientConfig {
    /// Characters appended to every resolved URL (e.g. "/")
    pub trailing: String,

    /// Default headers included in every request
    pub headers: HeaderMap,

    /// Bearer token sent as `Authorization` header
    pub bearer: Option<String>,

    /// Total request timeout
    pub timeout: Duration,

    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            trailing: String::new(),
            headers: HeaderMap::new(),
            bearer: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Create a default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables
    ///
    /// Environment variables:
    /// - `HOSTPOOL_TRAILING`: trailing characters appended to resolved URLs
    /// - `HOSTPOOL_AUTH_TOKEN`: bearer token for the `Authorization` header
    /// - `HOSTPOOL_TIMEOUT_SECS`: total request timeout in seconds
    ///
    /// All variables are optional; absent ones keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(trailing) = std::env::var("HOSTPOOL_TRAILING") {
            config.trailing = trailing;
        }
        if let Ok(token) = std::env::var("HOSTPOOL_AUTH_TOKEN") {
            config.bearer = Some(token);
        }
        if let Some(secs) = std::env::var("HOSTPOOL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Set the trailing characters appended to resolved URLs
    #[must_use]
    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = trailing.into();
        self
    }

    /// Add a default header
    ///
    /// # Errors
    /// Returns error if the header name or value is invalid
    pub fn with_header<K, V>(mut self, key: K, value: V) -> Result<Self, ClientError>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::error::Error + Send + Sync + 'static,
        V::Error: std::error::Error + Send + Sync + 'static,
    {
        let key = key
            .try_into()
            .map_err(|e| ClientError::BuildError(format!("Invalid header name: {e}")))?;
        let value = value
            .try_into()
            .map_err(|e| ClientError::BuildError(format!("Invalid header value: {e}")))?;
        self.headers.insert(key, value);
        Ok(self)
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Set the total request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection establishment timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("trailing", &self.trailing)
            .field("headers", &self.headers)
            .field("bearer", &self.bearer.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new();
        assert_eq!(config.trailing, "");
        assert!(config.headers.is_empty());
        assert!(config.bearer.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new()
            .with_trailing("/")
            .with_bearer("secret")
            .with_timeout(Duration::from_secs(5))
            .with_header("x-api-version", "2")
            .unwrap();

        assert_eq!(config.trailing, "/");
        assert_eq!(config.bearer.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.headers.get("x-api-version").unwrap(), "2");
    }

    #[test]
    fn test_invalid_header() {
        let result = ClientConfig::new().with_header("bad header", "v");
        assert!(matches!(result, Err(ClientError::BuildError(_))));
    }

    #[test]
    fn test_debug_redacts_bearer() {
        let config = ClientConfig::new().with_bearer("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
