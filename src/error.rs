//! Error types for hostpool clients

use bytes::Bytes;
use http::StatusCode;
use std::io;

/// Error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Request build error
    ///
    /// Returned when request construction fails (invalid header values,
    /// unjoinable paths, JSON serialization, etc.)
    #[error("Request build error: {0}")]
    BuildError(String),

    /// Configuration error
    ///
    /// Returned when client configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection error
    ///
    /// Returned when the network connection to a host fails
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout
    ///
    /// Returned when a request exceeds its configured timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid response
    ///
    /// Returned when a response body cannot be parsed (invalid JSON, UTF-8, etc.)
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Underlying HTTP client error
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// HTTP error response
    ///
    /// Only raised by the content-processing layers ([`Resource`](crate::Resource),
    /// [`Remote`](crate::Remote)); plain clients and proxies return 4xx/5xx
    /// responses as-is.
    #[error("HTTP error: {status}")]
    Status {
        /// HTTP status code
        status: StatusCode,

        /// Response body (may contain error details)
        body: Bytes,
    },

    /// Remote call error
    ///
    /// Returned when an RPC or GraphQL response reports application-level errors
    #[error("Remote call error: {0}")]
    Remote(String),

    /// No host available for routing
    ///
    /// Returned by [`Proxy::choose`](crate::Proxy::choose) when the routing
    /// policy has eliminated every configured host.
    #[error("No available host: all hosts eliminated by routing policy")]
    NoAvailableHost,
}

impl ClientError {
    /// Check if error is a connection error
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if error is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if error is a transport-level failure
    ///
    /// Transport errors mean the network exchange could not complete at all,
    /// as opposed to receiving a response with an error status. The proxy
    /// counts exactly these in its per-host `errors` counter.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Io(_) | Self::Reqwest(_)
        )
    }

    /// Check if error is an HTTP status error
    #[must_use]
    pub const fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Get HTTP status code if this is a status error
    #[must_use]
    pub const fn http_status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_predicate() {
        assert!(ClientError::Connection("refused".into()).is_transport());
        assert!(ClientError::Timeout("30s".into()).is_transport());
        assert!(ClientError::Io(io::Error::other("reset")).is_transport());
        assert!(!ClientError::NoAvailableHost.is_transport());
        assert!(
            !ClientError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: Bytes::new(),
            }
            .is_transport()
        );
    }

    #[test]
    fn test_http_status() {
        let err = ClientError::Status {
            status: StatusCode::NOT_FOUND,
            body: Bytes::from("missing"),
        };
        assert!(err.is_status());
        assert_eq!(err.http_status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(ClientError::NoAvailableHost.http_status(), None);
    }

    #[test]
    fn test_display() {
        let err = ClientError::NoAvailableHost;
        assert!(err.to_string().contains("all hosts eliminated"));
    }
}
