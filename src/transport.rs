//! Transport seam between the client surface and the network
//!
//! Host selection and counter bookkeeping are written once against the
//! [`Transport`] trait; the reqwest-backed implementation is the only one the
//! crate ships, but tests (and embedders) can substitute their own.

use async_trait::async_trait;
use futures::StreamExt;
use http::HeaderValue;
use tracing::{debug, trace};
use url::Url;

use crate::body::Body;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::request::Request;
use crate::response::Response;

/// Issues a single HTTP exchange against an absolute URL
///
/// Implementations must return a [`Response`] for every completed exchange,
/// whatever its status code, and an error only for transport-level failures.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request to the given absolute URL
    async fn send(&self, url: Url, request: Request) -> Result<Response, ClientError>;
}

/// Transport backed by a shared `reqwest::Client`
///
/// Connection pooling, TLS, redirects and timeouts are all reqwest's;
/// this adapter only maps between the crate's request/response types and
/// reqwest's, and classifies reqwest errors into the crate taxonomy.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport from a client configuration
    ///
    /// Default headers and the bearer token become reqwest default headers,
    /// applied to every request issued through this transport.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be constructed
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut headers = config.headers.clone();
        if let Some(token) = &config.bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ClientError::Config(format!("Invalid bearer token: {e}")))?;
            headers.insert(http::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .user_agent(concat!("hostpool/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {e}")))?;

        debug!(
            timeout_secs = config.timeout.as_secs(),
            trailing = %config.trailing,
            "Created reqwest transport"
        );

        Ok(Self { http })
    }

    /// Create a transport around an existing `reqwest::Client`
    #[must_use]
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: Url, request: Request) -> Result<Response, ClientError> {
        trace!(url = %url, method = %request.method(), "Sending request");

        let mut req_builder = self.http.request(request.method().clone(), url.clone());

        for (name, value) in request.headers() {
            req_builder = req_builder.header(name, value);
        }
        if !request.query().is_empty() {
            req_builder = req_builder.query(request.query());
        }
        if let Some(timeout) = request.timeout() {
            req_builder = req_builder.timeout(timeout);
        }
        match request.into_body() {
            Body::Empty => {}
            Body::Bytes(b) => {
                req_builder = req_builder.body(b);
            }
        }

        let resp = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(format!("Request to {url} timed out"))
            } else if e.is_connect() {
                ClientError::Connection(format!("Connection to {url} failed: {e}"))
            } else {
                ClientError::from(e)
            }
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();

        trace!(status = %status, "Received response");

        // Hand back a streaming body; the consumer decides whether to buffer.
        let stream = resp.bytes_stream().map(|result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout("Stream read timeout".into())
                } else {
                    ClientError::Io(std::io::Error::other(e))
                }
            })
        });

        Ok(Response::from_stream(status, headers, Box::pin(stream)))
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish()
    }
}
