//! Response type with buffered and streaming bodies

use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::stream::{Stream, StreamExt};
use http::{HeaderMap, StatusCode, header};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::lines::{JsonLines, Lines};

/// Boxed byte stream
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

// ===========================================================================
// Response Types
// ===========================================================================

/// Internal response body representation
pub enum ResponseBody {
    /// Fully buffered body
    Buffered(Bytes),
    /// Streaming body
    Streaming(BoxStream<'static, Result<Bytes, ClientError>>),
}

/// HTTP response
///
/// Returned by clients and proxies for every completed exchange, regardless of
/// status code; status handling is the caller's responsibility unless the
/// content-processing layers are used.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

/// Response content dispatched by content type
///
/// Produced by [`Response::content`]: `application/json` bodies parse to
/// [`Content::Json`], `text/*` bodies to [`Content::Text`], anything else
/// stays raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Parsed JSON body
    Json(serde_json::Value),
    /// Decoded text body
    Text(String),
    /// Raw body
    Bytes(Bytes),
}

impl Content {
    /// Get the JSON value if this is JSON content
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Content::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Get the text if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the raw bytes if this is binary content
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Content::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl Response {
    /// Create a response from a streaming body
    pub fn from_stream(
        status: StatusCode,
        headers: HeaderMap,
        stream: BoxStream<'static, Result<Bytes, ClientError>>,
    ) -> Self {
        Self {
            status,
            headers,
            body: ResponseBody::Streaming(stream),
        }
    }

    /// Create a response from buffered bytes
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, bytes: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: ResponseBody::Buffered(bytes.into()),
        }
    }

    /// Get response status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the content type, without parameters such as charset
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim())
    }

    /// Check if the status is a success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Return the response, or a [`ClientError::Status`] for 4xx/5xx statuses
    ///
    /// The error buffers the body so callers can inspect error details.
    pub async fn error_for_status(self) -> Result<Self, ClientError> {
        if self.status.is_client_error() || self.status.is_server_error() {
            let status = self.status;
            let body = self.bytes().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        Ok(self)
    }

    /// Buffer the body in place, keeping status and headers
    ///
    /// A buffered response no longer depends on the connection or the runtime
    /// that produced it.
    pub async fn buffer(self) -> Result<Self, ClientError> {
        let status = self.status;
        let headers = self.headers.clone();
        let bytes = self.bytes().await?;
        Ok(Self::from_bytes(status, headers, bytes))
    }

    /// Buffer the entire response body
    pub async fn bytes(self) -> Result<Bytes, ClientError> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Parse the response body as JSON
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Parse the response body as text
    pub async fn text(self) -> Result<String, ClientError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Process the body according to the response content type
    pub async fn content(self) -> Result<Content, ClientError> {
        enum Kind {
            Json,
            Text,
            Other,
        }
        let kind = match self.content_type() {
            Some(ct) if ct.starts_with("application/json") => Kind::Json,
            Some(ct) if ct.starts_with("text/") => Kind::Text,
            _ => Kind::Other,
        };
        match kind {
            Kind::Json => Ok(Content::Json(self.json().await?)),
            Kind::Text => Ok(Content::Text(self.text().await?)),
            Kind::Other => Ok(Content::Bytes(self.bytes().await?)),
        }
    }

    /// Consume the response as a byte stream
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, ClientError>> {
        match self.body {
            ResponseBody::Buffered(bytes) => {
                Box::pin(futures::stream::once(async move { Ok(bytes) }))
            }
            ResponseBody::Streaming(stream) => stream,
        }
    }

    /// Consume the response as a stream of lines
    pub fn lines(self) -> Lines {
        Lines::new(self.into_stream())
    }

    /// Consume the response as a stream of newline-delimited JSON values
    pub fn json_lines(self) -> JsonLines {
        JsonLines::new(self.lines())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish()
    }
}

// ===========================================================================
// Unit Tests
// ===========================================================================
