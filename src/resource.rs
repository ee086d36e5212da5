//! JSON-oriented resource client
//!
//! Wraps a [`Client`] with response post-processing: error statuses become
//! [`ClientError::Status`], bodies are dispatched by content type, and
//! streamed bodies can be iterated line by line or downloaded to a writer.

use http::Method;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use futures::StreamExt;

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::lines::{JsonLines, Lines};
use crate::request::Request;
use crate::response::{Content, Response};

/// A client which raises on error statuses and returns processed content
///
/// # Examples
/// ```no_run
/// use hostpool::{Resource, Result};
///
/// # async fn example() -> Result<()> {
/// let api = Resource::new("https://api.example.com/v1")?;
/// let user = api.get("users/42").await?;
/// println!("{:?}", user.as_json());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Resource {
    client: Client,
}

impl Resource {
    /// Create a resource with the default configuration
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn new(url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::new(url)?,
        })
    }

    /// Create a resource from a configuration
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn with_config(url: &str, config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::with_config(url, config)?,
        })
    }

    /// The underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the resource and return the underlying client
    pub fn into_client(self) -> Client {
        self.client
    }

    /// Derive a resource scoped to an appended path
    ///
    /// # Errors
    /// Returns error if the segment cannot be joined onto the base URL
    pub fn path(&self, segment: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: self.client.path(segment)?,
        })
    }

    async fn checked(&self, request: Request) -> Result<Response, ClientError> {
        self.client.send(request).await?.error_for_status().await
    }

    /// Send a request and return the processed content
    ///
    /// # Errors
    /// Returns error on transport-level failure or an error status response
    pub async fn request(&self, method: Method, path: &str) -> Result<Content, ClientError> {
        self.checked(Request::new(method, path))
            .await?
            .content()
            .await
    }

    /// GET request returning processed content
    ///
    /// # Errors
    /// Returns error on transport-level failure or an error status response
    pub async fn get(&self, path: &str) -> Result<Content, ClientError> {
        self.request(Method::GET, path).await
    }

    /// GET request with query parameters, returning processed content
    ///
    /// # Errors
    /// Returns error on transport-level failure or an error status response
    pub async fn call(&self, path: &str, params: &[(&str, &str)]) -> Result<Content, ClientError> {
        let mut builder = Request::builder().method(Method::GET).path(path);
        for (key, value) in params {
            builder = builder.query(*key, *value);
        }
        self.checked(builder.build()).await?.content().await
    }

    /// PATCH request with a JSON body, returning processed content
    ///
    /// # Errors
    /// Returns error on transport-level failure or an error status response
    pub async fn update<T: Serialize>(&self, path: &str, json: &T) -> Result<Content, ClientError> {
        let request = Request::builder()
            .method(Method::PATCH)
            .path(path)
            .json(json)?
            .build();
        self.checked(request).await?.content().await
    }

    /// POST request with a JSON body, returning the `Location` header
    ///
    /// # Errors
    /// Returns error on transport-level failure or an error status response
    pub async fn create<T: Serialize>(
        &self,
        path: &str,
        json: &T,
    ) -> Result<Option<String>, ClientError> {
        let request = Request::builder()
            .method(Method::POST)
            .path(path)
            .json(json)?
            .build();
        let response = self.checked(request).await?;
        Ok(response
            .headers()
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned))
    }

    /// DELETE request returning processed content
    ///
    /// # Errors
    /// Returns error on transport-level failure or an error status response
    pub async fn delete(&self, path: &str) -> Result<Content, ClientError> {
        self.request(Method::DELETE, path).await
    }

    /// Check whether an endpoint exists according to a HEAD request
    ///
    /// Any response with a status below 400 counts as existing; transport
    /// errors propagate.
    ///
    /// # Errors
    /// Returns error on transport-level failure
    pub async fn exists(&self, path: &str) -> Result<bool, ClientError> {
        let response = self.client.head(path).await?;
        Ok(response.status().as_u16() < 400)
    }

    /// Iterate lines from a streamed GET request
    ///
    /// # Errors
    /// Returns error on transport-level failure or an error status response
    pub async fn iter_lines(&self, path: &str) -> Result<Lines, ClientError> {
        Ok(self.checked(Request::new(Method::GET, path)).await?.lines())
    }

    /// Iterate newline-delimited JSON values from a streamed GET request
    ///
    /// # Errors
    /// Returns error on transport-level failure or an error status response
    pub async fn iter_json(&self, path: &str) -> Result<JsonLines, ClientError> {
        Ok(self
            .checked(Request::new(Method::GET, path))
            .await?
            .json_lines())
    }

    /// Stream a GET response body into a writer, returning the byte count
    ///
    /// # Errors
    /// Returns error on transport-level failure, an error status response,
    /// or a write failure
    pub async fn download<W>(&self, path: &str, writer: &mut W) -> Result<u64, ClientError>
    where
        W: AsyncWrite + Unpin,
    {
        let response = self.checked(Request::new(Method::GET, path)).await?;
        let mut stream = response.into_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

impl From<Client> for Resource {
    fn from(client: Client) -> Self {
        Self { client }
    }
}
