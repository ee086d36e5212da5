//! Blocking API
//!
//! Synchronous wrappers over the async clients for build scripts and other
//! non-async contexts. Host selection and counter updates are the same code
//! as the async path; only the final await is bridged to a runtime.

use http::Method;
use serde::Serialize;

use crate::client::Client;
use crate::error::ClientError;
use crate::proxy::Proxy;
use crate::request::Request;
use crate::response::Response;

fn run_blocking<F, T>(future: F) -> Result<T, ClientError>
where
    F: std::future::Future<Output = Result<T, ClientError>>,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle.block_on(future),
        Err(_) => {
            let runtime = tokio::runtime::Runtime::new()
                .map_err(|e| ClientError::Config(format!("Failed to create tokio runtime: {e}")))?;
            runtime.block_on(future)
        }
    }
}

/// Run an exchange and buffer the body before the runtime can go away
///
/// The temporary runtime is dropped when `run_blocking` returns, taking the
/// connection with it, so a streaming body must be consumed inside it.
async fn send_buffered<F>(future: F) -> Result<Response, ClientError>
where
    F: std::future::Future<Output = Result<Response, ClientError>>,
{
    future.await?.buffer().await
}

/// Blocking API over a [`Client`]
///
/// # Examples
/// ```no_run
/// use hostpool::{Client, Result};
///
/// fn main() -> Result<()> {
///     let client = Client::new("https://api.example.com/")?;
///     let response = client.blocking().get("status")?;
///     let body = response.text_blocking()?;
///     println!("{body}");
///     Ok(())
/// }
/// ```
pub struct BlockingClient<'a> {
    inner: &'a Client,
}

impl<'a> BlockingClient<'a> {
    pub(crate) const fn new(inner: &'a Client) -> Self {
        Self { inner }
    }

    /// Send a request synchronously
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn send(&self, request: Request) -> Result<Response, ClientError> {
        run_blocking(send_buffered(self.inner.send(request)))
    }

    /// Send a request with a method and relative path synchronously
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn request(&self, method: Method, path: &str) -> Result<Response, ClientError> {
        run_blocking(send_buffered(self.inner.request(method, path)))
    }

    /// GET request with optional path
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::GET, path)
    }

    /// POST request with a JSON body
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn post<T: Serialize>(&self, path: &str, json: &T) -> Result<Response, ClientError> {
        run_blocking(send_buffered(self.inner.post(path, json)))
    }

    /// PUT request with a JSON body
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn put<T: Serialize>(&self, path: &str, json: &T) -> Result<Response, ClientError> {
        run_blocking(send_buffered(self.inner.put(path, json)))
    }

    /// DELETE request with optional path
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::DELETE, path)
    }
}

/// Blocking API over a [`Proxy`]
pub struct BlockingProxy<'a> {
    inner: &'a Proxy,
}

impl<'a> BlockingProxy<'a> {
    pub(crate) const fn new(inner: &'a Proxy) -> Self {
        Self { inner }
    }

    /// Send a request synchronously through the proxy
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn send(&self, request: Request) -> Result<Response, ClientError> {
        run_blocking(send_buffered(self.inner.send(request)))
    }

    /// Send a request with a method and relative path synchronously
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn request(&self, method: Method, path: &str) -> Result<Response, ClientError> {
        run_blocking(send_buffered(self.inner.request(method, path)))
    }

    /// GET request with optional path
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::GET, path)
    }

    /// POST request with a JSON body
    ///
    /// # Errors
    /// Returns error if the request fails or runtime creation fails
    pub fn post<T: Serialize>(&self, path: &str, json: &T) -> Result<Response, ClientError> {
        run_blocking(send_buffered(self.inner.post(path, json)))
    }
}

impl Response {
    /// Consume the response and return the body as bytes (blocking)
    ///
    /// # Errors
    /// Returns error if stream reading or runtime creation fails
    pub fn bytes_blocking(self) -> Result<bytes::Bytes, ClientError> {
        run_blocking(self.bytes())
    }

    /// Consume the response and return the body as text (blocking)
    ///
    /// # Errors
    /// Returns error if stream reading fails, the body is not valid UTF-8,
    /// or runtime creation fails
    pub fn text_blocking(self) -> Result<String, ClientError> {
        run_blocking(self.text())
    }

    /// Consume the response and deserialize the body as JSON (blocking)
    ///
    /// # Errors
    /// Returns error if stream reading fails, the body is not valid JSON,
    /// or runtime creation fails
    pub fn json_blocking<T: serde::de::DeserializeOwned>(self) -> Result<T, ClientError> {
        run_blocking(self.json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use serde_json::Value;

    #[test]
    fn test_bytes_blocking_outside_runtime() {
        let response = Response::from_bytes(StatusCode::OK, HeaderMap::new(), "payload");
        assert_eq!(response.bytes_blocking().unwrap(), Bytes::from("payload"));
    }

    #[test]
    fn test_json_blocking_outside_runtime() {
        let response = Response::from_bytes(StatusCode::OK, HeaderMap::new(), r#"{"n":1}"#);
        let value: Value = response.json_blocking().unwrap();
        assert_eq!(value, serde_json::json!({"n": 1}));
    }
}
