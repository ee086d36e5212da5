//! JSON RPC and GraphQL convenience clients

use serde_json::{Map, Value, json};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// A client which defaults to POSTs with JSON bodies, i.e. RPC
///
/// Carries a default body merged into every call; call-site fields override
/// defaults on key collision.
#[derive(Debug, Clone)]
pub struct Remote {
    client: Client,
    defaults: Map<String, Value>,
}

impl Remote {
    /// Create a remote with the default configuration
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn new(url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::new(url)?,
            defaults: Map::new(),
        })
    }

    /// Create a remote from a configuration
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn with_config(url: &str, config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::with_config(url, config)?,
            defaults: Map::new(),
        })
    }

    /// Set the default body merged into every call
    #[must_use]
    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// The underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Derive a remote scoped to an appended path, keeping the default body
    ///
    /// # Errors
    /// Returns error if the segment cannot be joined onto the base URL
    pub fn path(&self, segment: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: self.client.path(segment)?,
            defaults: self.defaults.clone(),
        })
    }

    /// POST the merged JSON body and return the parsed response
    ///
    /// # Errors
    /// Returns error on transport-level failure, an error status response,
    /// or an unparsable body
    pub async fn call(&self, path: &str, body: Map<String, Value>) -> Result<Value, ClientError> {
        let mut merged = self.defaults.clone();
        merged.extend(body);
        let response = self.client.post(path, &Value::Object(merged)).await?;
        response.error_for_status().await?.json().await
    }
}

/// A GraphQL client over a [`Remote`]
///
/// Posts `{query, variables}` documents and returns the `data` field;
/// a non-empty `errors` array becomes [`ClientError::Remote`].
#[derive(Debug, Clone)]
pub struct Graph {
    remote: Remote,
}

impl Graph {
    /// Create a graph client with the default configuration
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn new(url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            remote: Remote::new(url)?,
        })
    }

    /// Create a graph client from a configuration
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn with_config(url: &str, config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            remote: Remote::with_config(url, config)?,
        })
    }

    /// Execute a query with variables and return the `data` field
    ///
    /// # Errors
    /// Returns [`ClientError::Remote`] if the response reports errors
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value, ClientError> {
        let mut body = Map::new();
        body.insert("query".to_owned(), json!(query));
        body.insert("variables".to_owned(), variables);
        let mut result = self.remote.call("", body).await?;
        if let Some(errors) = result.get("errors").filter(|e| {
            e.as_array().is_some_and(|a| !a.is_empty())
        }) {
            return Err(ClientError::Remote(errors.to_string()));
        }
        Ok(result
            .as_object_mut()
            .and_then(|obj| obj.remove("data"))
            .unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_merge_is_overridable() {
        let mut defaults = Map::new();
        defaults.insert("jsonrpc".into(), json!("2.0"));
        defaults.insert("id".into(), json!(1));

        let mut call_body = Map::new();
        call_body.insert("id".into(), json!(7));

        let mut merged = defaults.clone();
        merged.extend(call_body);
        assert_eq!(merged["jsonrpc"], json!("2.0"));
        assert_eq!(merged["id"], json!(7));
    }
}
