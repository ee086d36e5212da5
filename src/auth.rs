//! Cached authentication tokens

use std::time::{Duration, Instant};

use http::HeaderValue;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::Client;
use crate::error::ClientError;

/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Fetches and caches a bearer token from a token endpoint
///
/// The endpoint is POSTed the configured JSON body (e.g. client credentials)
/// and must answer with an `access_token` field; an `expires_in` field in
/// seconds is honored when present. Concurrent callers share one fetch via
/// the internal lock.
///
/// # Examples
/// ```no_run
/// use hostpool::{Client, TokenCache, Result};
/// use serde_json::json;
///
/// # async fn example() -> Result<()> {
/// let endpoint = Client::new("https://auth.example.com/oauth/token")?;
/// let tokens = TokenCache::new(endpoint, json!({
///     "grant_type": "client_credentials",
///     "client_id": "id",
///     "client_secret": "secret",
/// }));
///
/// let header = tokens.header().await?;  // fetched once, cached after
/// # Ok(())
/// # }
/// ```
pub struct TokenCache {
    endpoint: Client,
    body: Value,
    state: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a token cache over a token endpoint client
    #[must_use]
    pub fn new(endpoint: Client, body: Value) -> Self {
        Self {
            endpoint,
            body,
            state: Mutex::new(None),
        }
    }

    /// Get the current token, fetching a fresh one if absent or expired
    ///
    /// # Errors
    /// Returns error if the fetch fails or the response has no `access_token`
    pub async fn token(&self) -> Result<String, ClientError> {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.value.clone());
            }
        }

        let response = self.endpoint.post("", &self.body).await?;
        let payload: Value = response.error_for_status().await?.json().await?;
        let value = payload
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::InvalidResponse("Token response missing access_token".into())
            })?
            .to_owned();
        let ttl = payload
            .get("expires_in")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_TTL, Duration::from_secs);

        debug!(ttl_secs = ttl.as_secs(), "Fetched auth token");

        *state = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + ttl.saturating_sub(EXPIRY_MARGIN),
        });
        Ok(value)
    }

    /// Get the current token as an `Authorization` header value
    ///
    /// # Errors
    /// Returns error if the fetch fails or the token is not a valid header
    pub async fn header(&self) -> Result<HeaderValue, ClientError> {
        let token = self.token().await?;
        HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ClientError::BuildError(format!("Invalid token for header: {e}")))
    }

    /// Drop the cached token so the next call fetches a fresh one
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
