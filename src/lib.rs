//! hostpool - ergonomic HTTP clients with composable base paths
//!
//! A thin layer over [reqwest] providing base-URL-scoped clients, response
//! post-processing, and a load-balanced multi-host proxy client. Everything
//! network-level (pooling, TLS, redirects, timeouts) is reqwest's; this crate
//! only adds the ergonomics around it.
//!
//! # Features
//!
//! - **Path composition**: derive a client scoped to a sub-resource with
//!   [`Client::path`]; the transport and its connection pool are shared
//! - **Content dispatch**: [`Resource`] raises on error statuses and returns
//!   JSON, text or bytes according to the response content type
//! - **Streaming iteration**: line-by-line and JSON-per-line iteration over
//!   streamed bodies, plus downloads straight to a writer
//! - **Load balancing**: [`Proxy`] routes each request to the host with the
//!   fewest errors, then failures, then in-flight connections, breaking ties
//!   uniformly at random
//! - **Blocking API**: synchronous wrappers for build scripts and other
//!   non-async contexts
//!
//! # Examples
//!
//! ## Scoped requests
//! ```no_run
//! use hostpool::{Client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let api = Client::new("https://api.example.com/v1")?;
//!     let users = api.path("users")?;
//!
//!     let response = users.get("42").await?;
//!     let profile: serde_json::Value = response.json().await?;
//!
//!     println!("{profile}");
//!     Ok(())
//! }
//! ```
//!
//! ## Load-balanced proxying
//! ```no_run
//! use hostpool::{Proxy, Result};
//!
//! # async fn example() -> Result<()> {
//! let proxy = Proxy::new(["http://replica1/", "http://replica2/"])?;
//!
//! // failures and in-flight load steer subsequent requests away
//! let response = proxy.get("search?q=rust").await?;
//! for host in proxy.hosts() {
//!     println!("{host}: {:?}", proxy.stats(host.as_str()));
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod blocking;
pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod lines;
pub mod proxy;
pub mod remote;
pub mod request;
pub mod resource;
pub mod response;
pub mod transport;

// Re-export main types for convenience
pub use auth::TokenCache;
pub use body::Body;
pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use lines::{JsonLines, Lines};
pub use proxy::{CounterSnapshot, HostStats, LeastLoaded, Priority, Proxy, RoutingPolicy};
pub use remote::{Graph, Remote};
pub use request::{Request, RequestBuilder};
pub use resource::Resource;
pub use response::{Content, Response};
pub use transport::{ReqwestTransport, Transport};

// Re-export http types for convenience
pub use http::{Method, StatusCode};
