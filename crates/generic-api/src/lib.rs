//! Generic bearer-token JSON API client
//!
//! Wraps reqwest to talk to any JSON API that authenticates with a bearer
//! token.
//!
//! ## Features
//!
//! - **Default headers**: `Authorization: Bearer <token>` plus JSON `Accept` and `Content-Type`
//! - **Option trees**: per-request options deep-merged over the defaults
//! - **Re-authorization**: one token refresh and one retry on 401 via [`Authorize`]
//! - **Trait-based transport**: mockable via [`Transport`]
//!
//! ```no_run
//! use generic_api::ApiClient;
//!
//! # async fn run() -> generic_api::Result<()> {
//! let api = ApiClient::new("https://api.example.com/v1/")?;
//! api.set_token("secret");
//! let user = api.get("users/me", None).await?;
//! println!("{user}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod middleware;
pub mod options;

pub use api::ApiClient;
pub use client::{shared_transport, ApiRequest, HttpClient, RawResponse, Transport};
pub use config::{ApiConfig, HttpConfig};
pub use credentials::{Authorize, BearerToken};
pub use error::{HttpError, Result};
pub use middleware::{Attempt, ReauthorizeMiddleware};
pub use options::{default_options, recursive_merge, RequestOptions};

/// Re-export commonly used types
pub use reqwest::{header, Method, StatusCode};
pub use serde_json::{json, Value};
