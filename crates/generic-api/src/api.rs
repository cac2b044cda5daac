//! Authenticated JSON API façade

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{
    client::{shared_transport, ApiRequest, Transport},
    config::ApiConfig,
    credentials::{Authorize, BearerToken},
    error::{HttpError, Result},
    middleware::ReauthorizeMiddleware,
    options::{default_options, recursive_merge, RequestOptions},
};

/// Bearer-authenticated client for a single JSON API.
///
/// Every request carries `Authorization: Bearer <token>` and JSON
/// `Accept`/`Content-Type` headers unless the caller's options override them.
/// When an [`Authorize`] implementation is attached, a 401 response triggers
/// one token refresh and one replay of the request.
pub struct ApiClient {
    base_url: Url,
    token: BearerToken,
    transport: Arc<dyn Transport>,
    reauthorize: ReauthorizeMiddleware,
}

impl ApiClient {
    /// Create a client for `base_uri` with the default transport
    pub fn new(base_uri: &str) -> Result<Self> {
        Self::from_config(ApiConfig::new(base_uri))
    }

    /// Create a client from full configuration
    pub fn from_config(config: ApiConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let transport = shared_transport(config.http)?;
        let client = Self::build(base_url, transport);
        if let Some(token) = config.token {
            client.token.set(token);
        }
        Ok(client)
    }

    /// Create a client over a custom transport
    pub fn with_transport(base_uri: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = ApiConfig::new(base_uri).base_url()?;
        Ok(Self::build(base_url, transport))
    }

    fn build(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            token: BearerToken::default(),
            transport,
            reauthorize: ReauthorizeMiddleware::default(),
        }
    }

    /// Attach the hook used to refresh the token after a 401
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorize>) -> Self {
        self.reauthorize = ReauthorizeMiddleware::new(Some(authorizer));
        self
    }

    /// Share an existing credential holder
    pub fn with_token_holder(mut self, token: BearerToken) -> Self {
        self.token = token;
        self
    }

    /// Credential holder used for every request
    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    /// Replace the bearer token
    pub fn set_token(&self, token: impl Into<String>) {
        self.token.set(token);
    }

    /// Address endpoints are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a 401 will trigger re-authorization
    pub fn can_reauthorize(&self) -> bool {
        self.reauthorize.can_reauthorize()
    }

    /// Send a request and decode the JSON response.
    ///
    /// `method` is case-insensitive. `endpoint` is resolved against the base
    /// address the way a browser resolves a link. `options` are merged over
    /// the default auth and content headers.
    pub async fn request(
        &self,
        method: &str,
        endpoint: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let method = parse_method(method)?;
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| HttpError::InvalidUrl(format!("{endpoint}: {e}")))?;

        let caller = options.cloned().map(Value::Object);

        self.reauthorize
            .execute(&self.token, |attempt| {
                let request = ApiRequest {
                    method: method.clone(),
                    url: url.clone(),
                    options: recursive_merge(default_options(&self.token.get()), caller.as_ref()),
                };
                debug!(?attempt, "{} {}", request.method, request.url);
                async move {
                    let response = self.transport.send(request).await?;
                    decode_json(&response.body)
                }
            })
            .await
    }

    /// Send a request and deserialize the JSON response into `T`
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: &str,
        endpoint: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T> {
        let value = self.request(method, endpoint, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `GET` shorthand
    pub async fn get(&self, endpoint: &str, options: Option<&RequestOptions>) -> Result<Value> {
        self.request("GET", endpoint, options).await
    }

    /// `POST` shorthand
    pub async fn post(&self, endpoint: &str, options: Option<&RequestOptions>) -> Result<Value> {
        self.request("POST", endpoint, options).await
    }

    /// `PUT` shorthand
    pub async fn put(&self, endpoint: &str, options: Option<&RequestOptions>) -> Result<Value> {
        self.request("PUT", endpoint, options).await
    }

    /// `PATCH` shorthand
    pub async fn patch(&self, endpoint: &str, options: Option<&RequestOptions>) -> Result<Value> {
        self.request("PATCH", endpoint, options).await
    }

    /// `DELETE` shorthand
    pub async fn delete(&self, endpoint: &str, options: Option<&RequestOptions>) -> Result<Value> {
        self.request("DELETE", endpoint, options).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token)
            .field("reauthorize", &self.reauthorize)
            .finish()
    }
}

fn parse_method(method: &str) -> Result<Method> {
    let upper = method.trim().to_ascii_uppercase();
    Method::from_bytes(upper.as_bytes()).map_err(|_| HttpError::InvalidMethod(method.to_string()))
}

// Empty bodies (204, bare 200) decode to null
fn decode_json(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}
