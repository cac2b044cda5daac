//! HTTP transport implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, RequestBuilder, StatusCode,
};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{
    config::HttpConfig,
    error::{HttpError, Result},
    options::{self, scalar_to_string, RequestOptions},
};

/// A fully resolved request, ready for the wire
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub options: RequestOptions,
}

/// Successful response as received from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Mockable transport trait
///
/// Implementations must report non-2xx responses as
/// [`HttpError::HttpStatus`] so callers can react to the status code.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a single request
    async fn send(&self, request: ApiRequest) -> Result<RawResponse>;
}

/// Production transport backed by reqwest
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new HTTP client with configuration
    pub fn new(config: HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(if config.max_redirects > 0 {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            });

        // Configure proxy if provided
        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HttpError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))?;

        Ok(Self { inner, config })
    }

    /// Create HTTP client with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Build the reqwest request without sending it
    pub fn prepare(&self, request: ApiRequest) -> Result<RequestBuilder> {
        let builder = self.inner.request(request.method, request.url);
        apply_options(builder, &request.options)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        debug!("HTTP {}: {}", request.method, request.url);

        let response = self
            .prepare(request)?
            .send()
            .await
            .map_err(HttpError::RequestFailed)?;

        // Check for HTTP error status
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::HttpStatus {
                status,
                message: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string()),
            });
        }

        let body = response.text().await.map_err(HttpError::RequestFailed)?;
        Ok(RawResponse { status, body })
    }
}

/// Create a shared transport (Arc-wrapped for cloning)
pub fn shared_transport(config: HttpConfig) -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(HttpClient::new(config)?))
}

/// Translate an options tree onto a request builder.
///
/// Body options are applied first so explicit headers always win.
fn apply_options(mut builder: RequestBuilder, opts: &RequestOptions) -> Result<RequestBuilder> {
    for (key, value) in opts {
        builder = match key.as_str() {
            options::HEADERS => builder,
            options::JSON => builder.json(value),
            options::BODY => match value {
                Value::String(body) => builder.body(body.clone()),
                Value::Null => builder,
                _ => return Err(invalid_option(key, "expected a string")),
            },
            options::FORM_PARAMS => builder.form(&pairs(key, value)?),
            options::QUERY => match value {
                Value::String(query) => {
                    let parsed: Vec<(String, String)> =
                        url::form_urlencoded::parse(query.as_bytes())
                            .into_owned()
                            .collect();
                    builder.query(&parsed)
                }
                _ => builder.query(&pairs(key, value)?),
            },
            options::TIMEOUT => builder.timeout(timeout(key, value)?),
            other => {
                debug!("Ignoring unsupported request option `{}`", other);
                builder
            }
        };
    }

    if let Some(headers) = opts.get(options::HEADERS) {
        builder = builder.headers(header_map(headers)?);
    }

    Ok(builder)
}

fn header_map(headers: &Value) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    let entries = match headers {
        Value::Object(entries) => entries,
        Value::Null => return Ok(map),
        _ => return Err(invalid_option(options::HEADERS, "expected a mapping")),
    };

    for (name, value) in entries {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            HttpError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;

        let values: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Null => continue,
            other => vec![other],
        };

        for item in values {
            let text = scalar_to_string(item).ok_or_else(|| HttpError::InvalidHeader {
                name: name.clone(),
                reason: "header values must be scalars".to_string(),
            })?;
            let header_value =
                HeaderValue::from_str(&text).map_err(|e| HttpError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            map.append(header_name.clone(), header_value);
        }
    }

    Ok(map)
}

fn pairs(key: &str, value: &Value) -> Result<Vec<(String, String)>> {
    let entries = match value {
        Value::Object(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        _ => return Err(invalid_option(key, "expected a mapping")),
    };

    entries
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            scalar_to_string(v)
                .map(|v| (k.clone(), v))
                .ok_or_else(|| invalid_option(key, &format!("`{k}` must be a scalar")))
        })
        .collect()
}

fn timeout(key: &str, value: &Value) -> Result<Duration> {
    value
        .as_f64()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| invalid_option(key, "expected a non-negative number of seconds"))
}

fn invalid_option(key: &str, reason: &str) -> HttpError {
    HttpError::InvalidOption {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn request(method: Method, url: &str, options: Value) -> ApiRequest {
        ApiRequest {
            method,
            url: Url::parse(url).unwrap(),
            options: match options {
                Value::Object(map) => map,
                _ => RequestOptions::new(),
            },
        }
    }

    fn build(options: Value) -> Result<reqwest::Request> {
        let client = HttpClient::with_defaults().unwrap();
        let builder = client.prepare(request(Method::POST, "http://localhost/items", options))?;
        Ok(builder.build().unwrap())
    }

    #[test]
    fn test_client_creation_with_defaults() {
        let client = HttpClient::with_defaults();
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_creation_with_config() {
        let config = HttpConfig {
            timeout: Duration::from_secs(10),
            ..Default::default()
        };

        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_client_with_proxy() {
        let config = HttpConfig::default().with_proxy("http://proxy.example.com:8080");
        assert!(HttpClient::new(config).is_ok());
    }

    #[test]
    fn test_invalid_proxy() {
        let config = HttpConfig::default().with_proxy("invalid-proxy");

        let result = HttpClient::new(config);
        assert!(matches!(result, Err(HttpError::InvalidProxy(_))));
    }

    #[test]
    fn test_headers_applied() {
        let req = build(json!({
            "headers": {"X-Single": "a", "X-Multi": ["b", 2], "X-Skip": null}
        }))
        .unwrap();

        assert_eq!(req.headers()["x-single"], "a");
        let multi: Vec<_> = req.headers().get_all("x-multi").iter().collect();
        assert_eq!(multi, vec!["b", "2"]);
        assert!(req.headers().get("x-skip").is_none());
    }

    #[test]
    fn test_explicit_content_type_beats_body_default() {
        let req = build(json!({
            "json": {"a": 1},
            "headers": {"Content-Type": "application/vnd.api+json"}
        }))
        .unwrap();

        assert_eq!(req.headers()["content-type"], "application/vnd.api+json");
        assert_eq!(req.body().and_then(|b| b.as_bytes()), Some(&br#"{"a":1}"#[..]));
    }

    #[test]
    fn test_query_from_mapping_and_string() {
        let req = build(json!({"query": {"page": 2, "q": "a b"}})).unwrap();
        assert_eq!(req.url().query(), Some("page=2&q=a+b"));

        let req = build(json!({"query": "page=3"})).unwrap();
        assert_eq!(req.url().query(), Some("page=3"));
    }

    #[test]
    fn test_raw_body_and_form_params() {
        let req = build(json!({"body": "plain"})).unwrap();
        assert_eq!(req.body().and_then(|b| b.as_bytes()), Some(&b"plain"[..]));

        let req = build(json!({"form_params": {"a": 1, "name": "x"}})).unwrap();
        assert_eq!(req.body().and_then(|b| b.as_bytes()), Some(&b"a=1&name=x"[..]));
    }

    #[test]
    fn test_timeout_option() {
        let req = build(json!({"timeout": 1.5})).unwrap();
        assert_eq!(req.timeout(), Some(&Duration::from_millis(1500)));
    }

    #[test]
    fn test_malformed_options_rejected() {
        assert!(matches!(
            build(json!({"headers": "nope"})),
            Err(HttpError::InvalidOption { .. })
        ));
        assert!(matches!(
            build(json!({"headers": {"X-Obj": {"a": 1}}})),
            Err(HttpError::InvalidHeader { .. })
        ));
        assert!(matches!(
            build(json!({"headers": {"bad header": "a"}})),
            Err(HttpError::InvalidHeader { .. })
        ));
        assert!(matches!(
            build(json!({"body": 5})),
            Err(HttpError::InvalidOption { .. })
        ));
        assert!(matches!(
            build(json!({"timeout": -1})),
            Err(HttpError::InvalidOption { .. })
        ));
        assert!(matches!(
            build(json!({"timeout": 1e20})),
            Err(HttpError::InvalidOption { .. })
        ));
        assert!(matches!(
            build(json!({"form_params": {"nested": [1]}})),
            Err(HttpError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_unknown_options_ignored() {
        assert!(build(json!({"allow_redirects": false})).is_ok());
    }

    #[tokio::test]
    async fn test_send_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(header("X-Test", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::with_defaults().unwrap();
        let response = client
            .send(request(
                Method::GET,
                &format!("{}/items", server.uri()),
                json!({"headers": {"X-Test": "1"}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_send_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = HttpClient::with_defaults().unwrap();
        let result = client
            .send(request(Method::DELETE, &server.uri(), json!({})))
            .await;

        match result {
            Err(HttpError::HttpStatus { status, message }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(message, "down");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_shared_transport_creation() {
        assert!(shared_transport(HttpConfig::default()).is_ok());
    }
}
