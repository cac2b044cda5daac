//! API client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{HttpError, Result};

/// Environment variable overriding [`ApiConfig::base_uri`]
pub const ENV_BASE_URI: &str = "GENERIC_API_BASE_URI";
/// Environment variable overriding [`ApiConfig::token`]
pub const ENV_TOKEN: &str = "GENERIC_API_TOKEN";
/// Environment variable overriding [`HttpConfig::timeout`], in seconds
pub const ENV_TIMEOUT_SECS: &str = "GENERIC_API_TIMEOUT_SECS";

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// HTTP/HTTPS proxy URL
    #[serde(default)]
    pub proxy: Option<String>,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum redirects to follow (0 = no redirects)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            proxy: None,
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config for fast operations (5s timeout)
    pub fn fast() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    /// Create config for long operations (120s timeout)
    pub fn long() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set proxy URL
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set redirect limit
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

/// Client configuration: where to send requests and with which credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base address every endpoint is resolved against
    pub base_uri: String,

    /// Initial bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// Transport settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl ApiConfig {
    /// Create a config for the given base address
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            token: None,
            http: HttpConfig::default(),
        }
    }

    /// Set the initial bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set transport settings
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Parse a TOML document
    ///
    /// ```toml
    /// base_uri = "https://api.example.com/v1/"
    /// token = "secret"
    ///
    /// [http]
    /// user_agent = "my-app/1.0"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| HttpError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    /// Environment variables override any existing configuration
    pub fn load_from_env(&mut self) {
        if let Ok(base_uri) = std::env::var(ENV_BASE_URI) {
            debug!("Loading {} from environment: {}", ENV_BASE_URI, base_uri);
            self.base_uri = base_uri;
        }

        if let Ok(token) = std::env::var(ENV_TOKEN) {
            debug!("Loading {} from environment", ENV_TOKEN);
            self.token = Some(token);
        }

        if let Ok(timeout_str) = std::env::var(ENV_TIMEOUT_SECS) {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                debug!("Loading {} from environment: {}", ENV_TIMEOUT_SECS, timeout);
                self.http.timeout = Duration::from_secs(timeout);
            } else {
                warn!("Invalid {} value: {}", ENV_TIMEOUT_SECS, timeout_str);
            }
        }
    }

    /// Parse and check the base address
    pub fn base_url(&self) -> Result<Url> {
        if self.base_uri.trim().is_empty() {
            return Err(HttpError::Config("base_uri must not be empty".to_string()));
        }
        Url::parse(&self.base_uri).map_err(|e| HttpError::InvalidUrl(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.base_url().map(|_| ())
    }
}

// Default value functions for serde
fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    format!("generic-api/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_redirects() -> usize {
    10
}
