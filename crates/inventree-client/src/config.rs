//! Connection configuration for the InvenTree client
//!
//! A [`ClientConfig`] describes which server to talk to and how to
//! authenticate. It can be assembled in code or loaded from the
//! `INVENTREE_API_*` environment variables.

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::error::InvenTreeError;

/// Oldest server api version this client accepts
pub const MIN_SUPPORTED_API_VERSION: u32 = 206;

/// Default name under which a requested token is registered on the server
pub const DEFAULT_TOKEN_NAME: &str = "inventree-rs-client";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials used to authenticate against the server
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Login username
    pub username: Option<String>,
    /// Login password
    pub password: Option<String>,
    /// Existing API token (takes precedence over username/password)
    pub token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    /// True when username and password are both present
    pub fn has_basic(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

/// InvenTree connection descriptor
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host address as supplied, e.g. "http://inventree.server.com:8000"
    pub host: String,
    /// Authentication details
    pub credentials: Credentials,
    /// Name used when requesting a new token
    pub token_name: String,
    /// Request a token after basic auth succeeds, and use it afterwards
    pub use_token_auth: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Enforce strict HTTPS certificate checking
    pub strict: bool,
    /// Optional proxy URL applied to all requests
    pub proxy: Option<String>,
    /// Minimum server api version accepted at connect time
    pub min_api_version: u32,
}

impl ClientConfig {
    /// Create a configuration for the given host with default settings
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            credentials: Credentials::default(),
            token_name: DEFAULT_TOKEN_NAME.to_string(),
            use_token_auth: true,
            timeout: DEFAULT_TIMEOUT,
            strict: true,
            proxy: None,
            min_api_version: MIN_SUPPORTED_API_VERSION,
        }
    }

    /// Load configuration from `INVENTREE_API_*` environment variables
    ///
    /// `INVENTREE_API_HOST` is required. Username, password, token, token
    /// name and timeout (in seconds) are optional.
    pub fn from_env() -> Result<Self, InvenTreeError> {
        let host = env::var("INVENTREE_API_HOST").map_err(|_| {
            InvenTreeError::InvalidConfig(
                "INVENTREE_API_HOST environment variable is required".to_string(),
            )
        })?;

        let mut config = Self::new(host);
        config.credentials = Credentials {
            username: env::var("INVENTREE_API_USERNAME").ok(),
            password: env::var("INVENTREE_API_PASSWORD").ok(),
            token: env::var("INVENTREE_API_TOKEN").ok(),
        };

        if let Ok(name) = env::var("INVENTREE_API_TOKEN_NAME") {
            config.token_name = name;
        }

        if let Ok(timeout) = env::var("INVENTREE_API_TIMEOUT") {
            let secs: f64 = timeout.trim().parse().map_err(|_| {
                InvenTreeError::InvalidConfig(format!("Invalid INVENTREE_API_TIMEOUT value '{}'", timeout))
            })?;
            if !secs.is_finite() || secs <= 0.0 {
                return Err(InvenTreeError::InvalidConfig(format!(
                    "INVENTREE_API_TIMEOUT must be positive, got '{}'",
                    timeout
                )));
            }
            config.timeout = Duration::from_secs_f64(secs);
        }

        Ok(config)
    }

    /// Authenticate with username and password
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials.username = Some(username.into());
        self.credentials.password = Some(password.into());
        self
    }

    /// Authenticate with an existing token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials.token = Some(token.into());
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Keep basic auth for every request instead of requesting a token
    pub fn without_token_auth(mut self) -> Self {
        self.use_token_auth = false;
        self
    }

    /// Accept invalid TLS certificates (self-signed servers)
    pub fn insecure(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Route all requests through a proxy
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Override the minimum accepted server api version
    pub fn with_min_api_version(mut self, version: u32) -> Self {
        self.min_api_version = version;
        self
    }

    /// Validate the host and split it into `(base_url, api_url)`
    ///
    /// Both URLs end with a slash. A trailing `api` segment on the supplied
    /// host is tolerated and stripped.
    pub fn server_urls(&self) -> Result<(String, String), InvenTreeError> {
        normalize_host(&self.host)
    }
}

/// Validate a host address and derive the base and api URLs
pub fn normalize_host(host: &str) -> Result<(String, String), InvenTreeError> {
    let url = Url::parse(host.trim()).map_err(|e| {
        InvenTreeError::InvalidConfig(format!("Host '{}' is not a valid URL: {}", host, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(InvenTreeError::InvalidConfig(format!(
            "Host '{}' supplied without valid scheme",
            host
        )));
    }

    let hostname = match url.host_str() {
        Some(h) if !h.is_empty() => h,
        _ => {
            return Err(InvenTreeError::InvalidConfig(format!(
                "Host '{}' supplied without valid hostname",
                host
            )));
        }
    };

    let mut segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    if segments.last() == Some(&"api") {
        segments.pop();
    }

    let netloc = match url.port() {
        Some(port) => format!("{}:{}", hostname, port),
        None => hostname.to_string(),
    };

    let mut base_url = format!("{}://{}/", url.scheme(), netloc);
    if !segments.is_empty() {
        base_url.push_str(&segments.join("/"));
        base_url.push('/');
    }

    let api_url = format!("{}api/", base_url);
    Ok((base_url, api_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_host() {
        let (base, api) = normalize_host("http://inventree.local:8000").expect("valid host");
        assert_eq!(base, "http://inventree.local:8000/");
        assert_eq!(api, "http://inventree.local:8000/api/");
    }

    #[test]
    fn test_normalize_strips_trailing_api_segment() {
        let (base, api) = normalize_host("https://example.com/inventree/api/").expect("valid host");
        assert_eq!(base, "https://example.com/inventree/");
        assert_eq!(api, "https://example.com/inventree/api/");
    }

    #[test]
    fn test_normalize_rejects_missing_scheme() {
        let err = normalize_host("inventree.local").expect_err("scheme is required");
        assert!(matches!(err, InvenTreeError::InvalidConfig(_)));
    }

    #[test]
    fn test_normalize_rejects_unsupported_scheme() {
        let err = normalize_host("ftp://inventree.local").expect_err("only http(s)");
        assert!(matches!(err, InvenTreeError::InvalidConfig(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::new("http://localhost")
            .with_basic_auth("admin", "inventree")
            .with_timeout(Duration::from_secs(3));

        assert!(config.credentials.has_basic());
        assert!(config.use_token_auth);
        assert!(config.strict);
        assert_eq!(config.token_name, DEFAULT_TOKEN_NAME);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.min_api_version, MIN_SUPPORTED_API_VERSION);
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let config = ClientConfig::new("http://localhost")
            .with_basic_auth("admin", "hunter2")
            .with_token("abc123");
        let debug = format!("{:?}", config.credentials);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("abc123"));
    }
}
