//! Network transport used by the caching strategies.
//!
//! ### Contract
//! - Any HTTP status, including 4xx/5xx, is a successful fetch returning a `Response`
//! - Connectivity, DNS, TLS and timeout failures are `Error::Network`
//! - `bypass_cache` asks intermediaries for a fresh copy (`Cache-Control: no-store`)
//! - Every response header is kept; bytes that are not UTF-8 become U+FFFD
//!
//! ### Response type
//! - Same origin as the configured scope: `basic`
//! - Anything else: `cors`

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};
use shellcache_core::{Error, RequestDescriptor, Response, ResponseType};

pub use self::url::{UrlError, resolve, same_origin};

/// Per-call transport options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip any HTTP-level cache between us and the origin.
    pub bypass_cache: bool,
}

impl FetchOptions {
    pub fn bypass_cache() -> Self {
        Self { bypass_cache: true }
    }
}

/// Something that can put a request on the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request` and return whatever the origin answered.
    ///
    /// # Errors
    ///
    /// `Error::Network` when no response could be obtained at all.
    async fn fetch(&self, request: &RequestDescriptor, options: FetchOptions) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Application scope; decides between `basic` and `cors` responses
    pub scope: Option<::url::Url>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            timeout: Duration::from_millis(30_000),
            max_redirects: 5,
            scope: None,
        }
    }
}

impl FetchConfig {
    /// Transport settings taken from the shell configuration.
    pub fn from_shell(config: &shellcache_core::ShellConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            scope: config.scope_url().ok(),
            ..Default::default()
        }
    }
}

/// reqwest-backed transport.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn response_type(&self, request: &RequestDescriptor) -> ResponseType {
        match &self.config.scope {
            Some(scope) if !same_origin(scope, request.url()) => ResponseType::Cors,
            _ => ResponseType::Basic,
        }
    }
}

#[async_trait]
impl Transport for FetchClient {
    async fn fetch(&self, request: &RequestDescriptor, options: FetchOptions) -> Result<Response, Error> {
        let start = Instant::now();
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("method {}: {}", request.method(), e)))?;

        let mut builder = self.http.request(method, request.url().clone());
        if options.bypass_cache {
            builder = builder
                .header(header::CACHE_CONTROL, "no-store")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("timeout: {}", e))
            } else {
                Error::Network(format!("network error: {}", e))
            }
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), value)
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method(),
            request.url(),
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            response_type: self.response_type(request),
            headers,
            body,
        })
    }
}
