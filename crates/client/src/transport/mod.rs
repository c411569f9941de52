//! HTTP transport seam for API calls, page fetches and script loads.
//!
//! ### Deadlines
//! - Every call goes through [`send_with_deadline`], which turns an expired
//!   deadline into `Error::Timeout` regardless of the transport in use.
//!
//! ### Body Limits
//! - Responses larger than `max_bytes` are rejected with `Error::TooLarge`.

pub mod path;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, StatusCode, Url};
use std::time::{Duration, Instant};

use bizdesk_core::Error;

pub use path::{normalize_path, resolve};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string (default: "bizdesk/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 2MB)
    pub max_bytes: usize,

    /// Request timeout enforced by the HTTP client (default: 15s)
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { user_agent: "bizdesk/0.1".to_string(), max_bytes: 2 * 1024 * 1024, timeout: Duration::from_millis(15_000) }
    }
}

impl TransportConfig {
    pub fn from_app_config(config: &bizdesk_core::AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_page_bytes,
            timeout: config.request_timeout().max(config.page_timeout()),
        }
    }
}

/// Outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Plain GET with default headers.
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, headers: HeaderMap::new(), body: None }
    }
}

/// Response with a fully read body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body bytes
    pub body: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl HttpResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Anything that can carry an [`HttpRequest`] to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and read the whole body.
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// Send through `transport`, failing with `Error::Timeout` once `deadline` passes.
pub async fn send_with_deadline(
    transport: &dyn Transport, request: HttpRequest, deadline: Duration,
) -> Result<HttpResponse, Error> {
    match tokio::time::timeout(deadline, transport.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(deadline.as_millis() as u64)),
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let start = Instant::now();
        let url = request.url.clone();

        let mut builder = self.http.request(request.method, request.url).headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.config.timeout.as_millis() as u64)
            } else {
                Error::Transport(format!("network error: {}", e))
            }
        })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers = response.headers().clone();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response: {}", e)))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} ({}) in {}ms ({} bytes, {})",
            url,
            status.as_u16(),
            fetch_ms,
            body.len(),
            headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("no content-type")
        );

        Ok(HttpResponse { status, headers, body, fetch_ms })
    }
}
