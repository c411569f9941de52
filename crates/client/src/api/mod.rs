//! Backend API client.
//!
//! ### Request Pipeline
//! - Cached GET envelopes are returned without touching the network.
//! - Session headers are merged into every request; per-call headers win.
//! - Every call has a deadline; expiry is a transport failure.
//!
//! ### Normalization
//! - The client never fails: transport errors, malformed bodies and HTTP
//!   error statuses all become `{success: false, error}` envelopes.
//! - 401/403 responses trigger the host redirect named in the body, if any.
//! - Only successful envelopes are cached; a successful write invalidates the
//!   tags its endpoint maps to.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use bizdesk_core::{AppConfig, Envelope, Error, ResponseCache, TagRules};

use crate::host::Host;
use crate::session::SessionIdentity;
use crate::transport::{HttpRequest, HttpResponse, Transport, resolve, send_with_deadline};

/// Settings for the API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origin the endpoints are resolved against.
    pub base_url: Url,
    /// Identity sent in the init-data header.
    pub session: SessionIdentity,
    /// Endpoint to cache-tag mapping.
    pub rules: TagRules,
    /// Per-request deadline.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the base URL or session data is invalid.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| Error::InvalidInput(format!("base_url: {e}")))?;
        Ok(Self {
            base_url,
            session: SessionIdentity::from_config(config)?,
            rules: TagRules::new(config.tag_rules.clone()),
            timeout: config.request_timeout(),
        })
    }
}

/// Transport options for a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method (default GET).
    pub method: Method,
    /// JSON body.
    pub body: Option<Value>,
    /// Extra headers, overriding the session defaults.
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn with_method(method: Method) -> Self {
        Self { method, ..Default::default() }
    }

    pub fn with_body(method: Method, body: Value) -> Self {
        Self { method, body: Some(body), ..Default::default() }
    }

    fn is_mutation(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD)
    }
}

/// Error body shape for non-success statuses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    redirect: Option<String>,
}

/// API client sharing one response cache across all pages.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    cache: Arc<ResponseCache>,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, host: Arc<dyn Host>, cache: Arc<ResponseCache>, config: ApiConfig) -> Self {
        Self { transport, host, cache, config }
    }

    /// The shared response cache.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Perform a request and return its envelope.
    ///
    /// With `use_cache`, a GET is answered from the response cache when a
    /// fresh entry exists, and a successful GET envelope is stored. Writes are
    /// never read from or stored in the cache.
    pub async fn request(&self, endpoint: &str, options: RequestOptions, use_cache: bool) -> Envelope {
        let cacheable = use_cache && options.method == Method::GET;

        if cacheable && let Some(cached) = self.cache.get(endpoint) {
            tracing::debug!("cache hit for {}", endpoint);
            return cached;
        }

        let mutation = options.is_mutation();
        let method = options.method.clone();

        let envelope = match self.send(endpoint, options).await {
            Ok(response) => match self.interpret(response) {
                Ok(envelope) => envelope,
                Err(err) => {
                    tracing::error!(endpoint, %method, error = %err, "API request rejected");
                    return Envelope::from_error(&err);
                }
            },
            Err(err) => {
                tracing::error!(endpoint, %method, error = %err, "API request failed");
                return Envelope::from_error(&err);
            }
        };

        if envelope.success {
            if cacheable {
                self.cache.set_tagged(endpoint, envelope.clone(), self.config.rules.tags_for(endpoint));
            }
            if mutation {
                self.invalidate_after_write(endpoint);
            }
        }

        envelope
    }

    /// Cached GET.
    pub async fn get(&self, endpoint: &str) -> Envelope {
        self.request(endpoint, RequestOptions::default(), true).await
    }

    /// GET that bypasses the cache, for explicit refreshes.
    pub async fn get_fresh(&self, endpoint: &str) -> Envelope {
        self.request(endpoint, RequestOptions::default(), false).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Envelope {
        self.request(endpoint, RequestOptions::with_body(Method::POST, body), false).await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> Envelope {
        self.request(endpoint, RequestOptions::with_body(Method::PUT, body), false).await
    }

    pub async fn delete(&self, endpoint: &str) -> Envelope {
        self.request(endpoint, RequestOptions::with_method(Method::DELETE), false).await
    }

    async fn send(&self, endpoint: &str, options: RequestOptions) -> Result<HttpResponse, Error> {
        let url = resolve(&self.config.base_url, endpoint)?;

        let mut headers = self.config.session.headers()?;
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        let body = match options.body {
            Some(body) => Some(Bytes::from(
                serde_json::to_vec(&body).map_err(|e| Error::InvalidInput(format!("request body: {e}")))?,
            )),
            None => None,
        };

        let request = HttpRequest { method: options.method, url, headers, body };
        send_with_deadline(self.transport.as_ref(), request, self.config.timeout).await
    }

    fn interpret(&self, response: HttpResponse) -> Result<Envelope, Error> {
        let status = response.status;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body: ErrorBody = serde_json::from_slice(&response.body).unwrap_or_default();
            tracing::error!("authentication failed: {}", status.as_u16());

            if let Some(redirect) = body.redirect.as_deref().filter(|r| !r.is_empty()) {
                self.host.open_external(redirect);
            }

            return Err(Error::Auth {
                status: status.as_u16(),
                message: body.error.unwrap_or_else(|| "authentication failed".to_string()),
            });
        }

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_slice(&response.body).unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: body.error.unwrap_or_else(|| format!("server error: {}", status.as_u16())),
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| Error::Malformed(e.to_string()))
    }

    fn invalidate_after_write(&self, endpoint: &str) {
        let tags = self.config.rules.invalidated_by(endpoint);
        let removed: usize = tags.iter().map(|tag| self.cache.invalidate_tag(tag)).sum();
        tracing::debug!(endpoint, ?tags, removed, "invalidated cache after write");
    }
}
