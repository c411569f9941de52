//! Application context owning the shared client instances.

use std::sync::{Arc, Mutex, PoisonError};

use bizdesk_core::{AppConfig, Error, ResponseCache};

use crate::api::{ApiClient, ApiConfig};
use crate::host::Host;
use crate::router::{Document, History, PageRegistry, PageRouter, RouterOptions};
use crate::transport::Transport;

/// Explicitly initialized set of client instances.
///
/// `init` builds the response cache and API client, `mount` attaches a
/// router to a document, and `dispose` clears state and stops navigation.
pub struct AppContext {
    config: AppConfig,
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    api: Arc<ApiClient>,
    router: Mutex<Option<Arc<PageRouter>>>,
}

impl AppContext {
    pub fn init(config: AppConfig, transport: Arc<dyn Transport>, host: Arc<dyn Host>) -> Result<Self, Error> {
        let cache = Arc::new(ResponseCache::with_ttl(config.cache_ttl()));
        let api_config = ApiConfig::from_app_config(&config)?;
        let api = Arc::new(ApiClient::new(transport.clone(), host.clone(), cache, api_config));

        tracing::debug!(base_url = %config.base_url, ttl_secs = config.cache_ttl_secs, "client context initialized");
        Ok(Self { config, transport, host, api, router: Mutex::new(None) })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Build the page router for `document`, replacing any previously mounted one.
    pub fn mount(
        &self, document: Arc<dyn Document>, history: Arc<dyn History>, registry: PageRegistry,
    ) -> Result<Arc<PageRouter>, Error> {
        let options = RouterOptions::from_app_config(&self.config)?;
        let router =
            Arc::new(PageRouter::new(self.transport.clone(), self.host.clone(), document, history, registry, options));

        let previous = self.router.lock().unwrap_or_else(PoisonError::into_inner).replace(router.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        Ok(router)
    }

    /// The mounted router, if any.
    pub fn router(&self) -> Option<Arc<PageRouter>> {
        self.router.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Clear both caches and abandon in-flight navigation.
    pub fn dispose(&self) {
        self.api.cache().clear(None);
        if let Some(router) = self.router.lock().unwrap_or_else(PoisonError::into_inner).take() {
            router.cancel();
            router.clear_pages();
        }
        tracing::debug!("client context disposed");
    }
}
