//! Init hooks for the mini app's pages.
//!
//! Each hook loads the data its page shows through the shared API client,
//! concurrently and cache-first, and alerts the host when a read fails.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;

use bizdesk_client::{ApiClient, Host, PageInit, PageRegistry, RouteTable};

/// Page name and the endpoints its init hook reads.
pub const PAGE_DATA: &[(&str, &[&str])] = &[
    ("index", &["/api/reports/summary?period=month", "/api/transactions?limit=5"]),
    ("warehouse", &["/api/warehouse/products"]),
    ("employees", &["/api/employees", "/api/tasks"]),
    ("reports", &["/api/reports/summary?period=month"]),
    ("ai_chat", &[]),
];

/// Hook that warms a page's data endpoints.
pub struct DataHook {
    name: &'static str,
    endpoints: &'static [&'static str],
    api: Arc<ApiClient>,
    host: Arc<dyn Host>,
}

impl DataHook {
    pub fn new(
        name: &'static str, endpoints: &'static [&'static str], api: Arc<ApiClient>, host: Arc<dyn Host>,
    ) -> Self {
        Self { name, endpoints, api, host }
    }
}

#[async_trait]
impl PageInit for DataHook {
    async fn init(&self, path: &str) {
        let reads = self.endpoints.iter().map(|endpoint| async move { (*endpoint, self.api.get(endpoint).await) });

        for (endpoint, envelope) in join_all(reads).await {
            if envelope.success {
                tracing::info!(page = self.name, path, endpoint, "page data loaded");
            } else {
                tracing::warn!(page = self.name, endpoint, error = envelope.error_message(), "page data failed");
                self.host.alert(envelope.error_message());
            }
        }
    }
}

/// Registry with a [`DataHook`] for every known page.
pub fn registry(api: &Arc<ApiClient>, host: &Arc<dyn Host>) -> PageRegistry {
    PAGE_DATA.iter().fold(PageRegistry::new(RouteTable::default()), |registry, (name, endpoints)| {
        registry.register(name, Arc::new(DataHook::new(*name, *endpoints, api.clone(), host.clone())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{StaticTransport, TestHost};
    use bizdesk_client::ApiConfig;
    use bizdesk_core::{AppConfig, ResponseCache};

    fn client(transport: Arc<StaticTransport>, host: Arc<TestHost>) -> Arc<ApiClient> {
        let config = ApiConfig::from_app_config(&AppConfig::default()).unwrap();
        Arc::new(ApiClient::new(transport, host, Arc::new(ResponseCache::default()), config))
    }

    #[tokio::test]
    async fn test_hook_reads_endpoints_into_cache() {
        let transport = Arc::new(
            StaticTransport::default()
                .route("/api/employees", 200, r#"{"success":true,"data":[{"id":1}]}"#)
                .route("/api/tasks", 200, r#"{"success":true,"data":[]}"#),
        );
        let host = Arc::new(TestHost::default());
        let api = client(transport.clone(), host.clone());
        let host_dyn: Arc<dyn Host> = host.clone();
        let registry = registry(&api, &host_dyn);

        let (name, hook) = registry.resolve("/employees");
        assert_eq!(name, "employees");
        hook.unwrap().init("/employees").await;

        assert!(api.cache().contains("/api/employees"));
        assert!(api.cache().contains("/api/tasks"));
        assert!(host.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_hook_alerts_on_failure() {
        let transport = Arc::new(StaticTransport::default().route(
            "/api/warehouse/products",
            500,
            r#"{"success":false,"error":"database unavailable"}"#,
        ));
        let host = Arc::new(TestHost::default());
        let api = client(transport, host.clone());
        let hook = DataHook::new("warehouse", &["/api/warehouse/products"], api, host.clone());

        hook.init("/warehouse").await;

        assert_eq!(host.alerts(), vec!["database unavailable".to_string()]);
    }

    #[test]
    fn test_every_route_has_a_hook() {
        let transport = Arc::new(StaticTransport::default());
        let host = Arc::new(TestHost::default());
        let api = client(transport, host.clone());
        let host_dyn: Arc<dyn Host> = host;
        let registry = registry(&api, &host_dyn);

        for path in registry.routes().paths() {
            assert!(registry.resolve(path).1.is_some(), "missing hook for {path}");
        }
    }
}
