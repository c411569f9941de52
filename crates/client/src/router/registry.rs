//! Route table and per-page initialization hooks.
//!
//! Each navigable page registers a named init hook up front; after a
//! navigation the router looks the hook up by route name instead of running
//! code found in the fetched markup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

/// Page name used for paths missing from the table.
pub const FALLBACK_PAGE: &str = "index";

/// Static path → page name mapping.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(&[
            ("/", "index"),
            ("/warehouse", "warehouse"),
            ("/reports", "reports"),
            ("/employees", "employees"),
            ("/ai-chat", "ai_chat"),
        ])
    }
}

impl RouteTable {
    pub fn new(routes: &[(&str, &str)]) -> Self {
        Self { routes: routes.iter().map(|(p, n)| (p.to_string(), n.to_string())).collect() }
    }

    /// Page name for `path`, falling back to the index page.
    pub fn page_name(&self, path: &str) -> &str {
        self.routes.get(path).map(String::as_str).unwrap_or(FALLBACK_PAGE)
    }

    /// Sorted list of known paths.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

/// Page-specific setup run after the page is rendered.
#[async_trait]
pub trait PageInit: Send + Sync {
    async fn init(&self, path: &str);
}

/// Route table plus the init hook registered for each page name.
#[derive(Clone, Default)]
pub struct PageRegistry {
    routes: RouteTable,
    hooks: HashMap<String, Arc<dyn PageInit>>,
}

impl PageRegistry {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes, hooks: HashMap::new() }
    }

    /// Register `hook` for the page called `name`, replacing any previous one.
    pub fn register(mut self, name: &str, hook: Arc<dyn PageInit>) -> Self {
        self.hooks.insert(name.to_string(), hook);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Page name and hook for `path`.
    pub fn resolve(&self, path: &str) -> (&str, Option<Arc<dyn PageInit>>) {
        let name = self.routes.page_name(path);
        (name, self.hooks.get(name).cloned())
    }
}
