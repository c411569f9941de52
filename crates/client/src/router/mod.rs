//! Client-side page router.
//!
//! Navigations fetch full pages from the origin, swap the content container
//! in the live document and run the page's registered init hook, without a
//! full reload.
//!
//! ### Generations
//! - Every load takes a new generation number. After each await a load
//!   checks that it is still the latest; a stale load stops without touching
//!   the document or the page cache.
//!
//! ### Page Cache
//! - Fetched bodies are kept for the router's lifetime together with their
//!   external script list. A cache hit renders without a request and only
//!   loads scripts the document still lacks, which is none on a revisit and
//!   the page's scripts after a prefetch.

pub mod document;
pub mod history;
pub mod registry;
pub mod scripts;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use url::Url;

use bizdesk_core::{AppConfig, Cache, Error, PageCache, config::TransitionConfig};

use crate::host::Host;
use crate::page::parse_page;
use crate::transport::{HttpRequest, Transport, normalize_path, resolve, send_with_deadline};

pub use document::{Document, HeadlessDocument, TransitionPhase};
pub use history::{History, MemoryHistory};
pub use registry::{FALLBACK_PAGE, PageInit, PageRegistry, RouteTable};
pub use scripts::{ScriptLoader, TransportScriptLoader};

/// Router settings derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Origin pages are fetched from
    pub base_url: Url,
    /// Deadline for page and script fetches
    pub page_timeout: Duration,
    /// Transition and init timing
    pub transition: TransitionConfig,
    /// Animate back/forward traversal
    pub animate_history: bool,
}

impl RouterOptions {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            page_timeout: Duration::from_millis(15_000),
            transition: TransitionConfig::default(),
            animate_history: false,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidInput(format!("invalid base_url {}: {e}", config.base_url)))?;
        Ok(Self {
            base_url,
            page_timeout: config.page_timeout(),
            transition: config.transition.clone(),
            animate_history: config.animate_history,
        })
    }
}

/// Outcome of a navigation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Target equals the current location; nothing happened.
    Unchanged,
    /// The page was rendered and initialized.
    Rendered { from_cache: bool },
    /// A newer navigation started before this one finished.
    Superseded,
}

/// Swaps pages in a [`Document`] and keeps [`History`] in sync.
pub struct PageRouter {
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    document: Arc<dyn Document>,
    history: Arc<dyn History>,
    scripts: Arc<dyn ScriptLoader>,
    registry: PageRegistry,
    pages: PageCache,
    page_scripts: Cache<Vec<String>>,
    generation: AtomicU64,
    started: AtomicBool,
    options: RouterOptions,
}

impl PageRouter {
    /// Create a router that loads scripts through `transport`.
    pub fn new(
        transport: Arc<dyn Transport>, host: Arc<dyn Host>, document: Arc<dyn Document>, history: Arc<dyn History>,
        registry: PageRegistry, options: RouterOptions,
    ) -> Self {
        let scripts = Arc::new(TransportScriptLoader::new(
            transport.clone(),
            options.base_url.clone(),
            options.page_timeout,
        ));
        Self {
            transport,
            host,
            document,
            history,
            scripts,
            registry,
            pages: PageCache::unbounded(),
            page_scripts: Cache::unbounded(),
            generation: AtomicU64::new(0),
            started: AtomicBool::new(false),
            options,
        }
    }

    /// Replace the script loader.
    pub fn with_script_loader(mut self, scripts: Arc<dyn ScriptLoader>) -> Self {
        self.scripts = scripts;
        self
    }

    /// Cache of fetched page bodies.
    pub fn pages(&self) -> &PageCache {
        &self.pages
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn location(&self) -> String {
        self.history.location()
    }

    /// Run the load sequence for the page the host served initially.
    ///
    /// Only the first call has an effect; later calls return `false`.
    pub fn start(&self) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.on_page_load(&self.history.location());
        true
    }

    /// Navigate to `path`, pushing a history entry.
    pub async fn navigate(&self, path: &str) -> Result<Navigation, Error> {
        let path = normalize_path(path);
        if path == normalize_path(&self.history.location()) {
            return Ok(Navigation::Unchanged);
        }

        self.history.push(&path);
        self.load_page(&path, true).await
    }

    /// React to back/forward traversal: load the current location without a push.
    pub async fn on_history_change(&self) -> Result<Navigation, Error> {
        let path = self.history.location();
        self.load_page(&path, self.options.animate_history).await
    }

    /// Load and render `path`.
    ///
    /// On failure the overlay is dismissed and the document is left as it was.
    pub async fn load_page(&self, path: &str, animate: bool) -> Result<Navigation, Error> {
        let path = normalize_path(path);
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if animate {
            self.document.show_overlay();
        }

        if let Some(body) = self.pages.get(&path) {
            tracing::debug!("page cache hit for {}", path);
            if !self.render_page(&body, animate, token).await {
                return Ok(Navigation::Superseded);
            }
            let scripts = self.page_scripts.get(&path).unwrap_or_default();
            self.execute_scripts(&scripts, 0, &path).await;
            if !self.after_navigation(&path, token).await {
                return Ok(Navigation::Superseded);
            }
            return Ok(Navigation::Rendered { from_cache: true });
        }

        let html = match self.fetch_page(&path).await {
            Ok(html) => html,
            Err(_) if !self.is_current(token) => return Ok(Navigation::Superseded),
            Err(err) => {
                self.document.hide_overlay();
                tracing::error!(path = %path, error = %err, "navigation failed");
                return Err(err);
            }
        };

        if !self.is_current(token) {
            tracing::debug!("discarding stale load of {}", path);
            return Ok(Navigation::Superseded);
        }

        let page = parse_page(&html);
        self.pages.set(path.clone(), page.body.clone());
        self.page_scripts.set(path.clone(), page.scripts.clone());

        if !self.render_page(&page.body, animate, token).await {
            return Ok(Navigation::Superseded);
        }
        self.execute_scripts(&page.scripts, page.inline_scripts, &path).await;
        if !self.after_navigation(&path, token).await {
            return Ok(Navigation::Superseded);
        }

        Ok(Navigation::Rendered { from_cache: false })
    }

    /// Fetch `path` into the page cache without rendering it.
    ///
    /// The page's scripts are remembered and loaded on the first navigation
    /// to it. Failures are ignored.
    pub async fn prefetch(&self, path: &str) {
        let path = normalize_path(path);
        if self.pages.contains(&path) {
            return;
        }

        match self.fetch_page(&path).await {
            Ok(html) => {
                let page = parse_page(&html);
                self.page_scripts.set(path.clone(), page.scripts);
                self.pages.set(path, page.body);
            }
            Err(err) => tracing::debug!(path = %path, error = %err, "prefetch failed"),
        }
    }

    /// Whether a link click on `href` is handled by the router.
    ///
    /// Only same-origin absolute paths not marked external qualify.
    pub fn intercepts(&self, href: &str, external: bool) -> bool {
        !external && href.starts_with('/') && !href.starts_with("//")
    }

    /// Handle a link click. Returns `None` when the link is left to the host.
    pub async fn on_link_click(&self, href: &str, external: bool) -> Option<Result<Navigation, Error>> {
        if !self.intercepts(href, external) {
            return None;
        }
        Some(self.navigate(href).await)
    }

    /// Handle a pointer entering a link by prefetching its target.
    pub async fn on_link_hover(&self, href: &str, external: bool) {
        if self.intercepts(href, external) {
            self.prefetch(href).await;
        }
    }

    /// Drop every cached page body.
    pub fn clear_pages(&self) {
        self.pages.clear(None);
        self.page_scripts.clear(None);
    }

    /// Abandon any in-flight navigation.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.document.hide_overlay();
    }

    fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    async fn fetch_page(&self, path: &str) -> Result<String, Error> {
        let url = resolve(&self.options.base_url, path)?;
        let response =
            send_with_deadline(self.transport.as_ref(), HttpRequest::get(url), self.options.page_timeout).await?;

        if !response.is_success() {
            return Err(Error::Navigation(format!("{path} returned status {}", response.status.as_u16())));
        }

        tracing::debug!("fetched page {} in {}ms", path, response.fetch_ms);
        Ok(response.text())
    }

    /// Swap `body` into the document. Returns `false` if superseded before the swap.
    async fn render_page(&self, body: &str, animate: bool, token: u64) -> bool {
        if !animate {
            self.document.render(body);
            self.document.hide_overlay();
            return true;
        }

        let timing = &self.options.transition;
        self.document.set_transition(TransitionPhase::FadeOut);
        tokio::time::sleep(Duration::from_millis(timing.fade_out_ms)).await;
        if !self.is_current(token) {
            return false;
        }

        self.document.render(body);
        self.document.set_transition(TransitionPhase::FadeIn);
        tokio::time::sleep(Duration::from_millis(timing.fade_in_ms)).await;
        self.document.set_transition(TransitionPhase::Settled);
        self.document.hide_overlay();
        true
    }

    /// Insert and load every external script the document lacks.
    ///
    /// Loads run concurrently and all settle; failures are only logged.
    async fn execute_scripts(&self, scripts: &[String], inline_scripts: usize, path: &str) {
        let pending: Vec<&str> =
            scripts.iter().map(String::as_str).filter(|src| !self.document.has_script(src)).collect();

        for src in &pending {
            self.document.insert_script(src);
        }

        let loads = pending.iter().map(|src| async move { (*src, self.scripts.load(src).await) });
        for (src, result) in join_all(loads).await {
            if let Err(err) = result {
                tracing::warn!(src, error = %err, "script failed to load");
            }
        }

        if inline_scripts > 0 {
            tracing::debug!(path, count = inline_scripts, "skipped inline script blocks");
        }
    }

    /// Run the page init hook and load bookkeeping. Returns `false` if superseded.
    async fn after_navigation(&self, path: &str, token: u64) -> bool {
        let timing = &self.options.transition;
        tokio::time::sleep(Duration::from_millis(timing.init_delay_ms)).await;
        if !self.is_current(token) {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(timing.hook_delay_ms)).await;
        if !self.is_current(token) {
            return false;
        }

        let (name, hook) = self.registry.resolve(path);
        match hook {
            Some(hook) => {
                tracing::debug!("running init hook {} for {}", name, path);
                hook.init(path).await;
                if !self.is_current(token) {
                    tracing::debug!("init hook for {} finished after a newer navigation", path);
                    return false;
                }
            }
            None => tracing::debug!("no init hook registered for {}", name),
        }

        self.on_page_load(path);
        true
    }

    fn on_page_load(&self, path: &str) {
        self.document.highlight_nav(path);
        self.host.ready();
        self.host.expand();
    }
}
