//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (BIZDESK_*)
//! 2. TOML config file (if BIZDESK_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cache::{TagRule, default_tag_rules};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (BIZDESK_*)
/// 2. TOML config file (if BIZDESK_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin serving both the pages and the `/api` endpoints.
    ///
    /// Set via BIZDESK_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Raw session string supplied by the host, sent verbatim.
    ///
    /// Set via BIZDESK_INIT_DATA environment variable.
    #[serde(default, deserialize_with = "scalar_string")]
    pub init_data: Option<String>,

    /// Decoded session object as JSON text, used when no raw string exists.
    ///
    /// Set via BIZDESK_INIT_DATA_UNSAFE environment variable.
    #[serde(default, deserialize_with = "scalar_string")]
    pub init_data_unsafe: Option<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via BIZDESK_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Lifetime of cached API envelopes in seconds.
    ///
    /// Set via BIZDESK_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Deadline for API requests in milliseconds.
    ///
    /// Set via BIZDESK_REQUEST_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Deadline for page and script fetches in milliseconds.
    ///
    /// Set via BIZDESK_PAGE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Maximum page body size in bytes.
    ///
    /// Set via BIZDESK_MAX_PAGE_BYTES environment variable.
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,

    /// CSS selector of the primary content container swapped on navigation.
    ///
    /// Set via BIZDESK_CONTENT_SELECTOR environment variable.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    /// Whether back/forward traversal uses the fade transition.
    ///
    /// Set via BIZDESK_ANIMATE_HISTORY environment variable.
    #[serde(default)]
    pub animate_history: bool,

    /// Transition and init timing.
    #[serde(default)]
    pub transition: TransitionConfig,

    /// Endpoint to cache-tag mapping.
    #[serde(default = "default_tag_rules")]
    pub tag_rules: Vec<TagRule>,
}

/// Cosmetic delays used while swapping pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Fade-out of the old content before the swap.
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,

    /// Fade-in of the new content after the swap.
    #[serde(default = "default_fade_in_ms")]
    pub fade_in_ms: u64,

    /// Wait after scripts settle before the page init runs.
    #[serde(default = "default_init_delay_ms")]
    pub init_delay_ms: u64,

    /// Extra wait right before invoking the page init hook.
    #[serde(default = "default_hook_delay_ms")]
    pub hook_delay_ms: u64,
}

/// Any scalar a provider may have inferred from a string value.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

/// Accept a string-typed option even when env parsing inferred a number or bool.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Signed(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_user_agent() -> String {
    "bizdesk/0.1".into()
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_max_page_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_content_selector() -> String {
    ".min-h-screen".into()
}

fn default_fade_out_ms() -> u64 {
    150
}

fn default_fade_in_ms() -> u64 {
    50
}

fn default_init_delay_ms() -> u64 {
    100
}

fn default_hook_delay_ms() -> u64 {
    50
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            fade_out_ms: default_fade_out_ms(),
            fade_in_ms: default_fade_in_ms(),
            init_delay_ms: default_init_delay_ms(),
            hook_delay_ms: default_hook_delay_ms(),
        }
    }
}

impl TransitionConfig {
    /// All delays zeroed, for headless runs where nothing is painted.
    pub fn instant() -> Self {
        Self { fade_out_ms: 0, fade_in_ms: 0, init_delay_ms: 0, hook_delay_ms: 0 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            init_data: None,
            init_data_unsafe: None,
            user_agent: default_user_agent(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_ms: default_timeout_ms(),
            page_timeout_ms: default_timeout_ms(),
            max_page_bytes: default_max_page_bytes(),
            content_selector: default_content_selector(),
            animate_history: false,
            transition: TransitionConfig::default(),
            tag_rules: default_tag_rules(),
        }
    }
}

impl AppConfig {
    /// Response cache TTL as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// API request deadline as Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Page fetch deadline as Duration.
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `BIZDESK_`
    /// 2. TOML file from `BIZDESK_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("BIZDESK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("BIZDESK_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
