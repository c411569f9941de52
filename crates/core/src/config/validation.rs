//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < 100 {
        return Err(invalid(field, "must be at least 100ms"));
    }
    if value > 300_000 {
        return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `base_url` is not an absolute http(s) URL
    /// - either timeout is below 100ms or above 5 minutes
    /// - `cache_ttl_secs` exceeds one day
    /// - `max_page_bytes` is 0 or exceeds 50MB
    /// - `user_agent` or `content_selector` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => return Err(invalid("base_url", "scheme must be http or https")),
            Err(e) => return Err(invalid("base_url", &e.to_string())),
        }

        check_timeout("request_timeout_ms", self.request_timeout_ms)?;
        check_timeout("page_timeout_ms", self.page_timeout_ms)?;

        if self.cache_ttl_secs > 86_400 {
            return Err(invalid("cache_ttl_secs", "must not exceed one day (86400s)"));
        }

        if self.max_page_bytes == 0 {
            return Err(invalid("max_page_bytes", "must be greater than 0"));
        }
        if self.max_page_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_page_bytes", "must not exceed 50MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.content_selector.trim().is_empty() {
            return Err(invalid("content_selector", "must not be empty"));
        }

        if self.init_data.is_some() && self.init_data_unsafe.is_some() {
            tracing::warn!("Both init_data and init_data_unsafe are set; init_data takes precedence");
        }

        Ok(())
    }
}
