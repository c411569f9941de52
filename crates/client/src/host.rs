//! Capabilities provided by the hosting runtime.

/// What the Telegram host exposes to the client layer.
pub trait Host: Send + Sync {
    /// Signal that the app finished rendering.
    fn ready(&self);

    /// Ask the host to expand the viewport.
    fn expand(&self);

    /// Show a modal alert with a human-readable message.
    fn alert(&self, message: &str);

    /// Open a URL outside the app, used for re-authentication redirects.
    fn open_external(&self, url: &str);
}

/// Host for headless sessions: every capability is logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHost;

impl Host for LogHost {
    fn ready(&self) {
        tracing::debug!("host ready");
    }

    fn expand(&self) {
        tracing::debug!("host expand");
    }

    fn alert(&self, message: &str) {
        tracing::warn!(message, "host alert");
    }

    fn open_external(&self, url: &str) {
        tracing::info!(url, "host open external");
    }
}
