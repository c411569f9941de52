//! Loading of external page scripts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use bizdesk_core::Error;

use crate::transport::{HttpRequest, Transport, resolve, send_with_deadline};

/// Loads one external script; the router treats both outcomes as settled.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    async fn load(&self, src: &str) -> Result<(), Error>;
}

/// Fetches script assets through the shared transport.
pub struct TransportScriptLoader {
    transport: Arc<dyn Transport>,
    base_url: Url,
    timeout: Duration,
}

impl TransportScriptLoader {
    pub fn new(transport: Arc<dyn Transport>, base_url: Url, timeout: Duration) -> Self {
        Self { transport, base_url, timeout }
    }
}

#[async_trait]
impl ScriptLoader for TransportScriptLoader {
    async fn load(&self, src: &str) -> Result<(), Error> {
        let url = resolve(&self.base_url, src)?;
        let response = send_with_deadline(self.transport.as_ref(), HttpRequest::get(url), self.timeout).await?;

        if !response.is_success() {
            return Err(Error::Http {
                status: response.status.as_u16(),
                message: format!("script {src} failed to load"),
            });
        }

        tracing::debug!("loaded script {} ({} bytes)", src, response.body.len());
        Ok(())
    }
}
