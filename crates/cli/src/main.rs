//! bizdesk command-line entry point.
//!
//! Drives the client layer headlessly against a running backend: single API
//! calls through the cached client, and page-by-page browsing through the
//! router. Logging goes to stderr so stdout only carries results.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bizdesk_client::{
    AppContext, Document, HeadlessDocument, History, Host, HttpRequest, HttpTransport, LogHost, MemoryHistory,
    Method, Navigation, RequestOptions, Transport, TransportConfig, parse_page, resolve, send_with_deadline,
};
use bizdesk_core::AppConfig;
use bizdesk_core::config::TransitionConfig;

mod pages;

/// Headless client for the bizdesk mini app backend.
#[derive(Parser, Debug)]
#[command(name = "bizdesk")]
#[command(about = "Call the bizdesk API and browse its pages headlessly")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one API request and print the response envelope
    Api {
        /// Endpoint path, e.g. /api/warehouse/products
        endpoint: String,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,

        /// JSON request body
        #[arg(long, value_name = "JSON")]
        body: Option<String>,

        /// Skip the response cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Navigate through pages and print where the router ended up
    Browse {
        /// Paths to navigate to, in order
        #[arg(required = true)]
        paths: Vec<String>,

        /// Steps to go back through history afterwards
        #[arg(long, default_value_t = 0)]
        back: usize,

        /// Paths to prefetch before navigating
        #[arg(long, value_name = "PATH")]
        prefetch: Vec<String>,

        /// Skip transition and init delays
        #[arg(long)]
        instant: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("loading configuration")?;
    if let Command::Browse { instant: true, .. } = cli.command {
        config.transition = TransitionConfig::instant();
    }

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(TransportConfig::from_app_config(&config))?);
    let host: Arc<dyn Host> = Arc::new(LogHost);
    let ctx = AppContext::init(config, transport.clone(), host)?;

    let result = match cli.command {
        Command::Api { endpoint, method, body, no_cache } => {
            run_api(&ctx, &endpoint, &method, body.as_deref(), no_cache).await
        }
        Command::Browse { paths, back, prefetch, .. } => run_browse(&ctx, transport, &paths, back, &prefetch).await,
    };

    ctx.dispose();
    result
}

/// Build request options from the raw method and body arguments.
fn request_options(method: &str, body: Option<&str>) -> Result<RequestOptions> {
    let method =
        Method::from_bytes(method.to_uppercase().as_bytes()).with_context(|| format!("invalid method {method}"))?;
    match body {
        Some(body) => {
            let value = serde_json::from_str(body).context("request body is not valid JSON")?;
            Ok(RequestOptions::with_body(method, value))
        }
        None => Ok(RequestOptions::with_method(method)),
    }
}

async fn run_api(ctx: &AppContext, endpoint: &str, method: &str, body: Option<&str>, no_cache: bool) -> Result<()> {
    let options = request_options(method, body)?;
    let envelope = ctx.api().request(endpoint, options, !no_cache).await;

    println!("{}", serde_json::to_string_pretty(&envelope)?);

    if !envelope.success {
        anyhow::bail!("request failed: {}", envelope.error_message());
    }
    Ok(())
}

async fn run_browse(
    ctx: &AppContext, transport: Arc<dyn Transport>, paths: &[String], back: usize, prefetch: &[String],
) -> Result<()> {
    let config = ctx.config();
    let home = resolve(&ctx.api().config().base_url, "/")?;

    let response = send_with_deadline(transport.as_ref(), HttpRequest::get(home), config.page_timeout())
        .await
        .context("fetching initial page")?;
    if !response.is_success() {
        anyhow::bail!("initial page returned status {}", response.status);
    }

    let initial = parse_page(&response.text());
    let document = Arc::new(HeadlessDocument::new(&initial.body, &config.content_selector)?);
    for src in &initial.scripts {
        document.insert_script(src);
    }
    let history = Arc::new(MemoryHistory::new("/"));
    let registry = pages::registry(ctx.api(), ctx.host());
    let router = ctx.mount(document.clone(), history.clone(), registry)?;

    router.start();

    for path in prefetch {
        router.prefetch(path).await;
    }

    for path in paths {
        log_navigation(path, router.navigate(path).await);
    }

    for _ in 0..back {
        let Some(path) = history.back() else {
            break;
        };
        log_navigation(&path, router.on_history_change().await);
    }

    let summary = serde_json::json!({
        "location": history.location(),
        "content": document.content(),
        "scripts": document.scripts(),
        "cached_pages": router.pages().keys(),
        "finished_at": chrono::Utc::now().to_rfc3339(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn log_navigation(path: &str, outcome: Result<Navigation, bizdesk_core::Error>) {
    match outcome {
        Ok(Navigation::Rendered { from_cache }) => tracing::info!(path, from_cache, "navigated"),
        Ok(outcome) => tracing::info!(path, ?outcome, "navigation skipped"),
        Err(err) => tracing::error!(path, error = %err, "navigation failed"),
    }
}
