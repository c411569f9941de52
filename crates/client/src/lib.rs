//! Client layer for the bizdesk mini app.
//!
//! This crate provides the cached API client, the client-side page router
//! and the transport and host seams both depend on.

pub mod api;
pub mod context;
pub mod host;
pub mod page;
pub mod router;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiConfig, RequestOptions};
pub use context::AppContext;
pub use host::{Host, LogHost};
pub use page::{ParsedPage, parse_page};
pub use router::{
    Document, HeadlessDocument, History, MemoryHistory, Navigation, PageInit, PageRegistry, PageRouter, RouteTable,
    RouterOptions,
};
pub use session::{INIT_DATA_HEADER, SessionIdentity};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport, TransportConfig, resolve, send_with_deadline};

pub use reqwest::header::HeaderMap;
pub use reqwest::{Method, StatusCode};
