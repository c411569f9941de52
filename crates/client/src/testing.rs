//! In-memory transport and host doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use bizdesk_core::Error;

use crate::host::Host;
use crate::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: String, delay: Option<Duration> },
    Fail(String),
    Hang,
}

/// A request as seen by the mock.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path plus query, e.g. `/api/tasks?status=done`.
    pub target: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Transport answering from a route table keyed by path and query.
///
/// Unknown targets answer 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<Recorded>>,
}

fn target_of(request: &HttpRequest) -> String {
    match request.url.query() {
        Some(query) => format!("{}?{}", request.url.path(), query),
        None => request.url.path().to_string(),
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, target: &str, status: u16, body: &str) -> Self {
        self.set_route(target, status, body);
        self
    }

    pub fn delayed(self, target: &str, status: u16, body: &str, delay: Duration) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(target.to_string(), Reply::Respond { status, body: body.to_string(), delay: Some(delay) });
        self
    }

    pub fn failing(self, target: &str, message: &str) -> Self {
        self.routes.lock().unwrap().insert(target.to_string(), Reply::Fail(message.to_string()));
        self
    }

    pub fn hang(self, target: &str) -> Self {
        self.routes.lock().unwrap().insert(target.to_string(), Reply::Hang);
        self
    }

    /// Replace a route while the transport is shared.
    pub fn set_route(&self, target: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(target.to_string(), Reply::Respond { status, body: body.to_string(), delay: None });
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made to `target`.
    pub fn hits(&self, target: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.target == target).count()
    }

    pub fn total_hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let target = target_of(&request);
        self.requests.lock().unwrap().push(Recorded {
            method: request.method.clone(),
            target: target.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        let reply = self.routes.lock().unwrap().get(&target).cloned();
        match reply {
            Some(Reply::Respond { status, body, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse {
                    status: StatusCode::from_u16(status).unwrap(),
                    headers: HeaderMap::new(),
                    body: Bytes::from(body),
                    fetch_ms: 0,
                })
            }
            Some(Reply::Fail(message)) => Err(Error::Transport(message)),
            Some(Reply::Hang) => std::future::pending().await,
            None => Ok(HttpResponse {
                status: StatusCode::NOT_FOUND,
                headers: HeaderMap::new(),
                body: Bytes::from_static(b"not found"),
                fetch_ms: 0,
            }),
        }
    }
}

/// Host double recording every capability call.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Host for RecordingHost {
    fn ready(&self) {
        self.calls.lock().unwrap().push("ready".into());
    }

    fn expand(&self) {
        self.calls.lock().unwrap().push("expand".into());
    }

    fn alert(&self, message: &str) {
        self.calls.lock().unwrap().push(format!("alert:{message}"));
    }

    fn open_external(&self, url: &str) {
        self.calls.lock().unwrap().push(format!("open:{url}"));
    }
}
