//! Canned-response transport for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ETAG_HEADER, IF_NONE_MATCH_HEADER};
use crate::transport::Transport;
use crate::Client;

pub(crate) const STUB_ORIGIN: &str = "https://stub.test";

#[derive(Debug, Clone)]
enum Outcome {
    Respond { status: u16, body: String },
    Fail,
}

#[derive(Debug, Clone)]
struct Route {
    outcome: Outcome,
    etag: Option<String>,
    delay: Option<Duration>,
}

/// Serves canned responses keyed by URL path (from `/api/` on), counts
/// calls and records every request it sees.
#[derive(Debug, Default)]
pub(crate) struct StubTransport {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<HttpRequest>>,
    closes: Arc<AtomicUsize>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 200 with `body` for GET `/api/v3/{path}`.
    pub fn get(self, path: &str, body: Value) -> Self {
        self.insert(read_key(path), Outcome::Respond { status: 200, body: body.to_string() }, None)
    }

    /// Like [`get`](Self::get), answering 304 when the request presents `etag`.
    pub fn get_with_etag(self, path: &str, body: Value, etag: &str) -> Self {
        self.insert(
            read_key(path),
            Outcome::Respond { status: 200, body: body.to_string() },
            Some(etag.to_string()),
        )
    }

    pub fn get_status(self, path: &str, status: u16, body: &str) -> Self {
        self.insert(read_key(path), Outcome::Respond { status, body: body.to_string() }, None)
    }

    /// The GET never produces a response.
    pub fn get_fails(self, path: &str) -> Self {
        self.insert(read_key(path), Outcome::Fail, None)
    }

    /// Status and body for POST to the full trusted path.
    pub fn post_status(self, path: &str, status: u16, body: &str) -> Self {
        self.insert(path.to_string(), Outcome::Respond { status, body: body.to_string() }, None)
    }

    pub fn delay(self, path: &str, delay: Duration) -> Self {
        if let Some(route) = self.routes.lock().unwrap().get_mut(&read_key(path)) {
            route.delay = Some(delay);
        }
        self
    }

    fn insert(self, key: String, outcome: Outcome, etag: Option<String>) -> Self {
        self.routes.lock().unwrap().insert(key, Route { outcome, etag, delay: None });
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths of the recorded requests, relative to the read root.
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| path_key(&r.url).trim_start_matches("/api/v3/").to_string())
            .collect()
    }

    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

fn read_key(path: &str) -> String {
    format!("/api/v3/{path}")
}

fn path_key(url: &str) -> &str {
    url.find("/api/").map_or(url, |idx| &url[idx..])
}

impl Transport for StubTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let key = path_key(&request.url).to_string();
        let route = self.routes.lock().unwrap().get(&key).cloned();
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = route.as_ref().and_then(|r| r.delay) {
            tokio::time::sleep(delay).await;
        }

        let Some(route) = route else {
            return Ok(match request.method {
                HttpMethod::Post => HttpResponse {
                    status: 200,
                    headers: Vec::new(),
                    body: r#"{"Success":"ok"}"#.to_string(),
                },
                HttpMethod::Get => HttpResponse {
                    status: 404,
                    headers: Vec::new(),
                    body: serde_json::json!({ "Error": format!("no stub for {key}") }).to_string(),
                },
            });
        };

        match route.outcome {
            Outcome::Fail => Err(ApiError::Transport(format!("connection refused: {key}"))),
            Outcome::Respond { status, body } => {
                if let Some(etag) = &route.etag {
                    if request.header(IF_NONE_MATCH_HEADER) == Some(etag.as_str()) {
                        return Ok(HttpResponse {
                            status: 304,
                            headers: vec![(ETAG_HEADER.to_string(), etag.clone())],
                            body: String::new(),
                        });
                    }
                }
                let headers = route
                    .etag
                    .iter()
                    .map(|etag| (ETAG_HEADER.to_string(), etag.clone()))
                    .collect();
                Ok(HttpResponse { status, headers, body })
            }
        }
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn stub_config() -> ClientConfig {
    ClientConfig::new("test-key")
        .with_origin(STUB_ORIGIN)
        .with_trusted_auth("test-id", "s3cret")
}

pub(crate) fn stub_client(transport: StubTransport) -> Client<StubTransport> {
    Client::with_transport(stub_config(), transport)
}
