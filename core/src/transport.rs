//! Executing requests.
//!
//! # Design
//! [`Transport`] is the only place the network is touched. Everything above
//! it builds [`HttpRequest`] values and classifies [`HttpResponse`] values,
//! so tests swap in a stub and the classification rules stay pure.
//!
//! [`ReqwestTransport`] owns the session: one `reqwest::Client` (and its
//! connection pool), opened lazily on the first request and reused by every
//! request after it. `close` releases it; closing twice is a no-op.

use std::future::Future;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::{debug, trace, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations return `Ok` for any response the server produced,
/// whatever its status; only failures to obtain a response are errors.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;

    /// Releases the underlying session. Called exactly once by the owning
    /// client, from its `Drop`.
    fn close(&mut self) {}
}

/// Transport backed by a lazily created `reqwest::Client`.
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    session: OnceCell<reqwest::Client>,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            session: OnceCell::new(),
            timeout,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.get().is_some()
    }

    fn session(&self) -> Result<&reqwest::Client, ApiError> {
        self.session.get_or_try_init(|| {
            debug!(timeout = ?self.timeout, "opening HTTP session");
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            builder
                .build()
                .map_err(|e| ApiError::Transport(format!("failed to create HTTP session: {e}")))
        })
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let session = self.session()?;
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = session.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(
                url = %request.url,
                error = %e,
                is_connect = e.is_connect(),
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

        trace!(url = %request.url, status, bytes = body.len(), "HTTP response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn close(&mut self) {
        if self.session.take().is_some() {
            debug!("HTTP session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_opens_lazily_and_once() {
        let transport = ReqwestTransport::new(None);
        assert!(!transport.is_open());

        let first = transport.session().unwrap() as *const reqwest::Client;
        let second = transport.session().unwrap() as *const reqwest::Client;
        assert_eq!(first, second);
        assert!(transport.is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let mut transport = ReqwestTransport::new(Some(Duration::from_secs(5)));
        transport.session().unwrap();
        transport.close();
        assert!(!transport.is_open());
        transport.close();
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new(Some(Duration::from_secs(5)));
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: format!("http://{addr}/api/v3/status"),
            headers: Vec::new(),
            body: None,
        };
        let err = transport.execute(request).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
