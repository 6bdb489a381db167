//! HTTP transport types.
//!
//! # Design
//! Requests and responses are plain data. The session builds `HttpRequest`
//! values and classifies `HttpResponse` values without touching the network;
//! a [`Transport`](crate::transport::Transport) executes the round-trip in
//! between. Keeping both ends pure lets the classification rules (304, error
//! bodies, ETag capture) be tested without a server.

/// Header carrying the read API key on every GET.
pub const AUTH_KEY_HEADER: &str = "X-TBA-Auth-Key";
/// Header carrying a previously seen ETag on conditional GETs.
pub const IF_NONE_MATCH_HEADER: &str = "If-None-Match";
/// Response header carrying the cache-validation token.
pub const ETAG_HEADER: &str = "ETag";
/// Trusted-write identifier header.
pub const AUTH_ID_HEADER: &str = "X-TBA-Auth-Id";
/// Trusted-write signature header.
pub const AUTH_SIG_HEADER: &str = "X-TBA-Auth-Sig";

/// HTTP method for a request. The API only ever reads with GET and writes
/// with POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
