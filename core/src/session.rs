//! Authenticated request building and response classification.
//!
//! # Design
//! `Session` pairs the client configuration with the transport that owns
//! the network session. Each operation is split into a pure `build_*`
//! method that produces an [`HttpRequest`] and a pure `parse_*` method that
//! classifies the [`HttpResponse`]; `get` and `post` run the round-trip in
//! between.
//!
//! GET responses are classified in this order:
//! 1. 304: [`ApiError::NotModified`], the body is never read.
//! 2. A JSON object with a non-empty string `Error` field: [`ApiError::Tba`].
//! 3. Any other non-2xx: [`ApiError::Http`].
//! 4. An unparsable 2xx body: [`ApiError::Deserialization`].

use md5::{Digest, Md5};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::cache::{settle_sub_request, with_caching, CacheOptions, CacheToken, EmptyShape, Fetched};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::fanout::{gather_years, Years};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, AUTH_ID_HEADER, AUTH_KEY_HEADER, AUTH_SIG_HEADER,
    ETAG_HEADER, IF_NONE_MATCH_HEADER,
};
use crate::transport::Transport;
use crate::url::RequestPath;

/// Path prefix of the trusted write API.
pub const TRUSTED_ROOT: &str = "/api/trusted/v1";

pub struct Session<T> {
    config: ClientConfig,
    read_root: String,
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            read_root: config.read_root(),
            config,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn close(&mut self) {
        self.transport.close();
    }

    /// GET against the read API, conditional when `etag` is given.
    pub fn build_get(&self, path: &RequestPath, etag: Option<&str>) -> HttpRequest {
        let mut headers = vec![(AUTH_KEY_HEADER.to_string(), self.config.api_key.clone())];
        if let Some(etag) = etag.filter(|etag| !etag.is_empty()) {
            headers.push((IF_NONE_MATCH_HEADER.to_string(), etag.to_string()));
        }
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/{}", self.read_root, path.build()),
            headers,
            body: None,
        }
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<Fetched<Value>, ApiError> {
        if response.status == 304 {
            return Err(ApiError::NotModified);
        }

        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) if response.is_success() => return Err(ApiError::Deserialization(e.to_string())),
            Err(_) => return Err(http_error(response)),
        };
        if let Some(message) = error_message(&body) {
            return Err(ApiError::Tba(message));
        }
        if !response.is_success() {
            return Err(http_error(response));
        }

        let etag = response.header(ETAG_HEADER).map(str::to_string);
        Ok(Fetched::new(body, etag))
    }

    pub async fn get(&self, path: &RequestPath, etag: Option<&str>) -> Result<Fetched<Value>, ApiError> {
        let request = self.build_get(path, etag);
        debug!(url = %request.url, conditional = request.header(IF_NONE_MATCH_HEADER).is_some(), "GET");
        let response = self.transport.execute(request).await?;
        trace!(path = %path, status = response.status, "GET response");
        self.parse_get(response)
    }

    /// GET and deserialize the payload into `D`.
    pub async fn get_as<D: DeserializeOwned>(
        &self,
        path: &RequestPath,
        etag: Option<&str>,
    ) -> Result<Fetched<D>, ApiError> {
        self.get(path, etag)
            .await?
            .try_map(|body| serde_json::from_value(body).map_err(ApiError::from))
    }

    /// [`get_as`](Self::get_as) wrapped in the caching policy of `options`,
    /// against the entity state in `token`.
    pub async fn fetch<D>(&self, token: &mut CacheToken, options: &CacheOptions, path: RequestPath) -> Result<D, ApiError>
    where
        D: DeserializeOwned + EmptyShape,
    {
        with_caching(token, options, |etag| async move {
            self.get_as(&path, etag.as_deref()).await
        })
        .await
    }

    /// One cached fetch spanning `years`: a sub-request per year, run
    /// concurrently and flattened in year order. Every sub-request presents
    /// the same ETag. In silent mode a year answered not-modified contributes
    /// nothing while the other years keep their data.
    pub async fn fetch_years<D, F>(
        &self,
        token: &mut CacheToken,
        options: &CacheOptions,
        years: &Years,
        path_for: F,
    ) -> Result<Vec<D>, ApiError>
    where
        D: DeserializeOwned,
        F: Fn(u16) -> RequestPath,
    {
        with_caching(token, options, |etag| async move {
            gather_years(years, |year| {
                let path = path_for(year);
                let etag = etag.as_deref();
                async move { settle_sub_request(self.get_as::<Vec<D>>(&path, etag).await, options.silent) }
            })
            .await
        })
        .await
    }

    /// Signed POST against the trusted API. `path` starts with
    /// [`TRUSTED_ROOT`].
    pub fn build_post<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let signature = sign(&self.config.auth_secret, path, &body);
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{}", self.config.origin, path),
            headers: vec![
                (AUTH_ID_HEADER.to_string(), self.config.auth_id.clone()),
                (AUTH_SIG_HEADER.to_string(), signature),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        })
    }

    pub fn parse_post(&self, response: HttpResponse) -> Result<(), ApiError> {
        if response.is_success() {
            return Ok(());
        }
        let message = serde_json::from_str::<Value>(&response.body)
            .ok()
            .and_then(|body| error_message(&body));
        match message {
            Some(message) => Err(ApiError::Tba(message)),
            None => Err(http_error(response)),
        }
    }

    pub async fn post<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<(), ApiError> {
        let request = self.build_post(path, payload)?;
        debug!(url = %request.url, "POST");
        let response = self.transport.execute(request).await?;
        self.parse_post(response)
    }
}

/// `md5_hex(secret + path + body)`, the trusted API's request signature.
pub fn sign(secret: &str, path: &str, body: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

fn error_message(body: &Value) -> Option<String> {
    body.as_object()?
        .get("Error")?
        .as_str()
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

fn http_error(response: HttpResponse) -> ApiError {
    ApiError::Http {
        status: response.status,
        body: response.body,
    }
}
