//! Error types for the TBA API client.
//!
//! # Design
//! `Tba` and `NotModified` are kept apart because they classify the same
//! kind of round-trip differently: the first carries the message from the
//! service's structured `{"Error": ...}` body, the second means a conditional
//! GET matched the presented ETag. `InvalidArgument` is raised before any
//! request is built. Network failures land in `Transport` unclassified; no
//! variant is ever retried.

use thiserror::Error;

/// Errors returned by every fallible client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a structured error body.
    #[error("TBA error: {0}")]
    Tba(String),

    /// A conditional GET found the cached copy still valid (HTTP 304).
    #[error("content has not been modified since the presented ETag")]
    NotModified,

    /// Mutually exclusive flags, or flags that do not apply to the operation.
    #[error("invalid arguments: {0}")]
    InvalidArgument(String),

    /// The request never produced a response (connect, TLS, timeout, body read).
    #[error("transport failure: {0}")]
    Transport(String),

    /// A non-2xx status without a structured error body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Credentials or other settings are missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An aggregation had nothing to aggregate.
    #[error("no {0} data available")]
    NoData(String),
}

impl ApiError {
    pub fn is_not_modified(&self) -> bool {
        matches!(self, ApiError::NotModified)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}
