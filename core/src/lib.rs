//! Typed asynchronous client for The Blue Alliance REST API.
//!
//! # Overview
//! [`Client`] reads the public `/api/v3` surface with an API key and writes
//! the trusted `/api/trusted/v1` surface with MD5-signed requests. Results
//! decode into the records of [`types`]; the cache-bearing entities
//! ([`Team`], [`Event`], [`District`]) expose their sub-resources as async
//! methods taking the client.
//!
//! # Design
//! - [`Session`] splits every call into a pure `build_*` step producing an
//!   [`HttpRequest`] and a pure `parse_*` step classifying an
//!   [`HttpResponse`]. Only the [`Transport`] touches the network, so every
//!   operation is testable against a stub.
//! - Each cache-bearing value owns its ETag ([`cache`]). [`CacheOptions`]
//!   decides per call whether to store it, override it and how to treat a
//!   not-modified answer.
//! - Queries spanning several seasons or listing pages fan out concurrently
//!   and merge in input order ([`fanout`]).
//! - Records are defined independently from the mock server; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fanout;
pub mod http;
pub mod metrics;
pub mod session;
pub mod transport;
pub mod types;
pub mod url;

#[cfg(test)]
mod testing;

pub use cache::{CacheOptions, CacheToken, EmptyShape, Fetched};
pub use client::{Client, TeamsQuery};
pub use config::ClientConfig;
pub use error::ApiError;
pub use fanout::Years;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use metrics::{Extremum, Metric};
pub use session::{sign, Session};
pub use transport::{ReqwestTransport, Transport};
pub use types::*;
pub use url::RequestPath;
