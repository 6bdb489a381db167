//! ETag-based conditional retrieval.
//!
//! # Design
//! Every cache-bearing entity owns one [`CacheToken`]. A fetch is wrapped by
//! [`with_caching`], which decides which token to present, stores the
//! response's token when the call asked for caching, and turns a not-modified
//! answer into either [`ApiError::NotModified`] or an empty value of the
//! operation's result shape ([`EmptyShape`]).
//!
//! Per-instance state moves linearly: no token, then the token of the last
//! successful caching fetch. A call-level `etag` is presented for that call
//! only and never written back unless the same call also enables caching and
//! the response carries a token.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::hash::{BuildHasher, Hash};

use tracing::debug;

use crate::error::ApiError;

/// Per-entity storage for the last seen ETag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheToken {
    etag: Option<String>,
}

impl CacheToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    fn store(&mut self, etag: String) {
        debug!(%etag, "cache token updated");
        self.etag = Some(etag);
    }
}

/// Per-call caching behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Store the response's ETag on the entity after a successful call.
    pub use_caching: bool,
    /// Present this ETag instead of the stored one, for this call only.
    pub etag: Option<String>,
    /// Return an empty result instead of raising on not-modified.
    pub silent: bool,
}

impl CacheOptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn caching() -> Self {
        Self {
            use_caching: true,
            ..Self::default()
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// A decoded payload together with the ETag its response carried.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<D> {
    pub data: D,
    pub etag: Option<String>,
}

impl<D> Fetched<D> {
    pub fn new(data: D, etag: Option<String>) -> Self {
        Self { data, etag }
    }

    pub fn try_map<E>(self, f: impl FnOnce(D) -> Result<E, ApiError>) -> Result<Fetched<E>, ApiError> {
        Ok(Fetched {
            data: f(self.data)?,
            etag: self.etag,
        })
    }
}

/// The value a silent not-modified fetch resolves to.
///
/// Sequences resolve to an empty sequence, mappings to an empty mapping and
/// single records (`Option`) to `None`.
pub trait EmptyShape {
    fn empty() -> Self;
}

impl<T> EmptyShape for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }
}

impl<K: Eq + Hash, V, S: BuildHasher + Default> EmptyShape for HashMap<K, V, S> {
    fn empty() -> Self {
        HashMap::default()
    }
}

impl<K: Ord, V> EmptyShape for BTreeMap<K, V> {
    fn empty() -> Self {
        BTreeMap::new()
    }
}

impl<T> EmptyShape for Option<T> {
    fn empty() -> Self {
        None
    }
}

impl EmptyShape for serde_json::Value {
    fn empty() -> Self {
        serde_json::Value::Object(serde_json::Map::new())
    }
}

/// Applies the silent policy to one sub-request of a fan-out.
///
/// With `silent` set, a not-modified sub-request contributes an empty result
/// and no token, so the other sub-requests' data survives. Otherwise the
/// outcome passes through and a not-modified answer fails the gather.
pub(crate) fn settle_sub_request<D: EmptyShape>(
    outcome: Result<Fetched<D>, ApiError>,
    silent: bool,
) -> Result<Fetched<D>, ApiError> {
    match outcome {
        Err(ApiError::NotModified) if silent => {
            debug!("sub-request not modified; contributing nothing");
            Ok(Fetched::new(D::empty(), None))
        }
        other => other,
    }
}

/// Runs `operation` with the ETag to present and applies the caching policy
/// to its outcome.
pub async fn with_caching<D, F, Fut>(
    token: &mut CacheToken,
    options: &CacheOptions,
    operation: F,
) -> Result<D, ApiError>
where
    D: EmptyShape,
    F: FnOnce(Option<String>) -> Fut,
    Fut: Future<Output = Result<Fetched<D>, ApiError>>,
{
    let presented = options
        .etag
        .clone()
        .or_else(|| token.current().map(str::to_string));

    match operation(presented).await {
        Ok(fetched) => {
            if options.use_caching {
                if let Some(etag) = fetched.etag {
                    token.store(etag);
                }
            }
            Ok(fetched.data)
        }
        Err(ApiError::NotModified) if options.silent => {
            debug!("not modified; returning empty result");
            Ok(D::empty())
        }
        Err(err) => Err(err),
    }
}
