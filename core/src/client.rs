//! Top-level client and the queries that are not scoped to one entity.
//!
//! # Design
//! `Client` owns one [`Session`] and with it the network session, opened on
//! the first request and released exactly once when the client is closed or
//! dropped. The client is itself a cache-bearing entity: top-level queries
//! share its [`CacheToken`]. Operations that mutate that token take
//! `&mut self`, so one client cannot run two caching queries at once.
//!
//! Entities ([`Team`], [`Event`], [`District`]) borrow the client for each
//! call and keep their own tokens.

use serde_json::Value;

use crate::cache::{settle_sub_request, with_caching, CacheOptions, CacheToken, Fetched};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::fanout::{gather_pages, gather_years, unique_sorted_by_key, Years};
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    team_number, ApiStatus, District, Event, ListOptions, Listed, Match, Team, TeamKey, ZebraMotionworks,
};
use crate::url::RequestPath;

/// Filters for the team listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamsQuery {
    /// One page of up to 500 teams. `None` sweeps every page.
    pub page: Option<u32>,
    /// Teams active in these seasons. A span merges the per-year listings
    /// into one list, unique and sorted by team number.
    pub years: Option<Years>,
    pub list: ListOptions,
}

impl TeamsQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn years(mut self, years: impl Into<Years>) -> Self {
        self.years = Some(years.into());
        self
    }

    pub fn list(mut self, list: ListOptions) -> Self {
        self.list = list;
        self
    }
}

pub struct Client<T: Transport = ReqwestTransport> {
    session: Session<T>,
    cache: CacheToken,
}

impl Client<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = ReqwestTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }

    /// Client keyed from `TBA_API_KEY` (or `API_KEY`).
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            session: Session::new(config, transport),
            cache: CacheToken::new(),
        }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        self.session.config()
    }

    /// ETag stored by the last caching top-level query.
    pub fn etag(&self) -> Option<&str> {
        self.cache.current()
    }

    /// Releases the network session. Dropping the client does the same.
    pub fn close(self) {}

    pub async fn status(&mut self, options: &CacheOptions) -> Result<Option<ApiStatus>, ApiError> {
        self.session
            .fetch(&mut self.cache, options, RequestPath::new("status"))
            .await
    }

    pub async fn districts(&mut self, year: u16, options: &CacheOptions) -> Result<Vec<District>, ApiError> {
        let path = RequestPath::new("districts").param("year", year);
        self.session.fetch(&mut self.cache, options, path).await
    }

    pub async fn event(&mut self, key: &str, simple: bool, options: &CacheOptions) -> Result<Option<Event>, ApiError> {
        let path = RequestPath::new("event").param("key", key).param("simple", simple);
        self.session.fetch(&mut self.cache, options, path).await
    }

    /// Events of one season, or of a span of seasons in ascending year order.
    pub async fn events(
        &mut self,
        years: impl Into<Years>,
        list: ListOptions,
        options: &CacheOptions,
    ) -> Result<Vec<Listed<Event>>, ApiError> {
        list.validate()?;
        let years = years.into();
        self.session
            .fetch_years(&mut self.cache, options, &years, |year| {
                list.apply(RequestPath::new("events").param("year", year))
            })
            .await
    }

    pub async fn match_(&mut self, key: &str, simple: bool, options: &CacheOptions) -> Result<Option<Match>, ApiError> {
        let path = RequestPath::new("match").param("key", key).param("simple", simple);
        self.session.fetch(&mut self.cache, options, path).await
    }

    /// Raw timeseries frames. The service marks this data as experimental.
    pub async fn match_timeseries(&mut self, key: &str, options: &CacheOptions) -> Result<Vec<Value>, ApiError> {
        let path = RequestPath::new("match").param("key", key).param("timeseries", true);
        self.session.fetch(&mut self.cache, options, path).await
    }

    /// `None` when the match was not tracked.
    pub async fn match_zebra(
        &mut self,
        key: &str,
        options: &CacheOptions,
    ) -> Result<Option<ZebraMotionworks>, ApiError> {
        let path = RequestPath::new("match")
            .param("key", key)
            .param("zebra_motionworks", true);
        self.session.fetch(&mut self.cache, options, path).await
    }

    pub async fn team(
        &mut self,
        team: impl Into<TeamKey>,
        simple: bool,
        options: &CacheOptions,
    ) -> Result<Option<Team>, ApiError> {
        let path = RequestPath::new("team")
            .param("key", team.into().as_str())
            .param("simple", simple);
        self.session.fetch(&mut self.cache, options, path).await
    }

    /// The team listing.
    ///
    /// A page issues one request; no page sweeps pages 0 through 19
    /// concurrently. A span of years repeats that per year and merges the
    /// results unique by key, sorted by team number.
    pub async fn teams(&mut self, query: TeamsQuery, options: &CacheOptions) -> Result<Vec<Listed<Team>>, ApiError> {
        query.list.validate()?;
        let TeamsQuery { page, years, list } = query;
        let session = &self.session;

        let year = match years {
            Some(years @ Years::Span(_)) => {
                let teams = with_caching(&mut self.cache, options, |etag| async move {
                    gather_years(&years, |year| {
                        team_listing(session, Some(year), page, list, etag.as_deref(), options.silent)
                    })
                    .await
                })
                .await?;
                return Ok(unique_sorted_by_key(teams, |team| {
                    (team_number(team.key()).unwrap_or(u32::MAX), team.key().to_string())
                }));
            }
            Some(Years::Single(year)) => Some(year),
            None => None,
        };

        with_caching(&mut self.cache, options, |etag| async move {
            team_listing(session, year, page, list, etag.as_deref(), options.silent).await
        })
        .await
    }
}

impl<T: Transport> Drop for Client<T> {
    fn drop(&mut self) {
        self.session.close();
    }
}

async fn team_listing<T: Transport>(
    session: &Session<T>,
    year: Option<u16>,
    page: Option<u32>,
    list: ListOptions,
    etag: Option<&str>,
    silent: bool,
) -> Result<Fetched<Vec<Listed<Team>>>, ApiError> {
    let path_for = |page: u32| list.apply(RequestPath::new("teams").param("year", year).param("page", page));
    match page {
        Some(page) => settle_sub_request(session.get_as(&path_for(page), etag).await, silent),
        None => {
            gather_pages(|page| {
                let path = path_for(page);
                async move { settle_sub_request(session.get_as(&path, etag).await, silent) }
            })
            .await
        }
    }
}
