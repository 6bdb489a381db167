//! Districts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{null_as_default, split_season_key, Event, Keyed, ListOptions, Listed, Team};
use crate::cache::{CacheOptions, CacheToken};
use crate::client::Client;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::url::RequestPath;

/// A district for one season, keyed like `2022ne`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub key: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(skip)]
    cache: CacheToken,
}

/// A team's standing in the district points race.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictRanking {
    pub team_key: String,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub rookie_bonus: i32,
    #[serde(default)]
    pub other_bonus: Option<i32>,
    #[serde(default)]
    pub point_total: i32,
    /// Per-event breakdown.
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_points: Vec<Value>,
}

impl District {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let (year, abbreviation) = split_season_key(&key);
        Self {
            abbreviation: Some(abbreviation).filter(|a| !a.is_empty()),
            year,
            key,
            ..Self::default()
        }
    }

    pub fn from_parts(year: u16, abbreviation: &str) -> Self {
        Self::new(format!("{year}{abbreviation}"))
    }

    pub fn etag(&self) -> Option<&str> {
        self.cache.current()
    }

    fn path(&self, endpoint: &str) -> RequestPath {
        RequestPath::new("district")
            .param("key", &self.key)
            .param("endpoint", endpoint)
    }

    pub async fn events<T: Transport>(
        &mut self,
        client: &Client<T>,
        list: ListOptions,
        options: &CacheOptions,
    ) -> Result<Vec<Listed<Event>>, ApiError> {
        list.validate()?;
        let path = list.apply(self.path("events"));
        client.session().fetch(&mut self.cache, options, path).await
    }

    pub async fn teams<T: Transport>(
        &mut self,
        client: &Client<T>,
        list: ListOptions,
        options: &CacheOptions,
    ) -> Result<Vec<Listed<Team>>, ApiError> {
        list.validate()?;
        let path = list.apply(self.path("teams"));
        client.session().fetch(&mut self.cache, options, path).await
    }

    /// Empty before the district has rankings.
    pub async fn rankings<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<Vec<DistrictRanking>, ApiError> {
        let path = self.path("rankings");
        let rankings: Option<Vec<DistrictRanking>> = client.session().fetch(&mut self.cache, options, path).await?;
        Ok(rankings.unwrap_or_default())
    }
}

impl Keyed for District {
    fn key(&self) -> &str {
        &self.key
    }
}
