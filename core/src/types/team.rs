//! Teams.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Award, District, Event, EventTeamStatus, Keyed, ListOptions, Listed, Match, Media, Robot, TeamKey};
use crate::cache::{CacheOptions, CacheToken};
use crate::client::Client;
use crate::error::ApiError;
use crate::fanout::Years;
use crate::transport::Transport;
use crate::url::RequestPath;

/// One team, keyed like `frc4099`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub key: String,
    #[serde(default)]
    pub team_number: u32,
    #[serde(default)]
    pub nickname: Option<String>,
    /// Official name, usually the sponsor list.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_prov: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub gmaps_place_id: Option<String>,
    #[serde(default)]
    pub gmaps_url: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rookie_year: Option<u16>,
    #[serde(default)]
    pub motto: Option<String>,
    /// Championship the team is assigned to, by year.
    #[serde(default)]
    pub home_championship: Option<Value>,
    #[serde(skip)]
    cache: CacheToken,
}

impl Team {
    /// Accepts `4099`, `"4099"` or `"frc4099"`.
    pub fn new(team: impl Into<TeamKey>) -> Self {
        let key = team.into();
        Self {
            team_number: key.number().unwrap_or_default(),
            key: key.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn etag(&self) -> Option<&str> {
        self.cache.current()
    }

    fn path(&self, endpoint: &str) -> RequestPath {
        team_path(&self.key, endpoint)
    }

    /// Events the team attended: every season when `years` is `None`,
    /// otherwise one sub-request per year in ascending order.
    pub async fn events<T: Transport>(
        &mut self,
        client: &Client<T>,
        years: Option<Years>,
        list: ListOptions,
        options: &CacheOptions,
    ) -> Result<Vec<Listed<Event>>, ApiError> {
        list.validate()?;
        let session = client.session();
        match years {
            None => {
                let path = list.apply(self.path("events"));
                session.fetch(&mut self.cache, options, path).await
            }
            Some(years) => {
                let key = self.key.clone();
                session
                    .fetch_years(&mut self.cache, options, &years, |year| {
                        list.apply(team_path(&key, "events").param("year", year))
                    })
                    .await
            }
        }
    }

    /// The team's status at each event of `year`, by event key.
    pub async fn event_statuses<T: Transport>(
        &mut self,
        client: &Client<T>,
        year: u16,
        options: &CacheOptions,
    ) -> Result<HashMap<String, EventTeamStatus>, ApiError> {
        let path = self.path("events").param("year", year).param("statuses", true);
        let statuses: HashMap<String, Option<EventTeamStatus>> =
            client.session().fetch(&mut self.cache, options, path).await?;
        Ok(statuses
            .into_iter()
            .filter_map(|(key, status)| status.map(|status| (key, status)))
            .collect())
    }

    pub async fn event_awards<T: Transport>(
        &mut self,
        client: &Client<T>,
        event_key: &str,
        options: &CacheOptions,
    ) -> Result<Vec<Award>, ApiError> {
        let path = self.event_path(event_key, "awards");
        client.session().fetch(&mut self.cache, options, path).await
    }

    pub async fn event_matches<T: Transport>(
        &mut self,
        client: &Client<T>,
        event_key: &str,
        list: ListOptions,
        options: &CacheOptions,
    ) -> Result<Vec<Listed<Match>>, ApiError> {
        list.validate()?;
        let path = list.apply(self.event_path(event_key, "matches"));
        client.session().fetch(&mut self.cache, options, path).await
    }

    /// `None` when the team has no status at the event.
    pub async fn event_status<T: Transport>(
        &mut self,
        client: &Client<T>,
        event_key: &str,
        options: &CacheOptions,
    ) -> Result<Option<EventTeamStatus>, ApiError> {
        let path = self.event_path(event_key, "status");
        client.session().fetch(&mut self.cache, options, path).await
    }

    fn event_path(&self, event_key: &str, endpoint: &str) -> RequestPath {
        self.path("event")
            .param("event_key", event_key)
            .param("sub_endpoint", endpoint)
    }

    /// Awards over the team's career, one season, or a span of seasons.
    /// A span is filtered from the career listing.
    pub async fn awards<T: Transport>(
        &mut self,
        client: &Client<T>,
        years: Option<Years>,
        options: &CacheOptions,
    ) -> Result<Vec<Award>, ApiError> {
        let single = match &years {
            Some(Years::Single(year)) => Some(*year),
            _ => None,
        };
        let path = self.path("awards").param("year", single);
        let awards: Vec<Award> = client.session().fetch(&mut self.cache, options, path).await?;
        Ok(match years {
            Some(span @ Years::Span(_)) => awards
                .into_iter()
                .filter(|award| award.year.is_some_and(|year| span.contains(year)))
                .collect(),
            _ => awards,
        })
    }

    pub async fn years_participated<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<Vec<u16>, ApiError> {
        let path = self.path("years_participated");
        client.session().fetch(&mut self.cache, options, path).await
    }

    pub async fn districts<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<Vec<District>, ApiError> {
        let path = self.path("districts");
        client.session().fetch(&mut self.cache, options, path).await
    }

    /// Matches played in `years`. `event_code` (like `iri`) keeps only the
    /// matches whose event key contains it.
    pub async fn matches<T: Transport>(
        &mut self,
        client: &Client<T>,
        years: impl Into<Years>,
        event_code: Option<&str>,
        list: ListOptions,
        options: &CacheOptions,
    ) -> Result<Vec<Listed<Match>>, ApiError> {
        list.validate()?;
        let years = years.into();
        let key = self.key.clone();
        let matches: Vec<Listed<Match>> = client
            .session()
            .fetch_years(&mut self.cache, options, &years, |year| {
                list.apply(team_path(&key, "matches").param("year", year))
            })
            .await?;

        let Some(code) = event_code else {
            return Ok(matches);
        };
        Ok(matches
            .into_iter()
            .filter(|m| match m {
                Listed::Key(key) => key.contains(code),
                Listed::Record(m) => m.event_key.as_deref().is_some_and(|key| key.contains(code)),
            })
            .collect())
    }

    /// Media for `years`, optionally only those carrying `tag`.
    pub async fn media<T: Transport>(
        &mut self,
        client: &Client<T>,
        years: impl Into<Years>,
        tag: Option<&str>,
        options: &CacheOptions,
    ) -> Result<Vec<Media>, ApiError> {
        let years = years.into();
        let key = self.key.clone();
        client
            .session()
            .fetch_years(&mut self.cache, options, &years, |year| {
                team_path(&key, "media")
                    .param("tag", tag.is_some())
                    .param("media_tag", tag)
                    .param("year", year)
            })
            .await
    }

    pub async fn robots<T: Transport>(&mut self, client: &Client<T>, options: &CacheOptions) -> Result<Vec<Robot>, ApiError> {
        let path = self.path("robots");
        client.session().fetch(&mut self.cache, options, path).await
    }

    pub async fn social_media<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<Vec<Media>, ApiError> {
        let path = self.path("social_media");
        client.session().fetch(&mut self.cache, options, path).await
    }
}

impl Keyed for Team {
    fn key(&self) -> &str {
        &self.key
    }
}

pub(crate) fn team_path(key: &str, endpoint: &str) -> RequestPath {
    RequestPath::new("team").param("key", key).param("endpoint", endpoint)
}
