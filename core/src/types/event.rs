//! Events, their sub-resources and trusted writes.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    null_as_default, split_season_key, Award, District, EventTeamStatus, Keyed, ListOptions, Listed, Match,
    NamedStats, Record, StatInfo, Team,
};
use crate::cache::{CacheOptions, CacheToken};
use crate::client::Client;
use crate::error::ApiError;
use crate::metrics::{mean, Metric};
use crate::session::TRUSTED_ROOT;
use crate::transport::Transport;
use crate::url::RequestPath;

/// One event, keyed like `2022iri`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub event_code: Option<String>,
    #[serde(default)]
    pub event_type: Option<i32>,
    #[serde(default)]
    pub district: Option<District>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_prov: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub event_type_string: Option<String>,
    /// Zero-based competition week; `None` for offseason and championship.
    #[serde(default)]
    pub week: Option<u32>,
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
    pub timezone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub first_event_id: Option<String>,
    #[serde(default)]
    pub first_event_code: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub webcasts: Vec<Webcast>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub division_keys: Vec<String>,
    #[serde(default)]
    pub parent_event_key: Option<String>,
    #[serde(default)]
    pub playoff_type: Option<i32>,
    #[serde(default)]
    pub playoff_type_string: Option<String>,
    #[serde(skip)]
    cache: CacheToken,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webcast {
    /// `youtube`, `twitch`, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub file: Option<String>,
}

/// A playoff alliance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventAlliance {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub backup: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub declines: Vec<String>,
    /// Captain first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub picks: Vec<String>,
    #[serde(default)]
    pub status: Option<AllianceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllianceStatus {
    #[serde(default)]
    pub playoff_average: Option<f64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub record: Option<Record>,
    #[serde(default)]
    pub current_level_record: Option<Record>,
    #[serde(default)]
    pub status: Option<String>,
}

/// District points earned at the event, per team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictPoints {
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: HashMap<String, HashMap<String, i64>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tiebreakers: HashMap<String, Value>,
}

/// Year-specific aggregate statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub qual: Option<Value>,
    #[serde(default)]
    pub playoff: Option<Value>,
}

/// OPR, DPR and CCWM per team key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Oprs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub oprs: HashMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dprs: HashMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ccwms: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OprAverages {
    pub opr: f64,
    pub dpr: f64,
    pub ccwm: f64,
}

impl Oprs {
    /// Values of one OPR-family metric.
    pub fn values(&self, metric: Metric) -> Result<&HashMap<String, f64>, ApiError> {
        match metric {
            Metric::Opr => Ok(&self.oprs),
            Metric::Dpr => Ok(&self.dprs),
            Metric::Ccwm => Ok(&self.ccwms),
            Metric::MatchScore => Err(ApiError::InvalidArgument(
                "match score is not an OPR metric".to_string(),
            )),
        }
    }

    pub fn average(&self, metric: Metric) -> Result<f64, ApiError> {
        mean(self.values(metric)?.values().copied(), metric.name())
    }

    pub fn averages(&self) -> Result<OprAverages, ApiError> {
        Ok(OprAverages {
            opr: self.average(Metric::Opr)?,
            dpr: self.average(Metric::Dpr)?,
            ccwm: self.average(Metric::Ccwm)?,
        })
    }
}

/// A team's qualification ranking, statistics named by the event's info
/// tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRanking {
    pub team_key: String,
    pub rank: Option<u32>,
    pub dq: Option<u32>,
    pub matches_played: Option<u32>,
    pub qual_average: Option<f64>,
    pub record: Option<Record>,
    pub extra_stats: NamedStats,
    pub sort_orders: NamedStats,
}

#[derive(Debug, Deserialize)]
struct RankingTable {
    #[serde(default, deserialize_with = "null_as_default")]
    rankings: Vec<RankingRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    extra_stats_info: Vec<StatInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    sort_order_info: Vec<StatInfo>,
}

#[derive(Debug, Deserialize)]
struct RankingRow {
    team_key: String,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    dq: Option<u32>,
    #[serde(default)]
    matches_played: Option<u32>,
    #[serde(default)]
    qual_average: Option<f64>,
    #[serde(default)]
    record: Option<Record>,
    #[serde(default, deserialize_with = "null_as_default")]
    extra_stats: Vec<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    sort_orders: Vec<f64>,
}

impl RankingTable {
    fn into_rankings(self) -> HashMap<String, EventRanking> {
        let RankingTable {
            rankings,
            extra_stats_info,
            sort_order_info,
        } = self;
        rankings
            .into_iter()
            .map(|row| {
                let ranking = EventRanking {
                    extra_stats: NamedStats::zip(&row.extra_stats, &extra_stats_info),
                    sort_orders: NamedStats::zip(&row.sort_orders, &sort_order_info),
                    team_key: row.team_key.clone(),
                    rank: row.rank,
                    dq: row.dq,
                    matches_played: row.matches_played,
                    qual_average: row.qual_average,
                    record: row.record,
                };
                (row.team_key, ranking)
            })
            .collect()
    }
}

impl Event {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let (year, code) = split_season_key(&key);
        Self {
            event_code: Some(code).filter(|c| !c.is_empty()),
            year,
            key,
            ..Self::default()
        }
    }

    pub fn from_parts(year: u16, event_code: &str) -> Self {
        Self::new(format!("{year}{event_code}"))
    }

    pub fn etag(&self) -> Option<&str> {
        self.cache.current()
    }

    pub(crate) fn path(&self, endpoint: &str) -> RequestPath {
        event_path(&self.key, endpoint)
    }

    /// Empty before alliance selection.
    pub async fn alliances<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<Vec<EventAlliance>, ApiError> {
        let alliances: Option<Vec<EventAlliance>> = client
            .session()
            .fetch(&mut self.cache, options, event_path(&self.key, "alliances"))
            .await?;
        Ok(alliances.unwrap_or_default())
    }

    pub async fn awards<T: Transport>(&mut self, client: &Client<T>, options: &CacheOptions) -> Result<Vec<Award>, ApiError> {
        client.session().fetch(&mut self.cache, options, event_path(&self.key, "awards")).await
    }

    pub async fn district_points<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<Option<DistrictPoints>, ApiError> {
        client
            .session()
            .fetch(&mut self.cache, options, event_path(&self.key, "district_points"))
            .await
    }

    pub async fn insights<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<Option<Insights>, ApiError> {
        client.session().fetch(&mut self.cache, options, event_path(&self.key, "insights")).await
    }

    pub async fn matches<T: Transport>(
        &mut self,
        client: &Client<T>,
        list: ListOptions,
        options: &CacheOptions,
    ) -> Result<Vec<Listed<Match>>, ApiError> {
        list.validate()?;
        let path = list.apply(self.path("matches"));
        client.session().fetch(&mut self.cache, options, path).await
    }

    /// Keys of the matches that have timeseries data.
    pub async fn timeseries_match_keys<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<Vec<String>, ApiError> {
        let path = self.path("matches").param("timeseries", true);
        client.session().fetch(&mut self.cache, options, path).await
    }

    pub async fn oprs<T: Transport>(&mut self, client: &Client<T>, options: &CacheOptions) -> Result<Option<Oprs>, ApiError> {
        client.session().fetch(&mut self.cache, options, event_path(&self.key, "oprs")).await
    }

    /// Free-form prediction data; the service makes no schema promise.
    pub async fn predictions<T: Transport>(&mut self, client: &Client<T>, options: &CacheOptions) -> Result<Value, ApiError> {
        client
            .session()
            .fetch(&mut self.cache, options, event_path(&self.key, "predictions"))
            .await
    }

    /// Qualification rankings by team key.
    pub async fn rankings<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<HashMap<String, EventRanking>, ApiError> {
        let table: Option<RankingTable> = client
            .session()
            .fetch(&mut self.cache, options, event_path(&self.key, "rankings"))
            .await?;
        Ok(table.map(RankingTable::into_rankings).unwrap_or_default())
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

    /// Status of every team at the event, by team key. Teams without a
    /// status are left out.
    pub async fn team_statuses<T: Transport>(
        &mut self,
        client: &Client<T>,
        options: &CacheOptions,
    ) -> Result<HashMap<String, EventTeamStatus>, ApiError> {
        let path = self.path("teams").param("statuses", true);
        let statuses: HashMap<String, Option<EventTeamStatus>> =
            client.session().fetch(&mut self.cache, options, path).await?;
        Ok(statuses
            .into_iter()
            .filter_map(|(key, status)| status.map(|status| (key, status)))
            .collect())
    }

    fn trusted_path(&self, action: &str) -> String {
        format!("{TRUSTED_ROOT}/event/{}/{action}", self.key)
    }

    /// Updates event info (FIRST code, playoff type, webcasts, ...).
    pub async fn update_info<T: Transport>(&self, client: &Client<T>, info: &Value) -> Result<(), ApiError> {
        client.session().post(&self.trusted_path("info/update"), info).await
    }

    /// Each alliance is a list of team keys, captain first.
    pub async fn update_alliance_selections<T: Transport>(
        &self,
        client: &Client<T>,
        alliances: &[Vec<String>],
    ) -> Result<(), ApiError> {
        client
            .session()
            .post(&self.trusted_path("alliance_selections/update"), alliances)
            .await
    }

    pub async fn update_awards<T: Transport>(&self, client: &Client<T>, awards: &[Value]) -> Result<(), ApiError> {
        client.session().post(&self.trusted_path("awards/update"), awards).await
    }

    pub async fn update_matches<T: Transport>(&self, client: &Client<T>, matches: &[Value]) -> Result<(), ApiError> {
        client.session().post(&self.trusted_path("matches/update"), matches).await
    }

    /// `match_keys` are partial keys without the event prefix, like `qm1`.
    pub async fn delete_matches<T: Transport>(&self, client: &Client<T>, match_keys: &[&str]) -> Result<(), ApiError> {
        client.session().post(&self.trusted_path("matches/delete"), match_keys).await
    }

    pub async fn update_team_list<T: Transport>(&self, client: &Client<T>, team_keys: &[&str]) -> Result<(), ApiError> {
        client.session().post(&self.trusted_path("team_list/update"), team_keys).await
    }

    /// Partial match key to YouTube video id.
    pub async fn update_match_videos<T: Transport>(
        &self,
        client: &Client<T>,
        videos: &HashMap<String, String>,
    ) -> Result<(), ApiError> {
        client
            .session()
            .post(&self.trusted_path("match_videos/update"), videos)
            .await
    }

    /// YouTube video ids.
    pub async fn update_media<T: Transport>(&self, client: &Client<T>, videos: &[&str]) -> Result<(), ApiError> {
        client.session().post(&self.trusted_path("media/update"), videos).await
    }
}

impl Keyed for Event {
    fn key(&self) -> &str {
        &self.key
    }
}

pub(crate) fn event_path(key: &str, endpoint: &str) -> RequestPath {
    RequestPath::new("event").param("key", key).param("endpoint", endpoint)
}
