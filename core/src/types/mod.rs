//! Domain records for the read API.
//!
//! # Design
//! Records mirror the service's JSON schema and deserialize with serde.
//! Almost every field is optional on the wire, so fields are `Option` or
//! default to empty. The cache-bearing entities ([`Team`], [`Event`],
//! [`District`]) carry a private [`CacheToken`](crate::cache::CacheToken)
//! that is never serialized and expose their sub-resources as async methods.
//!
//! Listing endpoints answer either full records, "simple" records or bare
//! keys depending on a path flag. [`ListOptions`] picks the flag and
//! [`Listed`] holds either shape.

pub mod award;
pub mod district;
pub mod event;
pub mod event_team_status;
pub mod matches;
pub mod media;
pub mod robot;
pub mod status;
pub mod team;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;
use crate::url::RequestPath;

pub use award::{Award, AwardRecipient};
pub use district::{District, DistrictRanking};
pub use event::{
    AllianceStatus, DistrictPoints, Event, EventAlliance, EventRanking, Insights, OprAverages, Oprs, Webcast,
};
pub use event_team_status::{EventTeamStatus, PlayoffStatus, Playoff, QualRanking, Qualifications, TeamAlliance};
pub use matches::{Alliance, AllianceColor, Alliances, Match, ZebraAlliances, ZebraMotionworks, ZebraTeam};
pub use media::Media;
pub use robot::Robot;
pub use status::ApiStatus;
pub use team::Team;

/// Shape flags for listing endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Shortened records (`/simple`).
    pub simple: bool,
    /// Keys only (`/keys`).
    pub keys: bool,
}

impl ListOptions {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn simple() -> Self {
        Self { simple: true, keys: false }
    }

    pub fn keys() -> Self {
        Self { simple: false, keys: true }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.simple && self.keys {
            return Err(ApiError::InvalidArgument(
                "simple and keys cannot both be set, choose one mode".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, path: RequestPath) -> RequestPath {
        path.param("simple", self.simple).param("keys", self.keys)
    }
}

/// Records that carry their own service key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// One element of a listing: a bare key or a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listed<T> {
    Key(String),
    Record(T),
}

impl<T> Listed<T> {
    pub fn record(&self) -> Option<&T> {
        match self {
            Listed::Record(record) => Some(record),
            Listed::Key(_) => None,
        }
    }
}

impl<T: Keyed> Listed<T> {
    pub fn key(&self) -> &str {
        match self {
            Listed::Key(key) => key,
            Listed::Record(record) => record.key(),
        }
    }
}

/// A team key in canonical `frc<number>` form.
///
/// Numbers and bare digit strings gain the `frc` prefix; anything else is
/// kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamKey(String);

impl TeamKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn number(&self) -> Option<u32> {
        team_number(&self.0)
    }
}

impl From<u32> for TeamKey {
    fn from(number: u32) -> Self {
        TeamKey(format!("frc{number}"))
    }
}

impl From<&str> for TeamKey {
    fn from(key: &str) -> Self {
        let key = key.trim();
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            TeamKey(format!("frc{key}"))
        } else {
            TeamKey(key.to_string())
        }
    }
}

impl From<String> for TeamKey {
    fn from(key: String) -> Self {
        TeamKey::from(key.as_str())
    }
}

impl From<&String> for TeamKey {
    fn from(key: &String) -> Self {
        TeamKey::from(key.as_str())
    }
}

impl From<&Team> for TeamKey {
    fn from(team: &Team) -> Self {
        TeamKey(team.key.clone())
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Team number of an `frc<number>` key.
pub fn team_number(key: &str) -> Option<u32> {
    key.strip_prefix("frc")?.parse().ok()
}

/// Splits `2022iri` into `(2022, "iri")`.
pub(crate) fn split_season_key(key: &str) -> (Option<u16>, String) {
    let digits = key.bytes().take_while(u8::is_ascii_digit).count();
    (key[..digits].parse().ok(), key[digits..].to_string())
}

/// Win/loss/tie record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
}

/// Name and display precision of one ranking statistic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatInfo {
    pub name: String,
    #[serde(default)]
    pub precision: Option<u32>,
}

/// Ranking statistics keyed by a normalized name: lowercase, spaces as
/// underscores, `+` spelled `plus`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedStats {
    entries: Vec<(String, f64)>,
}

impl NamedStats {
    /// Pairs values with their info entries positionally; extras on either
    /// side are dropped.
    pub fn zip(values: &[f64], info: &[StatInfo]) -> Self {
        let entries = values
            .iter()
            .zip(info)
            .map(|(value, info)| (stat_name(&info.name), *value))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn stat_name(raw: &str) -> String {
    raw.to_lowercase().replace(' ', "_").replace('+', "plus")
}

/// Treats an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
