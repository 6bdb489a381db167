//! A team's standing at one event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{null_as_default, NamedStats, Record, StatInfo};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTeamStatus {
    /// `None` before qualifications start.
    #[serde(default)]
    pub qual: Option<Qualifications>,
    /// `None` when the team was not picked.
    #[serde(default)]
    pub alliance: Option<TeamAlliance>,
    /// `None` when the team did not reach playoffs, or playoffs have not begun.
    #[serde(default)]
    pub playoff: Option<Playoff>,
    /// HTML.
    #[serde(default)]
    pub alliance_status_str: Option<String>,
    /// HTML.
    #[serde(default)]
    pub playoff_status_str: Option<String>,
    /// HTML.
    #[serde(default)]
    pub overall_status_str: Option<String>,
    #[serde(default)]
    pub next_match_key: Option<String>,
    #[serde(default)]
    pub last_match_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Qualifications {
    #[serde(default)]
    pub num_teams: Option<u32>,
    #[serde(default)]
    pub ranking: Option<QualRanking>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort_order_info: Vec<StatInfo>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Qualifications {
    /// The ranking's sort orders, named by `sort_order_info`.
    pub fn sort_orders(&self) -> NamedStats {
        match &self.ranking {
            Some(ranking) => NamedStats::zip(&ranking.sort_orders, &self.sort_order_info),
            None => NamedStats::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualRanking {
    #[serde(default)]
    pub dq: Option<u32>,
    #[serde(default)]
    pub matches_played: Option<u32>,
    #[serde(default)]
    pub qual_average: Option<f64>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub record: Option<Record>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort_orders: Vec<f64>,
    #[serde(default)]
    pub team_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamAlliance {
    #[serde(default)]
    pub backup: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<u32>,
    /// 0 for the captain.
    #[serde(default)]
    pub pick: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayoffStatus {
    Won,
    Eliminated,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playoff {
    #[serde(default)]
    pub current_level_record: Option<Record>,
    /// `qf`, `sf`, `f`, ...
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub playoff_average: Option<f64>,
    #[serde(default)]
    pub record: Option<Record>,
    #[serde(default)]
    pub status: Option<PlayoffStatus>,
}
