//! Matches and Zebra MotionWorks tracking data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{null_as_default, Keyed, TeamKey};

/// One played or scheduled match.
///
/// Keys look like `2022iri_qm12`: season, event code, competition level,
/// optional set number, `m`, match number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub key: String,
    #[serde(default)]
    pub comp_level: Option<String>,
    #[serde(default)]
    pub set_number: Option<u32>,
    #[serde(default)]
    pub match_number: Option<u32>,
    #[serde(default)]
    pub alliances: Option<Alliances>,
    /// `red`, `blue`, or empty for a tie or no result.
    #[serde(default)]
    pub winning_alliance: Option<String>,
    #[serde(default)]
    pub event_key: Option<String>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub actual_time: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub predicted_time: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub post_result_time: Option<DateTime<Utc>>,
    /// Year-specific layout.
    #[serde(default)]
    pub score_breakdown: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllianceColor {
    Red,
    Blue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliances {
    pub red: Alliance,
    pub blue: Alliance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliance {
    /// `-1` (or missing) until the match has been played.
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_keys: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub surrogate_team_keys: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dq_team_keys: Vec<String>,
}

impl Alliance {
    /// Whether `team_key` played on this alliance in any capacity.
    pub fn includes(&self, team_key: &str) -> bool {
        self.team_keys
            .iter()
            .chain(&self.surrogate_team_keys)
            .chain(&self.dq_team_keys)
            .any(|key| key == team_key)
    }

    /// The score, once posted.
    pub fn played_score(&self) -> Option<i32> {
        self.score.filter(|score| *score >= 0)
    }
}

impl Match {
    /// The alliance `team` played on, checking regular, surrogate and
    /// disqualified keys of red, then blue.
    pub fn alliance_of(&self, team: impl Into<TeamKey>) -> Option<(AllianceColor, &Alliance)> {
        let team = team.into();
        let alliances = self.alliances.as_ref()?;
        if alliances.red.includes(team.as_str()) {
            Some((AllianceColor::Red, &alliances.red))
        } else if alliances.blue.includes(team.as_str()) {
            Some((AllianceColor::Blue, &alliances.blue))
        } else {
            None
        }
    }

    /// Red plus blue score; `None` until both are posted.
    pub fn total_score(&self) -> Option<i32> {
        let alliances = self.alliances.as_ref()?;
        Some(alliances.red.played_score()? + alliances.blue.played_score()?)
    }
}

impl Keyed for Match {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Robot positions sampled over one match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZebraMotionworks {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub times: Vec<f64>,
    #[serde(default)]
    pub alliances: ZebraAlliances,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZebraAlliances {
    #[serde(default, deserialize_with = "null_as_default")]
    pub red: Vec<ZebraTeam>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blue: Vec<ZebraTeam>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZebraTeam {
    pub team_key: String,
    /// One sample per entry of [`ZebraMotionworks::times`]; gaps are `None`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub xs: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ys: Vec<Option<f64>>,
}
