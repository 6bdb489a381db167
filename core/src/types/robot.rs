//! Robots a team registered by season.

use serde::{Deserialize, Serialize};

/// A robot name a team registered for one season.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Robot {
    pub key: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub robot_name: Option<String>,
    #[serde(default)]
    pub team_key: Option<String>,
}
