//! Awards.

use serde::{Deserialize, Serialize};

use super::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Award {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub award_type: Option<u32>,
    #[serde(default)]
    pub event_key: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipient_list: Vec<AwardRecipient>,
    #[serde(default)]
    pub year: Option<u16>,
}

/// A team, a person, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRecipient {
    #[serde(default)]
    pub team_key: Option<String>,
    #[serde(default)]
    pub awardee: Option<String>,
}

impl Award {
    pub fn is_recipient(&self, team_key: &str) -> bool {
        self.recipient_list
            .iter()
            .any(|r| r.team_key.as_deref() == Some(team_key))
    }
}
