//! Service status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    /// Year of the current season.
    #[serde(default)]
    pub current_season: Option<u16>,
    /// Latest season the API accepts in queries.
    #[serde(default)]
    pub max_season: Option<u16>,
    /// The upstream FMS data feed is down entirely.
    #[serde(default)]
    pub is_datafeed_down: bool,
    /// Active events that are no longer updating.
    #[serde(default, deserialize_with = "null_as_default")]
    pub down_events: Vec<String>,
    #[serde(default)]
    pub ios: Option<Value>,
    #[serde(default)]
    pub android: Option<Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_tolerates_null_lists() {
        let status: ApiStatus = serde_json::from_value(json!({
            "current_season": 2023,
            "max_season": 2023,
            "is_datafeed_down": false,
            "down_events": null,
            "ios": {"latest_app_version": 1, "min_app_version": 1},
        }))
        .unwrap();
        assert_eq!(status.current_season, Some(2023));
        assert!(status.down_events.is_empty());
        assert!(status.android.is_none());
    }
}
