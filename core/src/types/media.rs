//! Team media and social media.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    /// Identifier of the media on its hosting site.
    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub preferred: Option<bool>,
    #[serde(default)]
    pub direct_url: Option<String>,
    #[serde(default)]
    pub view_url: Option<String>,
}
