use serde::{Deserialize, Serialize};

use super::Millis;

/// A named, ordered collection of track references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    /// insertion order
    #[serde(rename = "trackIds", default)]
    pub track_ids: Vec<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Millis,
}

impl Playlist {
    pub fn contains(&self, track_id: &str) -> bool {
        self.track_ids.iter().any(|id| id == track_id)
    }
}
