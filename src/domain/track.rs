use serde::{Deserialize, Serialize};

use super::Millis;

/// Represent a music track
///
/// Field names on the wire follow the backup file format, so that
/// exported libraries can be imported back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// playable preview url
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// cover image url
    #[serde(rename = "cover", default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(rename = "fav", default)]
    pub favorite: bool,
    #[serde(rename = "addedAt", default)]
    pub added_at: Millis,
}

impl Track {
    /// Key used to recognise the same song coming from different sources.
    pub fn dedupe_key(&self) -> String {
        dedupe_key(&self.title, &self.artist)
    }

    /// true when the track has a non-empty preview url
    pub fn is_playable(&self) -> bool {
        self.preview_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

pub fn dedupe_key(title: &str, artist: &str) -> String {
    format!("{}_{}", title.to_lowercase(), artist.to_lowercase())
}

/// User supplied track fields, used both for new tracks and for edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackDraft {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(rename = "url", default)]
    pub preview_url: Option<String>,
    #[serde(rename = "cover", default)]
    pub cover_url: Option<String>,
}

/// A draft with whitespace trimmed and blank optional fields dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFields {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub preview_url: Option<String>,
    pub cover_url: Option<String>,
}

impl TrackDraft {
    /// returns None if title or artist is blank
    pub fn normalize(&self) -> Option<TrackFields> {
        let title = self.title.trim();
        let artist = self.artist.trim();
        if title.is_empty() || artist.is_empty() {
            return None;
        }

        Some(TrackFields {
            title: title.to_string(),
            artist: artist.to_string(),
            album: non_blank(&self.album),
            genre: non_blank(&self.genre),
            preview_url: non_blank(&self.preview_url),
            cover_url: non_blank(&self.cover_url),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
