//! Remote music search and conversion of its records into library tracks

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{id, now_millis, track::Track};

pub mod error;
pub mod itunes;
pub mod stations;

use error::SearchError;

/// Anything that can turn a search term into raw search records.
pub trait TrackSearch: Send + Sync {
    fn search(&self, term: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// One record of the search response. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub track_id: Option<u64>,
    pub collection_id: Option<u64>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub collection_name: Option<String>,
    pub primary_genre_name: Option<String>,
    pub preview_url: Option<String>,
    pub artwork_url100: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SearchResult {
    /// Records without a preview url, track name or artist name are dropped.
    pub fn into_track(self) -> Option<Track> {
        let preview_url = present(self.preview_url)?;
        let title = present(self.track_name)?;
        let artist = present(self.artist_name)?;

        Some(Track {
            id: id::imported_track_id(self.track_id, self.collection_id),
            title,
            artist,
            album: present(self.collection_name),
            genre: present(self.primary_genre_name),
            preview_url: Some(preview_url),
            cover_url: present(self.artwork_url100).map(|url| url.replace("100x100", "300x300")),
            favorite: false,
            added_at: now_millis(),
        })
    }
}

/// Extracts the records from a response body.
///
/// A body without a `results` array has no results. Records that do not
/// have the expected shape are skipped.
pub fn results_from_body(body: Value) -> Vec<SearchResult> {
    let Value::Object(mut body) = body else {
        return Vec::new();
    };
    let Some(Value::Array(results)) = body.remove("results") else {
        return Vec::new();
    };

    results
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<SearchResult>(record) {
            Ok(r) => Some(r),
            Err(e) => {
                log::debug!("skipping unreadable search record: {e}");
                None
            }
        })
        .collect()
}

/// searches and keeps only the records that make usable tracks
pub fn search_tracks(search: &dyn TrackSearch, term: &str) -> Result<Vec<Track>, SearchError> {
    let results = search.search(term)?;
    let found = results.len();
    let tracks = results
        .into_iter()
        .filter_map(SearchResult::into_track)
        .collect::<Vec<_>>();
    log::info!("search '{term}': {found} records, {} usable tracks", tracks.len());
    Ok(tracks)
}
