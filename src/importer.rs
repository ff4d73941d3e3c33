//! Bulk import from the remote search: plain searches and stations
//!
//! An import runs in two steps. `Catalog` fetches candidate tracks and
//! touches nothing local, so it can run while other requests use the
//! library. The `merge_*` functions then add the candidates to a library.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::track::Track,
    library::{Library, error::LibraryError},
    search::{TrackSearch, error::SearchError, search_tracks, stations::Stations},
};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("no results with a playable preview")]
    NoResults,

    #[error("all {0} results are already in the library")]
    AllDuplicates(usize),

    #[error(transparent)]
    Library(#[from] LibraryError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// usable tracks returned by the search
    pub found: usize,
    pub added: usize,
    pub skipped: usize,
    pub playlist_id: Option<String>,
}

/// Search backend plus station presets. Cheap to clone.
#[derive(Clone)]
pub struct Catalog {
    search: Arc<dyn TrackSearch>,
    stations: Stations,
}

impl Catalog {
    pub fn new(search: Arc<dyn TrackSearch>, stations: Stations) -> Self {
        Self { search, stations }
    }

    pub fn stations(&self) -> &Stations {
        &self.stations
    }

    /// usable tracks for a free text query
    pub fn search(&self, query: &str) -> Result<Vec<Track>, ImportError> {
        self.fetch(query.trim())
    }

    /// usable tracks for a station keyword
    pub fn station(&self, keyword: &str) -> Result<Vec<Track>, ImportError> {
        self.fetch(&self.stations.query_for(keyword))
    }

    fn fetch(&self, term: &str) -> Result<Vec<Track>, ImportError> {
        let tracks = search_tracks(self.search.as_ref(), term)?;
        if tracks.is_empty() {
            return Err(ImportError::NoResults);
        }
        Ok(tracks)
    }
}

/// Adds the results of a search to a new playlist `Import: {query}`,
/// which becomes the selected playlist.
pub fn merge_search(
    library: &mut Library,
    query: &str,
    candidates: Vec<Track>,
) -> Result<ImportReport, ImportError> {
    let found = candidates.len();
    let playlist_name = format!("Import: {}", query.trim());
    let merged = library.merge_import(candidates, &playlist_name, true)?;
    if merged.added.is_empty() {
        return Err(ImportError::AllDuplicates(found));
    }

    Ok(ImportReport {
        found,
        added: merged.added.len(),
        skipped: merged.skipped,
        playlist_id: merged.playlist_id,
    })
}

pub struct StationLoad {
    pub report: ImportReport,
    /// every usable result, already known ones included
    pub queue: Vec<Track>,
    /// only the results that were new to the library
    pub fresh: Vec<Track>,
}

/// Adds a station's results: new tracks go to a `{KEYWORD} Radio` playlist,
/// which is not selected. Nothing new is not an error.
pub fn merge_station(
    library: &mut Library,
    keyword: &str,
    candidates: Vec<Track>,
) -> Result<StationLoad, ImportError> {
    let found = candidates.len();
    let queue = candidates.clone();
    let merged = library.merge_import(candidates, &Stations::playlist_name(keyword), false)?;

    Ok(StationLoad {
        report: ImportReport {
            found,
            added: merged.added.len(),
            skipped: merged.skipped,
            playlist_id: merged.playlist_id,
        },
        queue,
        fresh: merged.added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        library::tests::mock_track,
        search::{
            SearchResult,
            tests::{FakeSearch, record},
        },
    };

    fn catalog(search: FakeSearch) -> (Catalog, Arc<FakeSearch>) {
        let search = Arc::new(search);
        (Catalog::new(search.clone(), Stations::default()), search)
    }

    #[test]
    fn test_import_search_creates_selected_playlist() -> anyhow::Result<()> {
        let (catalog, search) =
            catalog(FakeSearch::with(vec![record(1, "One", "X"), record(2, "Two", "Y")]));
        let mut library = Library::default();

        let candidates = catalog.search("  chill ")?;
        let report = merge_search(&mut library, "  chill ", candidates)?;

        assert_eq!(report.found, 2);
        assert_eq!(report.added, 2);
        assert_eq!(*search.terms.lock().unwrap(), vec!["chill".to_string()]);

        let list_id = report.playlist_id.unwrap();
        assert_eq!(library.current_playlist.as_deref(), Some(list_id.as_str()));
        assert_eq!(library.playlist(&list_id).unwrap().name, "Import: chill");
        assert_eq!(library.tracks.len(), 2);
        Ok(())
    }

    #[test]
    fn test_reimport_is_deduplicated_case_insensitively() -> anyhow::Result<()> {
        let mut library = Library::default();
        library.tracks.push(mock_track("t1", "A", "B", 1));
        let (catalog, _) =
            catalog(FakeSearch::with(vec![record(1, "a", "b"), record(2, "c", "d")]));

        let report = merge_search(&mut library, "q", catalog.search("q")?)?;

        assert_eq!(report.added, 1);
        assert_eq!(report.skipped, 1);
        assert!(library.tracks.iter().any(|t| t.title == "c"));
        let same = library.tracks.iter().filter(|t| t.title.to_lowercase() == "a");
        assert_eq!(same.count(), 1);
        Ok(())
    }

    #[test]
    fn test_import_with_only_duplicates() -> anyhow::Result<()> {
        let mut library = Library::default();
        library.tracks.push(mock_track("t1", "A", "B", 1));
        let (catalog, _) = catalog(FakeSearch::with(vec![record(1, "A", "B")]));

        let err = merge_search(&mut library, "q", catalog.search("q")?).unwrap_err();

        assert!(matches!(err, ImportError::AllDuplicates(1)));
        assert!(library.playlists.is_empty());
        Ok(())
    }

    #[test]
    fn test_search_without_usable_results() {
        let (catalog, _) = catalog(FakeSearch::with(vec![SearchResult {
            preview_url: None,
            ..record(1, "A", "B")
        }]));

        let err = catalog.search("q").unwrap_err();
        assert!(matches!(err, ImportError::NoResults));
    }

    #[test]
    fn test_search_failure_is_reported() {
        let (catalog, _) = catalog(FakeSearch::failing(503));

        let err = catalog.search("q").unwrap_err();

        assert!(matches!(err, ImportError::Search(SearchError::Status(503))));
    }

    #[test]
    fn test_station_queues_all_results() -> anyhow::Result<()> {
        let mut library = Library::default();
        library.tracks.push(mock_track("t1", "Known", "Artist", 1));
        let (catalog, search) = catalog(FakeSearch::with(vec![
            record(1, "Known", "Artist"),
            record(2, "New", "Artist"),
        ]));

        let load = merge_station(&mut library, "lofi", catalog.station("lofi")?)?;

        assert_eq!(*search.terms.lock().unwrap(), vec!["lofi chill beats".to_string()]);
        assert_eq!(load.queue.len(), 2);
        assert_eq!(load.report.added, 1);
        assert_eq!(load.fresh.len(), 1);
        assert_eq!(load.fresh[0].title, "New");

        let list = library.playlist(load.report.playlist_id.as_deref().unwrap()).unwrap();
        assert_eq!(list.name, "LOFI Radio");
        assert_eq!(library.current_playlist, None);
        Ok(())
    }

    #[test]
    fn test_station_with_nothing_new() -> anyhow::Result<()> {
        let mut library = Library::default();
        library.tracks.push(mock_track("t1", "Known", "Artist", 1));
        let (catalog, _) = catalog(FakeSearch::with(vec![record(1, "Known", "Artist")]));

        let load = merge_station(&mut library, "jazz", catalog.station("jazz")?)?;

        assert_eq!(load.report.added, 0);
        assert!(load.report.playlist_id.is_none());
        assert_eq!(load.queue.len(), 1);
        assert!(load.fresh.is_empty());
        Ok(())
    }
}
