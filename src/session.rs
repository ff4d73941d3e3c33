//! A user session: the persisted library, the deck, and the search backend.
//!
//! Every library mutation goes through `Session` so that the library record
//! is written back right after it changes. A change that cannot be written
//! is rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::{
    deck::{Deck, error::DeckError, sink::AudioSink},
    domain::{
        playlist::Playlist,
        track::{Track, TrackDraft},
    },
    importer::{self, Catalog, ImportError, ImportReport},
    library::{
        Library,
        error::LibraryError,
        view::{TrackFilter, filter_tracks},
    },
    search::{TrackSearch, stations::Stations},
    storage::{backup, error::StorageError, operations::Storage},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Deck(#[from] DeckError),
}

pub struct Session {
    storage: Storage,
    library: Library,
    deck: Deck,
    catalog: Catalog,
}

impl Session {
    /// Loads the persisted library and volume.
    pub fn open(
        storage: Storage,
        search: Box<dyn TrackSearch>,
        stations: Stations,
        sink: Box<dyn AudioSink>,
    ) -> Result<Self, StorageError> {
        let library = storage.load_library()?;
        let volume = storage.load_volume()?;
        log::debug!(
            "session opened: {} tracks, {} playlists",
            library.tracks.len(),
            library.playlists.len()
        );

        Ok(Self {
            storage,
            library,
            deck: Deck::new(sink, volume),
            catalog: Catalog::new(Arc::from(search), stations),
        })
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    /// Search backend, usable without holding on to the session.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn stations(&self) -> &Stations {
        self.catalog.stations()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Applies a change to the library and persists it. On any error the
    /// library is left as it was.
    fn mutate<T, E>(
        &mut self,
        f: impl FnOnce(&mut Library) -> Result<T, E>,
    ) -> Result<T, SessionError>
    where
        SessionError: From<E>,
    {
        let before = self.library.clone();
        let result = f(&mut self.library)
            .map_err(SessionError::from)
            .and_then(|value| {
                self.storage.save_library(&self.library)?;
                Ok(value)
            });
        if result.is_err() {
            self.library = before;
        }
        result
    }

    pub fn tracks(&self, filter: &TrackFilter) -> Vec<&Track> {
        filter_tracks(&self.library.tracks, filter)
    }

    pub fn add_track(&mut self, draft: &TrackDraft) -> Result<Track, SessionError> {
        self.mutate(|lib| lib.add_track(draft))
    }

    pub fn update_track(&mut self, id: &str, draft: &TrackDraft) -> Result<Track, SessionError> {
        self.mutate(|lib| lib.update_track(id, draft))
    }

    pub fn delete_track(&mut self, id: &str) -> Result<Track, SessionError> {
        self.mutate(|lib| lib.delete_track(id))
    }

    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool, SessionError> {
        self.mutate(|lib| lib.toggle_favorite(id))
    }

    pub fn create_playlist(&mut self, name: &str) -> Result<Playlist, SessionError> {
        self.mutate(|lib| lib.create_playlist(name))
    }

    pub fn delete_playlist(&mut self, id: &str) -> Result<Playlist, SessionError> {
        self.mutate(|lib| lib.delete_playlist(id))
    }

    pub fn add_to_playlist(&mut self, list_id: &str, track_id: &str) -> Result<bool, SessionError> {
        self.mutate(|lib| lib.add_to_playlist(list_id, track_id))
    }

    pub fn remove_from_playlist(
        &mut self,
        list_id: &str,
        track_id: &str,
    ) -> Result<bool, SessionError> {
        self.mutate(|lib| lib.remove_from_playlist(list_id, track_id))
    }

    pub fn select_playlist(&mut self, id: &str) -> Result<(), SessionError> {
        self.mutate(|lib| lib.select_playlist(id))
    }

    pub fn import_search(&mut self, query: &str) -> Result<ImportReport, SessionError> {
        let candidates = self.catalog.search(query)?;
        self.import_results(query, candidates)
    }

    /// Second half of `import_search`, for candidates fetched through `catalog()`.
    pub fn import_results(
        &mut self,
        query: &str,
        candidates: Vec<Track>,
    ) -> Result<ImportReport, SessionError> {
        let report = self.mutate(|lib| importer::merge_search(lib, query, candidates))?;
        log::info!("imported {} tracks for '{}'", report.added, query.trim());
        Ok(report)
    }

    /// Imports a station and hands its results to the deck.
    pub fn load_station(&mut self, keyword: &str) -> Result<ImportReport, SessionError> {
        let candidates = self.catalog.station(keyword)?;
        self.station_results(keyword, candidates)
    }

    /// Second half of `load_station`, for candidates fetched through `catalog()`.
    pub fn station_results(
        &mut self,
        keyword: &str,
        candidates: Vec<Track>,
    ) -> Result<ImportReport, SessionError> {
        let load = self.mutate(|lib| importer::merge_station(lib, keyword, candidates))?;
        if self.deck.start(load.queue).is_ok() {
            self.storage.set_last_station(keyword)?;
        }
        Ok(load.report)
    }

    /// First-visit initialization.
    ///
    /// Marks the store as visited and loads `keyword` quietly: a failing
    /// station is only logged. Returns false when this is not the first visit.
    pub fn welcome(&mut self, keyword: &str) -> Result<bool, SessionError> {
        if !self.claim_first_visit()? {
            return Ok(false);
        }
        let fetched = self.catalog.station(keyword);
        self.welcome_results(keyword, fetched);
        Ok(true)
    }

    /// Marks the store as visited, returns whether it was the first visit.
    pub fn claim_first_visit(&mut self) -> Result<bool, SessionError> {
        if self.storage.has_visited()? {
            return Ok(false);
        }
        self.storage.mark_visited()?;
        Ok(true)
    }

    /// Adds the welcome station. Only tracks new to the library are queued,
    /// and the station is remembered only when something starts playing.
    pub fn welcome_results(&mut self, keyword: &str, fetched: Result<Vec<Track>, ImportError>) {
        let merged = fetched
            .map_err(SessionError::from)
            .and_then(|candidates| {
                self.mutate(|lib| importer::merge_station(lib, keyword, candidates))
            });

        let load = match merged {
            Ok(load) => load,
            Err(e) => {
                log::error!("Failed to load initial station '{keyword}': {e}");
                return;
            }
        };
        log::info!("welcome station '{keyword}': {} new tracks", load.report.added);

        if load.fresh.is_empty() || self.deck.start(load.fresh).is_err() {
            return;
        }
        if let Err(e) = self.storage.set_last_station(keyword) {
            log::error!("Failed to remember station '{keyword}': {e}");
        }
    }

    pub fn export_to(&self, path: &Path) -> Result<PathBuf, SessionError> {
        Ok(backup::export_library(&self.library, path)?)
    }

    /// Replaces the library wholesale. The current one is kept on any error.
    pub fn import_from(&mut self, path: &Path) -> Result<(), SessionError> {
        let library = backup::read_backup(path)?;
        self.replace_library(library)
    }

    pub fn replace_library(&mut self, library: Library) -> Result<(), SessionError> {
        library.validate()?;
        self.storage.save_library(&library)?;
        self.library = library;
        Ok(())
    }

    /// plays every playable track of the filtered view
    pub fn play_all(&mut self, filter: &TrackFilter) -> Result<&Track, SessionError> {
        let tracks = self.tracks(filter).into_iter().cloned().collect();
        Ok(self.deck.start(tracks)?)
    }

    pub fn play_playlist(&mut self, id: &str) -> Result<&Track, SessionError> {
        let tracks = self
            .library
            .playlist_tracks(id)?
            .into_iter()
            .cloned()
            .collect();
        Ok(self.deck.start(tracks)?)
    }

    pub fn play_favorites(&mut self) -> Result<&Track, SessionError> {
        let tracks = self.library.favorites().into_iter().cloned().collect();
        Ok(self.deck.start(tracks)?)
    }

    pub fn play_track(&mut self, id: &str) -> Result<&Track, SessionError> {
        let track = self
            .library
            .track(id)
            .ok_or_else(|| LibraryError::TrackNotFound(id.to_string()))?;
        if !track.is_playable() {
            return Err(DeckError::NoPreview(track.title.clone()).into());
        }
        let track = track.clone();
        Ok(self.deck.start(vec![track])?)
    }

    /// Sets and persists the deck volume.
    pub fn set_volume(&mut self, volume: f32) -> Result<f32, SessionError> {
        let previous = self.deck.volume();
        let volume = self.deck.set_volume(volume);
        if let Err(e) = self.storage.save_volume(volume) {
            self.deck.set_volume(previous);
            return Err(e.into());
        }
        Ok(volume)
    }
}
