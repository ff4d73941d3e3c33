//! In-memory library: tracks, playlists and the selected playlist.
//!
//! All mutations are plain linear scans over the two vectors; the whole
//! library is persisted as one record after every change (see `session`).

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{
    id::{self, random_suffix},
    now_millis,
    playlist::Playlist,
    track::{Track, TrackDraft},
};

pub mod error;
pub mod view;

use error::LibraryError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(rename = "lists", default)]
    pub playlists: Vec<Playlist>,
    /// stored as "" when nothing is selected
    #[serde(
        rename = "currentListId",
        default,
        serialize_with = "serialize_selection",
        deserialize_with = "deserialize_selection"
    )]
    pub current_playlist: Option<String>,
}

fn serialize_selection<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(value.as_deref().unwrap_or(""))
}

fn deserialize_selection<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(d)?;
    Ok(value.filter(|v| !v.is_empty()))
}

/// Result of merging search results into the library
#[derive(Debug, Default)]
pub struct MergeReport {
    /// tracks that were new to the library, in candidate order
    pub added: Vec<Track>,
    /// candidates dropped because the library already had them
    pub skipped: usize,
    /// playlist created for the added tracks, None when nothing was added
    pub playlist_id: Option<String>,
}

impl Library {
    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|l| l.id == id)
    }

    fn track_mut(&mut self, id: &str) -> Result<&mut Track, LibraryError> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LibraryError::TrackNotFound(id.to_string()))
    }

    fn playlist_mut(&mut self, id: &str) -> Result<&mut Playlist, LibraryError> {
        self.playlists
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| LibraryError::PlaylistNotFound(id.to_string()))
    }

    /// Checks the invariants a library loaded from outside must hold.
    pub fn validate(&self) -> Result<(), LibraryError> {
        let mut seen = HashSet::new();
        for track in &self.tracks {
            if !seen.insert(track.id.as_str()) {
                return Err(LibraryError::DuplicateTrackId(track.id.clone()));
            }
        }
        Ok(())
    }

    pub fn add_track(&mut self, draft: &TrackDraft) -> Result<Track, LibraryError> {
        let fields = draft
            .normalize()
            .ok_or(LibraryError::MissingTitleOrArtist)?;

        let track = Track {
            id: id::new_track_id(),
            title: fields.title,
            artist: fields.artist,
            album: fields.album,
            genre: fields.genre,
            preview_url: fields.preview_url,
            cover_url: fields.cover_url,
            favorite: false,
            added_at: now_millis(),
        };
        self.tracks.push(track.clone());
        log::debug!("added track {} ({} - {})", track.id, track.artist, track.title);
        Ok(track)
    }

    /// Replaces the editable fields; id, favorite flag and creation time are kept.
    pub fn update_track(&mut self, id: &str, draft: &TrackDraft) -> Result<Track, LibraryError> {
        let fields = draft
            .normalize()
            .ok_or(LibraryError::MissingTitleOrArtist)?;
        let track = self.track_mut(id)?;

        track.title = fields.title;
        track.artist = fields.artist;
        track.album = fields.album;
        track.genre = fields.genre;
        track.preview_url = fields.preview_url;
        track.cover_url = fields.cover_url;

        Ok(track.clone())
    }

    /// Removes the track and every reference to it from playlists.
    pub fn delete_track(&mut self, id: &str) -> Result<Track, LibraryError> {
        let pos = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| LibraryError::TrackNotFound(id.to_string()))?;
        let removed = self.tracks.remove(pos);

        for list in &mut self.playlists {
            list.track_ids.retain(|tid| tid != id);
        }
        Ok(removed)
    }

    /// returns the new favorite state
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool, LibraryError> {
        let track = self.track_mut(id)?;
        track.favorite = !track.favorite;
        Ok(track.favorite)
    }

    pub fn create_playlist(&mut self, name: &str) -> Result<Playlist, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyPlaylistName);
        }
        let list = Playlist {
            id: id::new_playlist_id(),
            name: name.to_string(),
            track_ids: Vec::new(),
            created_at: now_millis(),
        };
        self.playlists.push(list.clone());
        Ok(list)
    }

    /// Deleting the selected playlist clears the selection.
    pub fn delete_playlist(&mut self, id: &str) -> Result<Playlist, LibraryError> {
        let pos = self
            .playlists
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| LibraryError::PlaylistNotFound(id.to_string()))?;
        let removed = self.playlists.remove(pos);

        if self.current_playlist.as_deref() == Some(id) {
            self.current_playlist = None;
        }
        Ok(removed)
    }

    /// Appends the track unless the playlist already holds it.
    ///
    /// returns whether the playlist changed
    pub fn add_to_playlist(&mut self, list_id: &str, track_id: &str) -> Result<bool, LibraryError> {
        if self.track(track_id).is_none() {
            return Err(LibraryError::TrackNotFound(track_id.to_string()));
        }
        let list = self.playlist_mut(list_id)?;
        if list.contains(track_id) {
            return Ok(false);
        }
        list.track_ids.push(track_id.to_string());
        Ok(true)
    }

    /// returns whether the playlist changed
    pub fn remove_from_playlist(
        &mut self,
        list_id: &str,
        track_id: &str,
    ) -> Result<bool, LibraryError> {
        let list = self.playlist_mut(list_id)?;
        let before = list.track_ids.len();
        list.track_ids.retain(|tid| tid != track_id);
        Ok(list.track_ids.len() != before)
    }

    pub fn select_playlist(&mut self, id: &str) -> Result<(), LibraryError> {
        if self.playlist(id).is_none() {
            return Err(LibraryError::PlaylistNotFound(id.to_string()));
        }
        self.current_playlist = Some(id.to_string());
        Ok(())
    }

    /// Tracks of a playlist in playlist order. Dangling references are skipped.
    pub fn playlist_tracks(&self, id: &str) -> Result<Vec<&Track>, LibraryError> {
        let list = self
            .playlist(id)
            .ok_or_else(|| LibraryError::PlaylistNotFound(id.to_string()))?;
        Ok(list
            .track_ids
            .iter()
            .filter_map(|tid| self.track(tid))
            .collect())
    }

    pub fn favorites(&self) -> Vec<&Track> {
        self.tracks.iter().filter(|t| t.favorite).collect()
    }

    /// distinct non-empty genres, in the order they first appear
    pub fn genres(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tracks
            .iter()
            .filter_map(|t| t.genre.as_deref())
            .filter(|g| !g.is_empty())
            .filter(|g| seen.insert(*g))
            .map(str::to_string)
            .collect()
    }

    /// Keeps only candidates whose title and artist are new to the library
    /// (case-insensitively), adds them, and collects them into a new playlist.
    pub fn merge_import(
        &mut self,
        candidates: Vec<Track>,
        playlist_name: &str,
        select: bool,
    ) -> Result<MergeReport, LibraryError> {
        let mut known = self
            .tracks
            .iter()
            .map(Track::dedupe_key)
            .collect::<HashSet<_>>();
        let mut ids = self
            .tracks
            .iter()
            .map(|t| t.id.clone())
            .collect::<HashSet<_>>();

        let mut report = MergeReport::default();
        for mut track in candidates {
            if !known.insert(track.dedupe_key()) {
                report.skipped += 1;
                continue;
            }
            while ids.contains(&track.id) {
                track.id = format!("{}_{}", track.id, random_suffix(3));
            }
            ids.insert(track.id.clone());
            report.added.push(track);
        }

        if report.added.is_empty() {
            return Ok(report);
        }

        let list = self.create_playlist(playlist_name)?;
        self.playlist_mut(&list.id)?.track_ids =
            report.added.iter().map(|t| t.id.clone()).collect();
        self.tracks.extend(report.added.iter().cloned());

        if select {
            self.current_playlist = Some(list.id.clone());
        }
        report.playlist_id = Some(list.id);
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn mock_track(id: &str, title: &str, artist: &str, added_at: i64) -> Track {
        Track {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: None,
            genre: None,
            preview_url: Some(format!("https://audio.example/{id}.m4a")),
            cover_url: None,
            favorite: false,
            added_at,
        }
    }

    fn draft(title: &str, artist: &str) -> TrackDraft {
        TrackDraft {
            title: title.to_string(),
            artist: artist.to_string(),
            ..Default::default()
        }
    }

    fn library_with_playlists() -> Library {
        let mut lib = Library::default();
        lib.tracks.push(mock_track("t1", "One", "X", 1));
        lib.tracks.push(mock_track("t2", "Two", "Y", 2));
        lib.playlists.push(Playlist {
            id: "l1".to_string(),
            name: "first".to_string(),
            track_ids: vec!["t1".to_string(), "t2".to_string()],
            created_at: 1,
        });
        lib.playlists.push(Playlist {
            id: "l2".to_string(),
            name: "second".to_string(),
            track_ids: vec!["t2".to_string()],
            created_at: 2,
        });
        lib
    }

    #[test]
    fn test_add_track_requires_title_and_artist() {
        let mut lib = Library::default();

        let err = lib.add_track(&draft("", "Artist")).unwrap_err();
        assert_eq!(err, LibraryError::MissingTitleOrArtist);

        let track = lib.add_track(&draft(" Title ", "Artist")).unwrap();
        assert_eq!(track.title, "Title");
        assert!(!track.favorite);
        assert_eq!(lib.tracks.len(), 1);
    }

    #[test]
    fn test_update_track_keeps_identity() {
        let mut lib = library_with_playlists();
        lib.tracks[0].favorite = true;

        let updated = lib.update_track("t1", &draft("Uno", "X")).unwrap();

        assert_eq!(updated.id, "t1");
        assert_eq!(updated.title, "Uno");
        assert!(updated.favorite);
        assert_eq!(updated.added_at, 1);
        assert_eq!(updated.preview_url, None);
    }

    #[test]
    fn test_update_unknown_track() {
        let mut lib = Library::default();
        let err = lib.update_track("nope", &draft("a", "b")).unwrap_err();
        assert_eq!(err, LibraryError::TrackNotFound("nope".to_string()));
    }

    #[test]
    fn test_delete_track_cascades_to_every_playlist() {
        let mut lib = library_with_playlists();

        // t1 is only in l1, l2 must be left alone without errors
        lib.delete_track("t1").unwrap();

        assert!(lib.track("t1").is_none());
        assert_eq!(lib.playlist("l1").unwrap().track_ids, vec!["t2"]);
        assert_eq!(lib.playlist("l2").unwrap().track_ids, vec!["t2"]);

        lib.delete_track("t2").unwrap();
        assert!(lib.playlists.iter().all(|l| l.track_ids.is_empty()));
    }

    #[test]
    fn test_toggle_favorite_twice_restores_state() {
        let mut lib = library_with_playlists();
        let before = lib.clone();

        assert!(lib.toggle_favorite("t2").unwrap());
        assert!(!lib.toggle_favorite("t2").unwrap());

        assert_eq!(lib, before);
    }

    #[test]
    fn test_create_playlist_rejects_blank_name() {
        let mut lib = Library::default();
        assert_eq!(
            lib.create_playlist("   ").unwrap_err(),
            LibraryError::EmptyPlaylistName
        );
        let list = lib.create_playlist(" Road trip ").unwrap();
        assert_eq!(list.name, "Road trip");
        assert!(list.track_ids.is_empty());
    }

    #[test]
    fn test_delete_selected_playlist_clears_selection() {
        let mut lib = library_with_playlists();
        lib.select_playlist("l2").unwrap();

        lib.delete_playlist("l1").unwrap();
        assert_eq!(lib.current_playlist.as_deref(), Some("l2"));

        lib.delete_playlist("l2").unwrap();
        assert_eq!(lib.current_playlist, None);
    }

    #[test]
    fn test_add_to_playlist_skips_duplicates() {
        let mut lib = library_with_playlists();

        assert!(!lib.add_to_playlist("l1", "t1").unwrap());
        assert!(lib.add_to_playlist("l2", "t1").unwrap());
        assert_eq!(lib.playlist("l2").unwrap().track_ids, vec!["t2", "t1"]);

        assert_eq!(
            lib.add_to_playlist("l2", "ghost").unwrap_err(),
            LibraryError::TrackNotFound("ghost".to_string())
        );
        assert_eq!(
            lib.add_to_playlist("ghost", "t1").unwrap_err(),
            LibraryError::PlaylistNotFound("ghost".to_string())
        );
    }

    #[test]
    fn test_remove_from_playlist_absent_track() {
        let mut lib = library_with_playlists();
        assert!(!lib.remove_from_playlist("l2", "t1").unwrap());
        assert!(lib.remove_from_playlist("l1", "t1").unwrap());
    }

    #[test]
    fn test_select_unknown_playlist() {
        let mut lib = Library::default();
        assert!(lib.select_playlist("missing").is_err());
        assert_eq!(lib.current_playlist, None);
    }

    #[test]
    fn test_playlist_tracks_skip_dangling_refs() {
        let mut lib = library_with_playlists();
        lib.playlists[0].track_ids.insert(0, "gone".to_string());

        let titles = lib
            .playlist_tracks("l1")
            .unwrap()
            .iter()
            .map(|t| t.title.clone())
            .collect::<Vec<_>>();

        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[test]
    fn test_genres_distinct_in_first_seen_order() {
        let mut lib = library_with_playlists();
        lib.tracks[0].genre = Some("Jazz".to_string());
        lib.tracks[1].genre = Some(String::new());
        lib.tracks.push(Track {
            genre: Some("Pop".to_string()),
            ..mock_track("t3", "Three", "Z", 3)
        });
        lib.tracks.push(Track {
            genre: Some("Jazz".to_string()),
            ..mock_track("t4", "Four", "Z", 4)
        });

        assert_eq!(lib.genres(), vec!["Jazz", "Pop"]);
    }

    #[test]
    fn test_merge_import_excludes_case_insensitive_duplicates() {
        let mut lib = Library::default();
        lib.tracks.push(mock_track("t1", "A", "B", 1));

        let report = lib
            .merge_import(
                vec![
                    mock_track("it_1", "a", "b", 2),
                    mock_track("it_2", "New", "Song", 2),
                    mock_track("it_3", "NEW", "song", 2),
                ],
                "Import: a",
                true,
            )
            .unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].id, "it_2");

        let list_id = report.playlist_id.unwrap();
        assert_eq!(lib.current_playlist.as_deref(), Some(list_id.as_str()));
        let list = lib.playlist(&list_id).unwrap();
        assert_eq!(list.name, "Import: a");
        assert_eq!(list.track_ids, vec!["it_2"]);
        assert_eq!(lib.tracks.len(), 2);
    }

    #[test]
    fn test_merge_import_nothing_new_creates_no_playlist() {
        let mut lib = Library::default();
        lib.tracks.push(mock_track("t1", "A", "B", 1));

        let report = lib
            .merge_import(vec![mock_track("x", "A", "B", 2)], "Import", true)
            .unwrap();

        assert!(report.added.is_empty());
        assert!(report.playlist_id.is_none());
        assert!(lib.playlists.is_empty());
        assert_eq!(lib.current_playlist, None);
    }

    #[test]
    fn test_merge_import_renames_colliding_ids() {
        let mut lib = Library::default();
        lib.tracks.push(mock_track("same", "A", "B", 1));

        let report = lib
            .merge_import(vec![mock_track("same", "C", "D", 2)], "Import", false)
            .unwrap();

        assert_ne!(report.added[0].id, "same");
        assert!(lib.validate().is_ok());
        assert_eq!(lib.current_playlist, None);
    }

    #[test]
    fn test_library_json_round_trip() -> anyhow::Result<()> {
        let mut lib = library_with_playlists();
        lib.current_playlist = Some("l1".to_string());

        let json = serde_json::to_string(&lib)?;
        let back: Library = serde_json::from_str(&json)?;

        assert_eq!(back, lib);
        assert_eq!(serde_json::to_string(&back)?, json);
        Ok(())
    }

    #[test]
    fn test_empty_selection_serializes_as_empty_string() -> anyhow::Result<()> {
        let lib: Library = serde_json::from_str(r#"{"tracks":[],"lists":[],"currentListId":""}"#)?;
        assert_eq!(lib.current_playlist, None);
        assert!(serde_json::to_string(&lib)?.contains(r#""currentListId":"""#));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut lib = Library::default();
        lib.tracks.push(mock_track("t1", "A", "B", 1));
        lib.tracks.push(mock_track("t1", "C", "D", 1));
        assert_eq!(
            lib.validate().unwrap_err(),
            LibraryError::DuplicateTrackId("t1".to_string())
        );
    }
}
