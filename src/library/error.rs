use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LibraryError {
    #[error("track {0} not found")]
    TrackNotFound(String),

    #[error("playlist {0} not found")]
    PlaylistNotFound(String),

    #[error("title and artist are required")]
    MissingTitleOrArtist,

    #[error("playlist name must not be empty")]
    EmptyPlaylistName,

    #[error("duplicate track id {0}")]
    DuplicateTrackId(String),
}
