use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("no playable tracks")]
    NothingPlayable,

    #[error("track '{0}' has no preview url")]
    NoPreview(String),

    #[error("deck is not playing anything")]
    Idle,

    #[error("playback failed: {0}")]
    Playback(String),
}
