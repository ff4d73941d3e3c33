use rouille::Response;

use crate::{
    deck::error::DeckError,
    importer::ImportError,
    library::error::LibraryError,
    session::SessionError,
    storage::error::StorageError,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::TrackNotFound(_) | LibraryError::PlaylistNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            LibraryError::MissingTitleOrArtist
            | LibraryError::EmptyPlaylistName
            | LibraryError::DuplicateTrackId(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Json(_) | StorageError::InvalidBackup(_) => {
                ApiError::BadRequest(err.to_string())
            }
            StorageError::Database(_) | StorageError::Fs(_) | StorageError::Internal(_) => {
                log::error!("storage failure: {err}");
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Search(e) => ApiError::BadGateway(e.to_string()),
            ImportError::NoResults => ApiError::NotFound(err.to_string()),
            ImportError::AllDuplicates(_) => ApiError::Conflict(err.to_string()),
            ImportError::Library(e) => e.into(),
        }
    }
}

impl From<DeckError> for ApiError {
    fn from(err: DeckError) -> Self {
        match err {
            DeckError::NothingPlayable | DeckError::NoPreview(_) => {
                ApiError::BadRequest(err.to_string())
            }
            DeckError::Idle => ApiError::Conflict(err.to_string()),
            DeckError::Playback(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Library(e) => e.into(),
            SessionError::Storage(e) => e.into(),
            SessionError::Import(e) => e.into(),
            SessionError::Deck(e) => e.into(),
        }
    }
}

impl From<rouille::input::json::JsonError> for ApiError {
    fn from(err: rouille::input::json::JsonError) -> Self {
        ApiError::BadRequest(format!("invalid json body: {err}"))
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Conflict(_) => 409,
            ApiError::BadGateway(_) => 502,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => Response::text(msg).with_status_code(status),
        }
    }
}
