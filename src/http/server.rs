use log::info;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::{
    config::HttpConfig,
    deck::{
        DeckState,
        sink::{AudioState, RemoteSink},
    },
    domain::{now_millis, track::TrackDraft},
    http::error::ApiError,
    importer::{Catalog, ImportReport},
    library::{
        Library,
        view::{SortBy, TrackFilter},
    },
    search::stations::WELCOME_STATION,
    session::Session,
    storage::backup::default_backup_name,
};

pub struct HttpServer {
    session: Arc<Mutex<Session>>,
    /// remote searches go through here, outside the session lock
    catalog: Catalog,
    audio: RemoteSink,
    pub config: HttpConfig,
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Deserialize)]
struct TrackRefBody {
    #[serde(rename = "trackId")]
    track_id: String,
}

#[derive(Deserialize)]
struct QueryBody {
    query: String,
}

#[derive(Deserialize)]
struct VolumeBody {
    volume: f32,
}

#[derive(Deserialize)]
struct SeekBody {
    fraction: f64,
}

#[derive(Deserialize, Default)]
struct WelcomeBody {
    #[serde(default)]
    station: Option<String>,
}

/// What to put on the deck
#[derive(Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
enum PlayBody {
    All {
        #[serde(default)]
        query: Option<String>,
        #[serde(default)]
        genre: Option<String>,
        #[serde(default)]
        sort: SortBy,
    },
    Playlist {
        id: String,
    },
    Favorites,
    Track {
        id: String,
    },
}

#[derive(Serialize)]
struct DeckResponse {
    deck: DeckState,
    audio: AudioState,
}

impl HttpServer {
    /// `audio` must be the sink the session's deck was opened with.
    pub fn new(session: Session, audio: RemoteSink, config: HttpConfig) -> Self {
        Self {
            catalog: session.catalog().clone(),
            session: Arc::new(Mutex::new(session)),
            audio,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/) => {
                Response::html(include_str!("../../html/deck.html"))
            },

            (GET) (/api/tracks) => {
                let filter = Self::filter_from_params(request);
                self.with_session(|s| {
                    let filter = filter?;
                    Ok(s.tracks(&filter).into_iter().cloned().collect::<Vec<_>>())
                })
            },
            (POST) (/api/tracks) => {
                self.with_session(|s| {
                    let draft: TrackDraft = rouille::input::json_input(request)?;
                    Ok(s.add_track(&draft)?)
                })
            },
            (PUT) (/api/tracks/{id: String}) => {
                self.with_session(|s| {
                    let draft: TrackDraft = rouille::input::json_input(request)?;
                    Ok(s.update_track(&id, &draft)?)
                })
            },
            (DELETE) (/api/tracks/{id: String}) => {
                self.with_session(|s| Ok(s.delete_track(&id)?))
            },
            (POST) (/api/tracks/{id: String}/fav) => {
                self.with_session(|s| Ok(json!({ "favorite": s.toggle_favorite(&id)? })))
            },
            (GET) (/api/genres) => {
                self.with_session(|s| Ok(s.library().genres()))
            },

            (GET) (/api/playlists) => {
                self.with_session(|s| {
                    let library = s.library();
                    Ok(json!({
                        "lists": library.playlists,
                        "currentListId": library.current_playlist.clone().unwrap_or_default(),
                    }))
                })
            },
            (POST) (/api/playlists) => {
                self.with_session(|s| {
                    let body: NameBody = rouille::input::json_input(request)?;
                    Ok(s.create_playlist(&body.name)?)
                })
            },
            (GET) (/api/playlists/{id: String}) => {
                self.with_session(|s| {
                    let library = s.library();
                    let tracks = library.playlist_tracks(&id)?;
                    Ok(json!({ "playlist": library.playlist(&id), "tracks": tracks }))
                })
            },
            (DELETE) (/api/playlists/{id: String}) => {
                self.with_session(|s| Ok(s.delete_playlist(&id)?))
            },
            (POST) (/api/playlists/{id: String}/select) => {
                self.with_session(|s| {
                    s.select_playlist(&id)?;
                    Ok(json!({ "currentListId": id }))
                })
            },
            (POST) (/api/playlists/{id: String}/tracks) => {
                self.with_session(|s| {
                    let body: TrackRefBody = rouille::input::json_input(request)?;
                    Ok(json!({ "added": s.add_to_playlist(&id, &body.track_id)? }))
                })
            },
            (DELETE) (/api/playlists/{id: String}/tracks/{track_id: String}) => {
                self.with_session(|s| {
                    Ok(json!({ "removed": s.remove_from_playlist(&id, &track_id)? }))
                })
            },

            (POST) (/api/search) => {
                Self::render(self.handle_search(request))
            },
            (GET) (/api/stations) => {
                let stations = self
                    .catalog
                    .stations()
                    .iter()
                    .map(|(keyword, query)| json!({ "keyword": keyword, "query": query }))
                    .collect::<Vec<_>>();
                Response::json(&stations)
            },
            (POST) (/api/stations/{keyword: String}) => {
                let fetched = self.catalog.station(&keyword);
                self.with_session(|s| Ok(s.station_results(&keyword, fetched?)?))
            },
            (POST) (/api/welcome) => {
                Self::render(self.handle_welcome(request))
            },

            (GET) (/api/export) => {
                self.handle_export()
            },
            (POST) (/api/import) => {
                self.with_session(|s| {
                    let library: Library = rouille::input::json_input(request)?;
                    s.replace_library(library)?;
                    let library = s.library();
                    Ok(json!({ "tracks": library.tracks.len(), "lists": library.playlists.len() }))
                })
            },

            (GET) (/api/deck) => {
                self.with_session(|s| Ok(self.deck_response(s)))
            },
            (POST) (/api/deck/play) => {
                self.with_session(|s| {
                    let body: PlayBody = rouille::input::json_input(request)?;
                    Self::play(s, body)?;
                    Ok(self.deck_response(s))
                })
            },
            (POST) (/api/deck/toggle) => {
                self.with_session(|s| {
                    s.deck_mut().toggle_play()?;
                    Ok(self.deck_response(s))
                })
            },
            (POST) (/api/deck/next) => {
                self.with_session(|s| {
                    s.deck_mut().next()?;
                    Ok(self.deck_response(s))
                })
            },
            (POST) (/api/deck/ended) => {
                self.with_session(|s| {
                    s.deck_mut().track_ended()?;
                    Ok(self.deck_response(s))
                })
            },
            (POST) (/api/deck/previous) => {
                self.with_session(|s| {
                    s.deck_mut().previous()?;
                    Ok(self.deck_response(s))
                })
            },
            (POST) (/api/deck/shuffle) => {
                self.with_session(|s| {
                    s.deck_mut().toggle_shuffle();
                    Ok(self.deck_response(s))
                })
            },
            (POST) (/api/deck/volume) => {
                self.with_session(|s| {
                    let body: VolumeBody = rouille::input::json_input(request)?;
                    s.set_volume(body.volume)?;
                    Ok(self.deck_response(s))
                })
            },
            (POST) (/api/deck/seek) => {
                self.with_session(|s| {
                    let body: SeekBody = rouille::input::json_input(request)?;
                    s.deck_mut().seek(body.fraction)?;
                    Ok(self.deck_response(s))
                })
            },
            (POST) (/api/deck/close) => {
                self.with_session(|s| {
                    s.deck_mut().close();
                    Ok(self.deck_response(s))
                })
            },
            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn has_json_body(request: &Request) -> bool {
        request
            .header("Content-Type")
            .is_some_and(|ct| ct.starts_with("application/json"))
    }

    /// Runs `f` under the session lock.
    fn locked<T>(
        &self,
        f: impl FnOnce(&mut Session) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        match self.session.lock() {
            Ok(mut session) => f(&mut session),
            Err(e) => Err(ApiError::Internal(format!(
                "Could not access session under lock: {e}"
            ))),
        }
    }

    /// Runs `f` under the session lock and renders its result as JSON.
    fn with_session<T: Serialize>(
        &self,
        f: impl FnOnce(&mut Session) -> Result<T, ApiError>,
    ) -> Response {
        Self::render(self.locked(f))
    }

    fn render<T: Serialize>(result: Result<T, ApiError>) -> Response {
        match result {
            Ok(value) => Response::json(&value),
            Err(e) => {
                log::warn!("request failed: {e:?}");
                e.into_response()
            }
        }
    }

    /// The search itself runs unlocked, only the merge holds the session.
    fn handle_search(&self, request: &Request) -> Result<ImportReport, ApiError> {
        let body: QueryBody = rouille::input::json_input(request)?;
        let fetched = self.catalog.search(&body.query);
        self.locked(|s| Ok(s.import_results(&body.query, fetched?)?))
    }

    fn handle_welcome(&self, request: &Request) -> Result<serde_json::Value, ApiError> {
        let body: WelcomeBody = if Self::has_json_body(request) {
            rouille::input::json_input(request)?
        } else {
            WelcomeBody::default()
        };
        let station = body.station.unwrap_or_else(|| WELCOME_STATION.to_string());

        if !self.locked(|s| Ok(s.claim_first_visit()?))? {
            return Ok(json!({ "initialized": false }));
        }
        let fetched = self.catalog.station(&station);
        self.locked(|s| {
            s.welcome_results(&station, fetched);
            Ok(json!({ "initialized": true }))
        })
    }

    fn filter_from_params(request: &Request) -> Result<TrackFilter, ApiError> {
        let sort = match request.get_param("sort") {
            Some(sort) => sort.parse::<SortBy>().map_err(ApiError::BadRequest)?,
            None => SortBy::default(),
        };
        Ok(TrackFilter {
            query: request.get_param("q"),
            genre: request.get_param("genre"),
            sort,
        })
    }

    fn play(session: &mut Session, body: PlayBody) -> Result<(), ApiError> {
        match body {
            PlayBody::All { query, genre, sort } => {
                session.play_all(&TrackFilter { query, genre, sort })?;
            }
            PlayBody::Playlist { id } => {
                session.play_playlist(&id)?;
            }
            PlayBody::Favorites => {
                session.play_favorites()?;
            }
            PlayBody::Track { id } => {
                session.play_track(&id)?;
            }
        }
        Ok(())
    }

    fn deck_response(&self, session: &Session) -> DeckResponse {
        DeckResponse {
            deck: session.deck().state(),
            audio: self.audio.state(),
        }
    }

    fn handle_export(&self) -> Response {
        let file_name = default_backup_name(now_millis());
        let response = self.with_session(|s| Ok(s.library().clone()));
        if response.status_code != 200 {
            return response;
        }
        response.with_additional_header(
            "Content-Disposition",
            format!("attachment; filename=\"{file_name}\""),
        )
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
