use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::deck::sink::RemoteSink;
use crate::domain::track::{Track, TrackDraft};
use crate::library::view::{SortBy, TrackFilter};
use crate::search::{itunes::ItunesClient, stations::Stations};
use crate::session::Session;
use crate::storage::db::millis_to_local_time;
use crate::storage::operations::Storage;

#[derive(Parser)]
#[command(name = "vibelist")]
#[command(version = "0.1")]
#[command(about = "Music library manager with stations and a web deck")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage tracks
    #[command(subcommand)]
    Tracks(TrackCommands),
    /// Manage playlists
    #[command(subcommand)]
    Playlists(PlaylistCommands),
    /// Search the catalogue and import the results as a new playlist
    Search { query: String },
    /// Import a station into a radio playlist
    Station { keyword: String },
    /// List known stations
    Stations,
    /// First-run setup: load the welcome station once
    Welcome {
        #[arg(default_value = crate::search::stations::WELCOME_STATION)]
        keyword: String,
    },
    /// Write the library to a JSON backup
    Export {
        /// File or directory, defaults to the current directory
        path: Option<PathBuf>,
    },
    /// Replace the library with a JSON backup
    Import { path: PathBuf },
    /// Run http server hosting the library and the deck
    Serve,
}

#[derive(Subcommand)]
pub enum TrackCommands {
    /// List tracks
    List {
        /// Match title, artist or album
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        genre: Option<String>,
        /// newest, title, artist or fav
        #[arg(short, long, default_value_t = SortBy::Newest)]
        sort: SortBy,
    },
    /// Add a track by hand
    Add(TrackArgs),
    /// Replace the fields of a track
    Edit {
        id: String,
        #[command(flatten)]
        fields: TrackArgs,
    },
    Delete { id: String },
    /// Toggle the favorite flag
    Fav { id: String },
}

#[derive(Args)]
pub struct TrackArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub artist: String,
    #[arg(long)]
    pub album: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
    /// Preview audio url
    #[arg(long)]
    pub url: Option<String>,
    /// Cover art url
    #[arg(long)]
    pub cover: Option<String>,
}

impl From<TrackArgs> for TrackDraft {
    fn from(args: TrackArgs) -> Self {
        TrackDraft {
            title: args.title,
            artist: args.artist,
            album: args.album,
            genre: args.genre,
            preview_url: args.url,
            cover_url: args.cover,
        }
    }
}

#[derive(Subcommand)]
pub enum PlaylistCommands {
    List,
    /// Show the tracks of a playlist
    Show { id: String },
    Create { name: String },
    Delete { id: String },
    /// Make a playlist the current one
    Select { id: String },
    /// Add a track to a playlist
    Add { id: String, track_id: String },
    /// Remove a track from a playlist
    Remove { id: String, track_id: String },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = load_config(&cli.config)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cfg.log_level))
        .init();
    log::debug!("config version {}", cfg.version);

    let audio = RemoteSink::new();
    let mut session = open_session(&cfg, audio.clone())?;

    match cli.command {
        Commands::Tracks(command) => run_tracks(&mut session, command)?,
        Commands::Playlists(command) => run_playlists(&mut session, command)?,

        Commands::Search { query } => {
            let report = session.import_search(&query)?;
            println!(
                "Found {} tracks: {} added, {} already in the library",
                report.found, report.added, report.skipped
            );
        }

        Commands::Station { keyword } => {
            let report = session.load_station(&keyword)?;
            println!(
                "{}: {} tracks, {} new",
                Stations::playlist_name(&keyword),
                report.found,
                report.added
            );
        }

        Commands::Stations => {
            let last = session.storage().last_station()?;
            for (keyword, query) in session.stations().iter() {
                let marker = if last.as_deref() == Some(keyword) { "*" } else { " " };
                println!("{marker} {keyword:<12} {query}");
            }
        }

        Commands::Welcome { keyword } => {
            if session.welcome(&keyword)? {
                println!("Welcome! {} tracks in the library", session.library().tracks.len());
            } else {
                println!("Already set up");
            }
        }

        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from("."));
            let written = session.export_to(&path)?;
            println!("Library exported to {}", written.to_string_lossy());
        }

        Commands::Import { path } => {
            session
                .import_from(&path)
                .with_context(|| format!("Failed to import {}", path.to_string_lossy()))?;
            println!(
                "Library replaced: {} tracks, {} playlists",
                session.library().tracks.len(),
                session.library().playlists.len()
            );
        }

        Commands::Serve => {
            println!("Starting HTTP server...");

            let http_server = crate::http::server::HttpServer::new(session, audio, cfg.http);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }
    }

    Ok(())
}

/// A missing config file means defaults.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        Ok(Config::default())
    }
}

fn open_session(cfg: &config::Config, audio: RemoteSink) -> anyhow::Result<Session> {
    let storage = Storage::new(&cfg.database).context("Failed to initialize storage")?;
    let search = ItunesClient::new(&cfg.search).context("Failed to build search client")?;
    let session = Session::open(
        storage,
        Box::new(search),
        Stations::new(&cfg.stations),
        Box::new(audio),
    )?;
    Ok(session)
}

fn run_tracks(session: &mut Session, command: TrackCommands) -> anyhow::Result<()> {
    match command {
        TrackCommands::List { query, genre, sort } => {
            let tracks = session.tracks(&TrackFilter { query, genre, sort });
            if tracks.is_empty() {
                println!("No tracks");
            }
            for track in tracks {
                print_track(track)?;
            }
        }
        TrackCommands::Add(fields) => {
            let track = session.add_track(&fields.into())?;
            println!("Added {}", track.id);
        }
        TrackCommands::Edit { id, fields } => {
            let track = session.update_track(&id, &fields.into())?;
            println!("Updated {}", track.id);
        }
        TrackCommands::Delete { id } => {
            let track = session.delete_track(&id)?;
            println!("Deleted \"{}\" by {}", track.title, track.artist);
        }
        TrackCommands::Fav { id } => {
            let fav = session.toggle_favorite(&id)?;
            println!("{id} is {}", if fav { "a favorite" } else { "no longer a favorite" });
        }
    }
    Ok(())
}

fn run_playlists(session: &mut Session, command: PlaylistCommands) -> anyhow::Result<()> {
    match command {
        PlaylistCommands::List => {
            let library = session.library();
            for list in &library.playlists {
                let marker = if library.current_playlist.as_deref() == Some(list.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {}  {} ({} tracks), created {}",
                    list.id,
                    list.name,
                    list.track_ids.len(),
                    millis_to_local_time(list.created_at)?.format("%Y-%m-%d %H:%M")
                );
            }
        }
        PlaylistCommands::Show { id } => {
            let library = session.library();
            let tracks = library.playlist_tracks(&id)?;
            if let Some(list) = library.playlist(&id) {
                println!("{} ({} tracks)", list.name, tracks.len());
            }
            for track in tracks {
                print_track(track)?;
            }
        }
        PlaylistCommands::Create { name } => {
            let list = session.create_playlist(&name)?;
            println!("Created {}", list.id);
        }
        PlaylistCommands::Delete { id } => {
            let list = session.delete_playlist(&id)?;
            println!("Deleted playlist \"{}\"", list.name);
        }
        PlaylistCommands::Select { id } => {
            session.select_playlist(&id)?;
            println!("Current playlist is {id}");
        }
        PlaylistCommands::Add { id, track_id } => {
            if session.add_to_playlist(&id, &track_id)? {
                println!("Added {track_id} to {id}");
            } else {
                println!("{track_id} is already in {id}");
            }
        }
        PlaylistCommands::Remove { id, track_id } => {
            if session.remove_from_playlist(&id, &track_id)? {
                println!("Removed {track_id} from {id}");
            } else {
                println!("{track_id} was not in {id}");
            }
        }
    }
    Ok(())
}

fn print_track(track: &Track) -> anyhow::Result<()> {
    let fav = if track.favorite { "♥" } else { " " };
    println!("{fav} {}  {} - {}", track.id, track.artist, track.title);
    if let Some(album) = &track.album {
        println!("    album: {album}");
    }
    if let Some(genre) = &track.genre {
        println!("    genre: {genre}");
    }
    println!(
        "    added {}{}",
        millis_to_local_time(track.added_at)?.format("%Y-%m-%d %H:%M"),
        if track.is_playable() { "" } else { ", no preview" }
    );
    Ok(())
}
