use rusqlite::{OptionalExtension, params};

use crate::{
    config,
    domain::now_millis,
    library::Library,
    storage::{
        db,
        error::StorageError,
        schema::{columns, keys, tables},
    },
};

use columns::*;
use tables::*;

pub const DEFAULT_VOLUME: f32 = 0.7;

/// Main structure that implements all persistence
pub struct Storage {
    pub(crate) db: rusqlite::Connection,
}

impl Storage {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db: rusqlite::Connection = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .db
            .query_row(
                &format!("SELECT {VALUE} FROM {KV} WHERE {KEY} = ?1"),
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db.execute(
            &format!(
                "INSERT INTO {KV} ({KEY}, {VALUE}, {UPDATED_AT}) VALUES (?1, ?2, ?3)
                 ON CONFLICT({KEY}) DO UPDATE
                 SET {VALUE} = excluded.{VALUE}, {UPDATED_AT} = excluded.{UPDATED_AT}"
            ),
            params![key, value, now_millis()],
        )?;
        Ok(())
    }

    /// Reads the persisted library.
    ///
    /// A missing record yields an empty library, and so does a malformed one:
    /// the broken record is logged and left in place until the next save.
    pub fn load_library(&self) -> Result<Library, StorageError> {
        let Some(raw) = self.get(keys::LIBRARY)? else {
            return Ok(Library::default());
        };

        match serde_json::from_str::<Library>(&raw) {
            Ok(library) => Ok(library),
            Err(e) => {
                log::error!("Failed to load library, starting empty: {e}");
                Ok(Library::default())
            }
        }
    }

    pub fn save_library(&self, library: &Library) -> Result<(), StorageError> {
        let json = serde_json::to_string(library)?;
        self.set(keys::LIBRARY, &json)
    }

    /// playback volume in 0..=1, `DEFAULT_VOLUME` when unset or unreadable
    pub fn load_volume(&self) -> Result<f32, StorageError> {
        let volume = self
            .get(keys::VOLUME)?
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_VOLUME);
        Ok(volume)
    }

    pub fn save_volume(&self, volume: f32) -> Result<(), StorageError> {
        self.set(keys::VOLUME, &volume.clamp(0.0, 1.0).to_string())
    }

    pub fn has_visited(&self) -> Result<bool, StorageError> {
        Ok(self.get(keys::HAS_VISITED)?.as_deref() == Some("true"))
    }

    pub fn mark_visited(&self) -> Result<(), StorageError> {
        self.set(keys::HAS_VISITED, "true")
    }

    pub fn last_station(&self) -> Result<Option<String>, StorageError> {
        self.get(keys::LAST_STATION)
    }

    pub fn set_last_station(&self, keyword: &str) -> Result<(), StorageError> {
        self.set(keys::LAST_STATION, keyword)
    }
}
