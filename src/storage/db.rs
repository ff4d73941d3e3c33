use std::path::Path;

use anyhow::anyhow;
use chrono::{DateTime, Local};
use rusqlite::Connection;

use crate::{
    config::Database,
    domain::Millis,
    storage::{error::StorageError, schema},
};

fn open_in_memory() -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

fn open_from_file(path: &Path) -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open(path)
}

pub fn open(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = if config.in_memory {
        open_in_memory()?
    } else {
        let path = config.resolved_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        log::debug!("opening store at {}", path.to_string_lossy());
        open_from_file(&path)?
    };
    schema::init(&db)?;
    Ok(db)
}

/// converts milliseconds since unix epoch to local date time
pub fn millis_to_local_time(since_unix: Millis) -> anyhow::Result<DateTime<Local>> {
    let datetime = DateTime::from_timestamp_millis(since_unix).ok_or(anyhow!(
        "failed to convert {since_unix} ms timestamp to datetime"
    ))?;

    Ok(DateTime::from(datetime))
}
