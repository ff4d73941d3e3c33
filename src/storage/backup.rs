//! Library backups as standalone JSON files

use std::path::{Path, PathBuf};

use crate::{
    domain::{Millis, now_millis},
    library::Library,
    storage::error::StorageError,
};

pub fn default_backup_name(at: Millis) -> String {
    format!("vibelist_backup_{at}.json")
}

/// Writes the library as pretty printed JSON.
///
/// When `path` is a directory the file gets the default backup name inside it.
pub fn export_library(library: &Library, path: &Path) -> Result<PathBuf, StorageError> {
    let target = if path.is_dir() {
        path.join(default_backup_name(now_millis()))
    } else {
        path.to_path_buf()
    };

    let json = serde_json::to_string_pretty(library)?;
    std::fs::write(&target, json)?;
    log::info!("exported {} tracks to {}", library.tracks.len(), target.to_string_lossy());
    Ok(target)
}

/// Parses and validates a backup. Nothing is replaced unless this succeeds.
pub fn parse_backup(json: &str) -> Result<Library, StorageError> {
    let library: Library = serde_json::from_str(json)?;
    library.validate()?;
    Ok(library)
}

pub fn read_backup(path: &Path) -> Result<Library, StorageError> {
    let json = std::fs::read_to_string(path)?;
    parse_backup(&json)
}
