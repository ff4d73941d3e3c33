use rusqlite::Connection;

pub mod tables {
    pub const KV: &str = "kv";

    #[cfg(test)]
    pub const ALL_TABLES: &[&str] = &[KV];
}

pub mod columns {
    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
    pub const UPDATED_AT: &str = "updated_at";
}

/// keys of the records kept in the kv table
pub mod keys {
    pub const LIBRARY: &str = "vibelist_db";
    pub const VOLUME: &str = "vibelist_volume";
    pub const HAS_VISITED: &str = "vibelist_has_visited";
    pub const LAST_STATION: &str = "vibelist_last_station";
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
