use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS reports (
    date_key TEXT PRIMARY KEY CHECK (length(date_key) = 10),
    collaborator TEXT NOT NULL,
    data BLOB NOT NULL,
    saved_at INTEGER NOT NULL DEFAULT (CAST(unixepoch('now','subsec') * 1000 AS INTEGER))
);

CREATE TABLE IF NOT EXISTS change_log (
    rowid INTEGER PRIMARY KEY,
    user TEXT NOT NULL,
    email TEXT NOT NULL,
    logged_at INTEGER NOT NULL,
    change TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS login_history (
    rowid INTEGER PRIMARY KEY,
    user TEXT NOT NULL,
    email TEXT NOT NULL,
    logged_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS equipment_logs (
    rowid INTEGER PRIMARY KEY,
    fault_id BLOB NOT NULL UNIQUE CHECK (length(fault_id) = 16),
    equipment TEXT NOT NULL,
    logged_at INTEGER NOT NULL,
    description TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_equipment_logs_equipment ON equipment_logs (equipment);

CREATE TABLE IF NOT EXISTS photos (
    hash BLOB PRIMARY KEY CHECK (length(hash) = 32),
    content_type TEXT NOT NULL,
    bytes BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS preventives (
    rowid INTEGER PRIMARY KEY,
    preventive_id BLOB NOT NULL UNIQUE CHECK (length(preventive_id) = 16),
    equipment TEXT NOT NULL,
    service_date TEXT NOT NULL CHECK (length(service_date) = 10),
    photo_hash BLOB REFERENCES photos (hash),
    photo_type TEXT,
    photo_url TEXT,
    collaborator TEXT NOT NULL,
    CHECK ((photo_hash IS NULL) != (photo_url IS NULL))
);
CREATE INDEX IF NOT EXISTS idx_preventives_date ON preventives (service_date DESC, rowid DESC);

CREATE TABLE IF NOT EXISTS users (
    email TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    salt BLOB NOT NULL CHECK (length(salt) = 16),
    digest BLOB NOT NULL CHECK (length(digest) = 32),
    created_at INTEGER NOT NULL DEFAULT (CAST(unixepoch('now','subsec') * 1000 AS INTEGER))
);

CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    registration_locked INTEGER NOT NULL DEFAULT 0
);
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
