//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Roster-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Catalog entries, unique per external id and kind
CREATE TABLE IF NOT EXISTS shows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mal_id INTEGER NOT NULL,
    is_manga INTEGER NOT NULL,
    jp_title TEXT NOT NULL,
    en_title TEXT,
    UNIQUE(mal_id, is_manga)
);

-- Characters, keyed by their external id
CREATE TABLE IF NOT EXISTS characters (
    char_id TEXT PRIMARY KEY,
    en_name TEXT NOT NULL,
    jp_name TEXT
);

-- Ordered, distinct portrait URLs per character
CREATE TABLE IF NOT EXISTS character_images (
    char_id TEXT NOT NULL REFERENCES characters(char_id),
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    PRIMARY KEY(char_id, position),
    UNIQUE(char_id, url)
);

-- Show/character links
CREATE TABLE IF NOT EXISTS character_shows (
    char_id TEXT NOT NULL REFERENCES characters(char_id),
    show_id INTEGER NOT NULL REFERENCES shows(id),
    UNIQUE(char_id, show_id)
);

CREATE INDEX IF NOT EXISTS idx_character_shows_show ON character_shows(show_id);

-- Finished ingest runs
CREATE TABLE IF NOT EXISTS ingest_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    show_url TEXT NOT NULL,
    overwrite INTEGER NOT NULL,
    config_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    status TEXT NOT NULL,
    inserted INTEGER NOT NULL DEFAULT 0,
    linked INTEGER NOT NULL DEFAULT 0,
    skipped INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
