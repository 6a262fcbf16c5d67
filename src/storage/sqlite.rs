//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CatalogStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CatalogStore, StorageError, StorageResult};
use crate::storage::{CharacterRecord, RunRecord, RunStatus, ShowRecord};
use crate::url::ShowKind;
use crate::HarvestError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn image_urls(&self, char_id: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM character_images WHERE char_id = ?1 ORDER BY position")?;

        let urls = stmt
            .query_map(params![char_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }
}

impl CatalogStore for SqliteStorage {
    // ===== Shows =====

    fn show_exists(&self, mal_id: i64, kind: ShowKind) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM shows WHERE mal_id = ?1 AND is_manga = ?2)",
            params![mal_id, kind.is_manga()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn insert_show(
        &mut self,
        mal_id: i64,
        jp_title: &str,
        en_title: Option<&str>,
        kind: ShowKind,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO shows (mal_id, is_manga, jp_title, en_title) VALUES (?1, ?2, ?3, ?4)",
            params![mal_id, kind.is_manga(), jp_title, en_title],
        )?;
        Ok(())
    }

    fn get_show_id(&self, mal_id: i64, kind: ShowKind) -> StorageResult<i64> {
        self.conn
            .query_row(
                "SELECT id FROM shows WHERE mal_id = ?1 AND is_manga = ?2",
                params![mal_id, kind.is_manga()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StorageError::ShowNotFound { mal_id, kind })
    }

    fn get_show(&self, show_id: i64) -> StorageResult<ShowRecord> {
        self.conn
            .query_row(
                "SELECT id, mal_id, is_manga, jp_title, en_title FROM shows WHERE id = ?1",
                params![show_id],
                |row| {
                    Ok(ShowRecord {
                        id: row.get(0)?,
                        mal_id: row.get(1)?,
                        kind: ShowKind::from_is_manga(row.get(2)?),
                        jp_title: row.get(3)?,
                        en_title: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or(StorageError::ShowIdNotFound(show_id))
    }

    // ===== Characters =====

    fn character_exists(&self, char_id: &str) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM characters WHERE char_id = ?1)",
            params![char_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn insert_character(&mut self, character: &CharacterRecord) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO characters (char_id, en_name, jp_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(char_id) DO UPDATE SET en_name = excluded.en_name, jp_name = excluded.jp_name",
            params![character.id, character.en_name, character.jp_name],
        )?;

        tx.execute(
            "DELETE FROM character_images WHERE char_id = ?1",
            params![character.id],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO character_images (char_id, position, url) VALUES (?1, ?2, ?3)",
            )?;
            for (position, url) in character.image_urls.iter().enumerate() {
                stmt.execute(params![character.id, position as i64, url])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_character(&self, char_id: &str) -> StorageResult<Option<CharacterRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT en_name, jp_name FROM characters WHERE char_id = ?1",
                params![char_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        match row {
            Some((en_name, jp_name)) => Ok(Some(CharacterRecord {
                id: char_id.to_string(),
                en_name,
                jp_name,
                image_urls: self.image_urls(char_id)?,
            })),
            None => Ok(None),
        }
    }

    // ===== Links =====

    fn character_has_show(&self, char_id: &str, show_id: i64) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM character_shows WHERE char_id = ?1 AND show_id = ?2)",
            params![char_id, show_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn add_show_to_character(&mut self, char_id: &str, show_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO character_shows (char_id, show_id) VALUES (?1, ?2)",
            params![char_id, show_id],
        )?;
        Ok(())
    }

    fn characters_for_show(&self, show_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT char_id FROM character_shows WHERE show_id = ?1 ORDER BY rowid",
        )?;

        let ids = stmt
            .query_map(params![show_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    // ===== Runs =====

    fn record_run(&mut self, run: &RunRecord) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO ingest_runs (show_url, overwrite, config_hash, started_at, finished_at,
             status, inserted, linked, skipped, failed, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                run.show_url,
                run.overwrite,
                run.config_hash,
                run.started_at,
                run.finished_at,
                run.status.to_db_string(),
                run.inserted,
                run.linked,
                run.skipped,
                run.failed,
                run.error_message
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, show_url, overwrite, config_hash, started_at, finished_at, status,
                 inserted, linked, skipped, failed, error_message
                 FROM ingest_runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        RunRecord {
                            id: row.get(0)?,
                            show_url: row.get(1)?,
                            overwrite: row.get(2)?,
                            config_hash: row.get(3)?,
                            started_at: row.get(4)?,
                            finished_at: row.get(5)?,
                            status: RunStatus::Aborted,
                            inserted: row.get(7)?,
                            linked: row.get(8)?,
                            skipped: row.get(9)?,
                            failed: row.get(10)?,
                            error_message: row.get(11)?,
                        },
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        match run {
            Some((mut run, status)) => {
                run.status = RunStatus::from_db_string(&status)
                    .ok_or_else(|| StorageError::Corrupt(format!("run status '{}'", status)))?;
                Ok(Some(run))
            }
            None => Ok(None),
        }
    }

    // ===== Statistics =====

    fn count_shows(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM shows")
    }

    fn count_characters(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM characters")
    }

    fn count_links(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM character_shows")
    }

    fn count_images(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM character_images")
    }

    fn count_runs(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM ingest_runs")
    }
}
