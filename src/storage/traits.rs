//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CharacterRecord, RunRecord, ShowRecord};
use crate::url::ShowKind;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Show not found: {kind} {mal_id}")]
    ShowNotFound { mal_id: i64, kind: ShowKind },

    #[error("Show id not found: {0}")]
    ShowIdNotFound(i64),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for catalog storage backends
///
/// Every write is atomic on its own; nothing spans a whole roster. The
/// harvester only relies on existence checks, so an interrupted run can be
/// repeated and will pick up where it stopped.
pub trait CatalogStore {
    // ===== Shows =====

    /// Checks whether a show with this external id and kind is stored
    fn show_exists(&self, mal_id: i64, kind: ShowKind) -> StorageResult<bool>;

    /// Inserts a show row
    fn insert_show(
        &mut self,
        mal_id: i64,
        jp_title: &str,
        en_title: Option<&str>,
        kind: ShowKind,
    ) -> StorageResult<()>;

    /// Gets the store-assigned internal id of a show
    fn get_show_id(&self, mal_id: i64, kind: ShowKind) -> StorageResult<i64>;

    /// Gets a show by internal id
    fn get_show(&self, show_id: i64) -> StorageResult<ShowRecord>;

    // ===== Characters =====

    /// Checks whether a character is stored
    fn character_exists(&self, char_id: &str) -> StorageResult<bool>;

    /// Inserts a character, or replaces its names and images if it is already stored
    fn insert_character(&mut self, character: &CharacterRecord) -> StorageResult<()>;

    /// Gets a character with its image list
    fn get_character(&self, char_id: &str) -> StorageResult<Option<CharacterRecord>>;

    // ===== Links =====

    /// Checks whether a character is linked to a show
    fn character_has_show(&self, char_id: &str, show_id: i64) -> StorageResult<bool>;

    /// Links a character to a show
    fn add_show_to_character(&mut self, char_id: &str, show_id: i64) -> StorageResult<()>;

    /// Gets the ids of all characters linked to a show
    fn characters_for_show(&self, show_id: i64) -> StorageResult<Vec<String>>;

    // ===== Runs =====

    /// Records a finished ingest run, returning its id
    fn record_run(&mut self, run: &RunRecord) -> StorageResult<i64>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Statistics =====

    fn count_shows(&self) -> StorageResult<u64>;

    fn count_characters(&self) -> StorageResult<u64>;

    fn count_links(&self) -> StorageResult<u64>;

    fn count_images(&self) -> StorageResult<u64>;

    fn count_runs(&self) -> StorageResult<u64>;
}
