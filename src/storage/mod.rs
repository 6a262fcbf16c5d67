//! Storage module for persisting harvested catalog data
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Show, character and link existence checks used for deduplication
//! - Character image lists
//! - Run bookkeeping

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CatalogStore, StorageError, StorageResult};

use crate::url::ShowKind;

/// Represents a show in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowRecord {
    pub id: i64,
    pub mal_id: i64,
    pub kind: ShowKind,
    pub jp_title: String,
    pub en_title: Option<String>,
}

/// Represents a character in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRecord {
    /// External catalog id, used directly as the primary key
    pub id: String,
    pub en_name: String,
    pub jp_name: Option<String>,
    /// Distinct image URLs in gallery order
    pub image_urls: Vec<String>,
}

/// Represents one ingest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Assigned by the store; ignored on insert
    pub id: i64,
    pub show_url: String,
    pub overwrite: bool,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: String,
    pub status: RunStatus,
    pub inserted: u32,
    pub linked: u32,
    pub skipped: u32,
    pub failed: u32,
    pub error_message: Option<String>,
}

/// Status of a finished ingest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}
