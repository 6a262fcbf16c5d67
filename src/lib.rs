//! Roster-Harvest: an incremental catalog roster harvester
//!
//! This crate fetches a show's character roster from a catalog site, follows
//! each character to its detail and picture pages, and stores shows, characters
//! and their links in SQLite without refetching or duplicating anything that is
//! already stored.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Roster-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlParse(#[from] UrlParseError),

    #[error("Missing required field '{field}' on {url}")]
    MissingRequiredField { field: &'static str, url: String },

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Element '{element}' not found on {url}")]
    ElementNotFound { element: &'static str, url: String },

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Client(reqwest::Error),
}

/// Coarse classification of a [`HarvestError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UrlParse,
    MissingRequiredField,
    Network,
    ElementNotFound,
    Storage,
    Config,
}

impl HarvestError {
    /// Returns which class of failure this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UrlParse(_) => ErrorKind::UrlParse,
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::Network { .. } | Self::HttpStatus { .. } | Self::Client(_) => ErrorKind::Network,
            Self::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            Self::Storage(_) | Self::Database(_) => ErrorKind::Storage,
            Self::Config(_) | Self::InvalidBaseUrl(_) => ErrorKind::Config,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while resolving catalog URLs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlParseError {
    #[error("URL does not belong to catalog site '{marker}': {url}")]
    MissingDomainMarker { marker: String, url: String },

    #[error("Not a recognized show URL (expected anime/ or manga/): {0}")]
    UnknownKind(String),

    #[error("Show id is not numeric: {0}")]
    NonNumericId(String),

    #[error("Malformed character link: {0}")]
    MalformedCharacterHref(String),
}

/// Result type alias for Roster-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlParseError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, Harvester};
pub use state::{CharacterOutcome, IngestReport};
pub use url::{resolve_show_url, ShowKind, ShowUrl};
