//! Crawler module for catalog page fetching and ingestion
//!
//! This module contains the core harvesting logic, including:
//! - Fixed per-request pacing
//! - HTTP fetching with optional bounded retry
//! - Typed HTML queries
//! - Show, character, and gallery ingestion

mod character;
mod coordinator;
mod fetcher;
mod gallery;
mod pacer;
mod parser;

pub use character::{parse_character_page, split_full_name, CharacterPage, GALLERY_SUFFIX};
pub use coordinator::{harvest, parse_roster_page, Harvester, RosterPage};
pub use fetcher::{build_http_client, PageFetcher};
pub use gallery::{extract_gallery_images, resolve_gallery, CHARACTER_IMAGE_MARKER, GALLERY_ITEM_CLASS};
pub use pacer::{Pacer, RequestClass};
pub use parser::{AttrPredicate, Document, Node};
