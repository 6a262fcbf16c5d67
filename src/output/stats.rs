//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::storage::{CatalogStore, RunRecord};
use crate::HarvestError;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Total number of stored shows
    pub total_shows: u64,

    /// Total number of stored characters
    pub total_characters: u64,

    /// Total number of character to show links
    pub total_links: u64,

    /// Total number of stored image URLs
    pub total_images: u64,

    /// Number of recorded ingest runs
    pub total_runs: u64,

    /// Most recent ingest run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn CatalogStore) -> Result<CatalogStatistics, HarvestError> {
    Ok(CatalogStatistics {
        total_shows: storage.count_shows()?,
        total_characters: storage.count_characters()?,
        total_links: storage.count_links()?,
        total_images: storage.count_images()?,
        total_runs: storage.count_runs()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Shows: {}", stats.total_shows);
    println!("  Characters: {}", stats.total_characters);
    println!("  Character links: {}", stats.total_links);
    println!("  Images: {}", stats.total_images);
    println!();

    let images_per_character = if stats.total_characters > 0 {
        stats.total_images as f64 / stats.total_characters as f64
    } else {
        0.0
    };
    println!("Average images per character: {:.1}", images_per_character);
    println!();

    println!("Runs recorded: {}", stats.total_runs);
    if let Some(run) = &stats.latest_run {
        println!("Latest run:");
        println!("  URL: {}", run.show_url);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        println!("  Finished: {}", run.finished_at);
        println!(
            "  Characters: {} inserted, {} linked, {} already present, {} failed",
            run.inserted, run.linked, run.skipped, run.failed
        );
        if let Some(message) = &run.error_message {
            println!("  Error: {}", message);
        }
    }
}
