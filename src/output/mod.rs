//! Output module for reporting harvest results
//!
//! This module handles:
//! - Summarizing the outcome of one ingest run
//! - Printing catalog statistics from the database

pub mod stats;

pub use stats::{load_statistics, print_statistics, CatalogStatistics};

use crate::state::IngestReport;

/// Prints the tally of one ingest run to stdout
///
/// # Arguments
///
/// * `report` - The report returned by the harvester
pub fn print_report(report: &IngestReport) {
    println!("=== Ingest Report ===\n");

    println!(
        "Show: {} {} (internal id {}){}",
        report.kind,
        report.mal_id,
        report.show_id,
        if report.show_inserted { " [new]" } else { "" }
    );
    println!("Characters found: {}", report.characters_found);
    println!("  Inserted: {}", report.inserted);
    println!("  Linked: {}", report.linked);
    println!("  Already present: {}", report.skipped);
    println!("  Failed: {}", report.failed.len());

    if !report.failed.is_empty() {
        println!("\nFailed characters:");
        for failed in &report.failed {
            println!("  - {}: {}", failed.href, failed.reason);
        }
    }

    if report.is_noop() {
        println!("\nNothing new to store.");
    }
}
