//! State module for tracking ingest progress
//!
//! # Components
//!
//! - `CharacterOutcome`: what happened to a single roster entry
//! - `IngestReport`: per-run tally of outcomes for one show

mod outcome;
mod report;

// Re-export main types
pub use outcome::CharacterOutcome;
pub use report::{FailedCharacter, IngestReport};
