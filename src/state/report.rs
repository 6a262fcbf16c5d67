use crate::state::CharacterOutcome;
use crate::url::ShowKind;

/// A roster entry that could not be ingested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCharacter {
    /// The roster link the entry pointed at
    pub href: String,
    pub reason: String,
}

/// Tally of one show ingest
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub kind: ShowKind,
    /// External catalog id of the show
    pub mal_id: i64,
    /// Store-assigned internal id of the show
    pub show_id: i64,
    /// Whether this run created the show row
    pub show_inserted: bool,
    /// Number of roster tables found on the page
    pub characters_found: usize,
    pub inserted: usize,
    pub linked: usize,
    pub skipped: usize,
    pub failed: Vec<FailedCharacter>,
}

impl IngestReport {
    pub fn new(kind: ShowKind, mal_id: i64, show_id: i64, show_inserted: bool) -> Self {
        Self {
            kind,
            mal_id,
            show_id,
            show_inserted,
            characters_found: 0,
            inserted: 0,
            linked: 0,
            skipped: 0,
            failed: Vec::new(),
        }
    }

    /// Adds one roster entry's outcome to the tally
    pub fn record(&mut self, href: &str, outcome: &CharacterOutcome) {
        match outcome {
            CharacterOutcome::AlreadyLinked => self.skipped += 1,
            CharacterOutcome::Linked => self.linked += 1,
            CharacterOutcome::Inserted => self.inserted += 1,
            CharacterOutcome::Failed(reason) => self.failed.push(FailedCharacter {
                href: href.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    /// Number of roster entries processed so far
    pub fn processed(&self) -> usize {
        self.inserted + self.linked + self.skipped + self.failed.len()
    }

    /// True when the run wrote nothing to the catalog
    pub fn is_noop(&self) -> bool {
        !self.show_inserted && self.inserted == 0 && self.linked == 0
    }
}
