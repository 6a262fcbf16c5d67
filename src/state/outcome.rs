use std::fmt;

/// Result of ingesting one roster entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterOutcome {
    /// Character and link already stored; nothing was written
    AlreadyLinked,
    /// Character already stored; only the show link was added
    Linked,
    /// Character page was fetched and the character stored (and linked)
    Inserted,
    /// Ingestion failed and the run continued past it
    Failed(String),
}

impl fmt::Display for CharacterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyLinked => write!(f, "already linked"),
            Self::Linked => write!(f, "linked"),
            Self::Inserted => write!(f, "inserted"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
