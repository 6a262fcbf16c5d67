//! Fixed pre-request pacing
//!
//! Every request waits a fixed number of politeness units before it is sent.
//! The number of units depends only on the kind of page being requested; there
//! is no adaptive backoff. The crawl is strictly sequential, so the wait alone
//! bounds the request rate.

use crate::config::PolitenessConfig;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// The kinds of page the crawler requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// A show's character roster page
    Roster,
    /// A single character's detail page
    CharacterDetail,
    /// A character's picture gallery page
    Gallery,
}

impl RequestClass {
    /// Number of politeness units to wait before a request of this class
    pub fn units(&self) -> u32 {
        match self {
            Self::Roster => 1,
            Self::CharacterDetail => 20,
            Self::Gallery => 2,
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Roster => write!(f, "roster"),
            Self::CharacterDetail => write!(f, "character"),
            Self::Gallery => write!(f, "gallery"),
        }
    }
}

/// Applies the fixed per-class delay and counts requests per class
#[derive(Debug, Clone)]
pub struct Pacer {
    unit: Duration,
    requests: HashMap<RequestClass, u32>,
}

impl Pacer {
    /// Creates a pacer with the given duration for one politeness unit
    pub fn new(unit: Duration) -> Self {
        Self {
            unit,
            requests: HashMap::new(),
        }
    }

    pub fn from_config(config: &PolitenessConfig) -> Self {
        Self::new(Duration::from_millis(config.unit_ms))
    }

    /// The delay applied before a request of the given class
    pub fn delay_for(&self, class: RequestClass) -> Duration {
        self.unit * class.units()
    }

    /// Waits out the delay for `class` and records the request
    pub async fn wait(&mut self, class: RequestClass) {
        let delay = self.delay_for(class);
        tracing::trace!("Pacing {} request for {:?}", class, delay);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        *self.requests.entry(class).or_insert(0) += 1;
    }

    /// Number of requests of this class paced so far
    pub fn request_count(&self, class: RequestClass) -> u32 {
        self.requests.get(&class).copied().unwrap_or(0)
    }

    /// Total number of requests paced so far
    pub fn total_requests(&self) -> u32 {
        self.requests.values().sum()
    }
}
