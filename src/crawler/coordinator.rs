//! Harvest coordinator - show roster orchestration
//!
//! This module contains the top-level ingest flow for one show:
//! - Resolving the operator URL into kind and external id
//! - Fetching the roster page and reading the show titles
//! - Ensuring the show row exists
//! - Handing every roster entry to the character ingestor
//! - Recording the finished run

use crate::config::{CharacterErrorPolicy, Config};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pacer::RequestClass;
use crate::crawler::parser::{AttrPredicate, Document};
use crate::state::{CharacterOutcome, IngestReport};
use crate::storage::{CatalogStore, RunRecord, RunStatus, SqliteStorage};
use crate::url::{CatalogSite, ShowKind};
use crate::{ErrorKind, HarvestError};
use chrono::Utc;
use std::path::Path;

/// Class of the localized title element
const ENGLISH_TITLE_CLASS: &str = "title-english";

/// Titles and roster links read from a show's character page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterPage {
    pub jp_title: String,
    pub en_title: Option<String>,
    /// Number of roster tables on the page
    pub tables_found: usize,
    /// First link of every roster table, in page order
    pub character_hrefs: Vec<String>,
}

/// Selector for the native title element of each show kind
fn native_title_selector(kind: ShowKind) -> (&'static str, AttrPredicate<'static>) {
    match kind {
        ShowKind::Anime => ("h1", AttrPredicate::HasClass("title-name")),
        ShowKind::Manga => ("span", AttrPredicate::Equals("itemprop", "name")),
    }
}

/// Marker class of the roster tables for each show kind
fn roster_table_class(kind: ShowKind) -> &'static str {
    match kind {
        ShowKind::Anime => "js-anime-character-table",
        ShowKind::Manga => "js-manga-character-table",
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Reads titles and character links from a roster page
///
/// # Title Rules
///
/// - The native title is required; without it the page is rejected.
/// - The localized title is normally a separate `p.title-english` element.
/// - On manga pages the localized title may sit inside the native title
///   element; when it does, it wins, and the native title becomes the text
///   that precedes it.
///
/// Each roster table contributes only its first link.
pub fn parse_roster_page(doc: &Document, kind: ShowKind, url: &str) -> Result<RosterPage, HarvestError> {
    let (tag, predicate) = native_title_selector(kind);
    let native = doc
        .find_first(tag, predicate)
        .ok_or_else(|| HarvestError::MissingRequiredField {
            field: "native title",
            url: url.to_string(),
        })?;

    let mut jp_title = native.text();
    let mut en_title = doc
        .find_first("p", AttrPredicate::HasClass(ENGLISH_TITLE_CLASS))
        .and_then(|node| non_empty(&node.text()));

    if kind == ShowKind::Manga {
        if let Some(nested) = native.find_first("span", AttrPredicate::HasClass(ENGLISH_TITLE_CLASS)) {
            jp_title = native.leading_text();
            en_title = non_empty(&nested.text());
        }
    }

    let jp_title = non_empty(&jp_title).ok_or_else(|| HarvestError::MissingRequiredField {
        field: "native title",
        url: url.to_string(),
    })?;

    let tables = doc.find_all("table", AttrPredicate::HasClass(roster_table_class(kind)));
    let mut character_hrefs = Vec::with_capacity(tables.len());

    for table in &tables {
        match table
            .find_first("a", AttrPredicate::Present("href"))
            .and_then(|anchor| anchor.attr("href"))
        {
            Some(href) => character_hrefs.push(href.trim().to_string()),
            None => tracing::warn!("Roster table without a character link on {}", url),
        }
    }

    Ok(RosterPage {
        jp_title,
        en_title,
        tables_found: tables.len(),
        character_hrefs,
    })
}

/// Main harvester structure
///
/// Owns the site description, the paced fetcher, and the store. All work runs
/// sequentially through `&mut self`.
pub struct Harvester<S: CatalogStore> {
    pub(crate) site: CatalogSite,
    pub(crate) fetcher: PageFetcher,
    pub(crate) store: S,
    policy: CharacterErrorPolicy,
    config_hash: String,
}

impl<S: CatalogStore> Harvester<S> {
    /// Creates a harvester that aborts on the first failing character
    pub fn new(site: CatalogSite, fetcher: PageFetcher, store: S) -> Self {
        Self {
            site,
            fetcher,
            store,
            policy: CharacterErrorPolicy::Abort,
            config_hash: String::new(),
        }
    }

    pub fn with_error_policy(mut self, policy: CharacterErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    /// Ingests a show's character roster
    ///
    /// Nothing is written unless the URL resolves, the roster page loads, and
    /// its native title is present. After that the show row is ensured and each
    /// roster entry goes through [`Harvester::ingest_character`]. Every decision
    /// is based on what is already stored, so repeating a run that was cut short
    /// finishes the remaining entries without redoing the others.
    ///
    /// # Arguments
    ///
    /// * `show_url` - Operator-supplied catalog URL of the show
    /// * `overwrite` - Refetch and replace characters that are already stored
    pub async fn ingest_show(
        &mut self,
        show_url: &str,
        overwrite: bool,
    ) -> Result<IngestReport, HarvestError> {
        let started_at = Utc::now().to_rfc3339();

        let show = self.site.resolve_show(show_url)?;
        tracing::info!("Resolved {} {} ({})", show.kind, show.mal_id, show.path_segment);

        let roster_url = self.site.roster_url(&show);
        let roster = {
            let doc = self.fetcher.fetch(&roster_url, RequestClass::Roster).await?;
            parse_roster_page(&doc, show.kind, &roster_url)?
        };

        let show_inserted = if self.store.show_exists(show.mal_id, show.kind)? {
            false
        } else {
            self.store.insert_show(
                show.mal_id,
                &roster.jp_title,
                roster.en_title.as_deref(),
                show.kind,
            )?;
            tracing::info!("Inserted {} {}: {}", show.kind, show.mal_id, roster.jp_title);
            true
        };

        let show_id = self.store.get_show_id(show.mal_id, show.kind)?;

        let mut report = IngestReport::new(show.kind, show.mal_id, show_id, show_inserted);
        report.characters_found = roster.tables_found;
        tracing::info!("Found {} characters.", roster.tables_found);

        for href in &roster.character_hrefs {
            let outcome = match self.ingest_character(href, show_id, overwrite).await {
                Ok(outcome) => outcome,
                Err(e) if self.policy == CharacterErrorPolicy::Skip && e.kind() != ErrorKind::Storage => {
                    tracing::warn!("Skipping character {}: {}", href, e);
                    CharacterOutcome::Failed(e.to_string())
                }
                Err(e) => {
                    tracing::error!("Aborting {} at character {}: {}", show_url, href, e);
                    let run = self.run_record(show_url, overwrite, &started_at, &report, Some(&e));
                    if let Err(store_err) = self.store.record_run(&run) {
                        tracing::warn!("Failed to record aborted run: {}", store_err);
                    }
                    return Err(e);
                }
            };
            report.record(href, &outcome);
        }

        let run = self.run_record(show_url, overwrite, &started_at, &report, None);
        if let Err(store_err) = self.store.record_run(&run) {
            tracing::warn!("Failed to record completed run: {}", store_err);
        }

        tracing::info!(
            "Finished {} {}: {} inserted, {} linked, {} already present, {} failed",
            show.kind,
            show.mal_id,
            report.inserted,
            report.linked,
            report.skipped,
            report.failed.len()
        );

        Ok(report)
    }

    fn run_record(
        &self,
        show_url: &str,
        overwrite: bool,
        started_at: &str,
        report: &IngestReport,
        error: Option<&HarvestError>,
    ) -> RunRecord {
        RunRecord {
            id: 0,
            show_url: show_url.to_string(),
            overwrite,
            config_hash: self.config_hash.clone(),
            started_at: started_at.to_string(),
            finished_at: Utc::now().to_rfc3339(),
            status: if error.is_some() {
                RunStatus::Aborted
            } else {
                RunStatus::Completed
            },
            inserted: report.inserted as u32,
            linked: report.linked as u32,
            skipped: report.skipped as u32,
            failed: report.failed.len() as u32,
            error_message: error.map(|e| e.to_string()),
        }
    }
}

impl Harvester<SqliteStorage> {
    /// Builds a harvester backed by the configured SQLite database
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let site = CatalogSite::new(&config.site.base_url)?;
        let fetcher = PageFetcher::from_config(config)?;
        let store = SqliteStorage::new(Path::new(&config.output.database_path))?;

        Ok(Self::new(site, fetcher, store).with_error_policy(config.ingest.on_character_error))
    }
}

/// Runs one show ingest with the given configuration
///
/// # Example
///
/// ```no_run
/// use roster_harvest::config::load_config_with_hash;
/// use roster_harvest::crawler::harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let report = harvest(&config, &hash, "https://myanimelist.net/anime/5114", false).await?;
/// println!("{} new characters", report.inserted);
/// # Ok(())
/// # }
/// ```
pub async fn harvest(
    config: &Config,
    config_hash: &str,
    show_url: &str,
    overwrite: bool,
) -> Result<IngestReport, HarvestError> {
    let mut harvester = Harvester::from_config(config)?.with_config_hash(config_hash);
    harvester.ingest_show(show_url, overwrite).await
}
