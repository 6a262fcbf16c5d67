//! URL handling module for Roster-Harvest
//!
//! This module resolves operator-supplied show URLs into a show kind and
//! external id, extracts character ids from roster links, and builds the page
//! URLs the crawler fetches.

mod character;
mod show;

use crate::UrlResult;
use url::Url;

pub use character::character_id_from_href;
pub use show::{extract_show_id, resolve_show_url, split_show_url, ShowKind, ShowUrl};

/// The catalog site every harvested URL belongs to
///
/// Holds the parsed base URL and the domain marker (`host[:port]/`) that
/// show and character URLs are matched against.
#[derive(Debug, Clone)]
pub struct CatalogSite {
    base: Url,
    marker: String,
}

impl CatalogSite {
    /// Creates a site from its root URL (e.g., "https://myanimelist.net")
    pub fn new(base_url: &str) -> Result<Self, ::url::ParseError> {
        let mut base = Url::parse(base_url)?;
        let host = base.host_str().ok_or(::url::ParseError::EmptyHost)?;
        let marker = match base.port() {
            Some(port) => format!("{}:{}/", host, port),
            None => format!("{}/", host),
        };

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { base, marker })
    }

    /// The domain marker that precedes entity paths in catalog URLs
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Resolves a show URL into kind, external id and path segment
    pub fn resolve_show(&self, show_url: &str) -> UrlResult<ShowUrl> {
        resolve_show_url(show_url, &self.marker)
    }

    /// URL of the character roster page for a show
    pub fn roster_url(&self, show: &ShowUrl) -> String {
        format!(
            "{}{}{}/characters",
            self.base,
            show.kind.path_prefix(),
            show.path_segment
        )
    }

    /// Extracts the external character id from a roster link
    pub fn character_id(&self, href: &str) -> UrlResult<String> {
        character_id_from_href(&self.absolutize(href), &self.marker)
    }

    /// URL of a character's detail page
    pub fn character_url(&self, character_id: &str) -> String {
        format!("{}character/{}", self.base, character_id)
    }

    /// Resolves a possibly-relative href against the site root
    pub fn absolutize(&self, href: &str) -> String {
        match self.base.join(href.trim()) {
            Ok(url) => url.to_string(),
            Err(_) => href.to_string(),
        }
    }
}
