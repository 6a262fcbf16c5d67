//! Character ingestion
//!
//! For each roster entry the harvester decides between three paths:
//! - the character and its link to the show already exist: nothing to do
//! - the character exists but is not linked to this show: add the link only
//! - the character is new (or overwrite was requested): fetch, parse, store, link
//!
//! The link-only path never touches the network.

use crate::crawler::coordinator::Harvester;
use crate::crawler::gallery::resolve_gallery;
use crate::crawler::pacer::RequestClass;
use crate::crawler::parser::{AttrPredicate, Document};
use crate::state::CharacterOutcome;
use crate::storage::{CatalogStore, CharacterRecord};
use crate::HarvestError;

/// Suffix of the link from a character page to its picture gallery
pub const GALLERY_SUFFIX: &str = "/pics";

/// Fields read from a character detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterPage {
    pub en_name: String,
    pub jp_name: Option<String>,
    pub gallery_href: Option<String>,
}

/// Splits a "Name (Native Name)" header into localized and native names
///
/// Without the " (" separator the whole text is the localized name.
pub fn split_full_name(full_name: &str) -> (String, Option<String>) {
    match full_name.split_once(" (") {
        Some((en_name, rest)) => {
            let jp_name = match rest.rsplit_once(')') {
                Some((inner, _)) => inner,
                None => rest,
            };
            let jp_name = jp_name.trim();
            (
                en_name.trim().to_string(),
                (!jp_name.is_empty()).then(|| jp_name.to_string()),
            )
        }
        None => (full_name.trim().to_string(), None),
    }
}

/// Reads the name header and gallery link from a character detail page
///
/// If several anchors point at a gallery, the last one in the page wins.
pub fn parse_character_page(doc: &Document, url: &str) -> Result<CharacterPage, HarvestError> {
    let header = doc
        .find_first("h2", AttrPredicate::HasClass("normal_header"))
        .ok_or_else(|| HarvestError::ElementNotFound {
            element: "h2.normal_header",
            url: url.to_string(),
        })?;

    let (en_name, jp_name) = split_full_name(&header.text());
    if en_name.is_empty() {
        return Err(HarvestError::MissingRequiredField {
            field: "character name",
            url: url.to_string(),
        });
    }

    let gallery_href = doc
        .find_all("a", AttrPredicate::Present("href"))
        .iter()
        .filter_map(|anchor| anchor.attr("href"))
        .filter(|href| href.ends_with(GALLERY_SUFFIX))
        .last()
        .map(|href| href.trim().to_string());

    Ok(CharacterPage {
        en_name,
        jp_name,
        gallery_href,
    })
}

impl<S: CatalogStore> Harvester<S> {
    /// Ingests one roster entry for the show with internal id `show_id`
    ///
    /// # Arguments
    ///
    /// * `href` - The character link taken from the roster
    /// * `show_id` - Store-assigned id of the owning show
    /// * `overwrite` - Refetch and replace the character even if it is stored
    pub async fn ingest_character(
        &mut self,
        href: &str,
        show_id: i64,
        overwrite: bool,
    ) -> Result<CharacterOutcome, HarvestError> {
        let char_id = self.site.character_id(href)?;

        if !overwrite && self.store.character_exists(&char_id)? {
            if self.store.character_has_show(&char_id, show_id)? {
                tracing::debug!("Character {} already exists.", char_id);
                return Ok(CharacterOutcome::AlreadyLinked);
            }

            self.store.add_show_to_character(&char_id, show_id)?;
            tracing::info!("Linked existing character {} to show {}", char_id, show_id);
            return Ok(CharacterOutcome::Linked);
        }

        let character = self.download_character(&char_id).await?;
        self.store.insert_character(&character)?;

        if !self.store.character_has_show(&char_id, show_id)? {
            self.store.add_show_to_character(&char_id, show_id)?;
        }

        tracing::info!(
            "Inserted character {} ({}) with {} images",
            char_id,
            character.en_name,
            character.image_urls.len()
        );
        Ok(CharacterOutcome::Inserted)
    }

    /// Fetches a character's detail page and gallery into a record
    pub async fn download_character(&mut self, char_id: &str) -> Result<CharacterRecord, HarvestError> {
        let url = self.site.character_url(char_id);
        tracing::info!("Downloading character {}", char_id);

        let page = {
            let doc = self.fetcher.fetch(&url, RequestClass::CharacterDetail).await?;
            parse_character_page(&doc, &url)?
        };

        let image_urls = match &page.gallery_href {
            Some(href) => {
                let gallery_url = self.site.absolutize(href);
                resolve_gallery(&mut self.fetcher, &gallery_url).await?
            }
            None => {
                tracing::debug!("No gallery link for character {}", char_id);
                Vec::new()
            }
        };

        Ok(CharacterRecord {
            id: char_id.to_string(),
            en_name: page.en_name,
            jp_name: page.jp_name,
            image_urls,
        })
    }
}
