//! Character picture gallery resolution

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pacer::RequestClass;
use crate::crawler::parser::{AttrPredicate, Document};
use crate::HarvestError;
use std::collections::HashSet;

/// Class carried by every picture anchor on a gallery page
pub const GALLERY_ITEM_CLASS: &str = "js-picture-gallery";

/// Path fragment that marks a character portrait (as opposed to other media)
pub const CHARACTER_IMAGE_MARKER: &str = "/images/characters/";

/// Fetches a gallery page and returns its character image URLs
///
/// The result keeps the first occurrence of each URL, in document order.
pub async fn resolve_gallery(
    fetcher: &mut PageFetcher,
    gallery_url: &str,
) -> Result<Vec<String>, HarvestError> {
    let doc = fetcher.fetch(gallery_url, RequestClass::Gallery).await?;
    let images = extract_gallery_images(&doc);
    tracing::debug!("Found {} images on {}", images.len(), gallery_url);
    Ok(images)
}

/// Collects distinct character image URLs from a parsed gallery page
pub fn extract_gallery_images(doc: &Document) -> Vec<String> {
    let mut seen = HashSet::new();

    doc.find_all("a", AttrPredicate::HasClass(GALLERY_ITEM_CLASS))
        .into_iter()
        .filter_map(|anchor| anchor.attr("href"))
        .map(str::trim)
        .filter(|href| href.contains(CHARACTER_IMAGE_MARKER))
        .filter(|href| seen.insert(*href))
        .map(str::to_string)
        .collect()
}
