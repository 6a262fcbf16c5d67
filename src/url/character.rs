use crate::{UrlParseError, UrlResult};

/// Extracts the external character id from a character link
///
/// The id is the path component right after `<marker>character/`.
pub fn character_id_from_href(href: &str, marker: &str) -> UrlResult<String> {
    let pattern = format!("{}character/", marker);
    let (_, rest) = href
        .split_once(&pattern)
        .ok_or_else(|| UrlParseError::MalformedCharacterHref(href.to_string()))?;

    let id = rest.split(['/', '?', '#']).next().unwrap_or_default();

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(UrlParseError::MalformedCharacterHref(href.to_string()));
    }

    Ok(id.to_string())
}
