//! Show URL resolution
//!
//! A show URL looks like `https://<site>/anime/5114/Some_Title/characters?x=1`.
//! Resolution happens in two independent steps: the kind prefix after the
//! domain marker, then the numeric id at the start of the remaining segment.

use crate::{UrlParseError, UrlResult};
use std::fmt;

/// The two kinds of catalog entry a roster can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowKind {
    Anime,
    Manga,
}

impl ShowKind {
    /// Path prefix that identifies this kind on the catalog site
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Self::Anime => "anime/",
            Self::Manga => "manga/",
        }
    }

    pub fn is_manga(&self) -> bool {
        matches!(self, Self::Manga)
    }

    pub fn from_is_manga(is_manga: bool) -> Self {
        if is_manga {
            Self::Manga
        } else {
            Self::Anime
        }
    }
}

impl fmt::Display for ShowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anime => write!(f, "anime"),
            Self::Manga => write!(f, "manga"),
        }
    }
}

/// A resolved show URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowUrl {
    pub kind: ShowKind,
    /// External catalog id of the show
    pub mal_id: i64,
    /// Path after the kind prefix: the id plus any human-readable slug
    pub path_segment: String,
}

/// Splits a show URL into its path segment and kind
///
/// The query string is dropped, and a trailing `/characters` is removed so the
/// roster URL can be rebuilt from the segment.
pub fn split_show_url(show_url: &str, marker: &str) -> UrlResult<(String, ShowKind)> {
    let (_, no_domain) =
        show_url
            .split_once(marker)
            .ok_or_else(|| UrlParseError::MissingDomainMarker {
                marker: marker.to_string(),
                url: show_url.to_string(),
            })?;

    let no_query = match no_domain.split_once('?') {
        Some((path, _)) => path,
        None => no_domain,
    };
    let no_fragment = match no_query.split_once('#') {
        Some((path, _)) => path,
        None => no_query,
    };

    let (kind, rest) = if let Some(rest) = no_fragment.strip_prefix(ShowKind::Anime.path_prefix()) {
        (ShowKind::Anime, rest)
    } else if let Some(rest) = no_fragment.strip_prefix(ShowKind::Manga.path_prefix()) {
        (ShowKind::Manga, rest)
    } else {
        return Err(UrlParseError::UnknownKind(no_fragment.to_string()));
    };

    let rest = rest.trim_end_matches('/');
    let segment = rest.strip_suffix("/characters").unwrap_or(rest);

    Ok((segment.to_string(), kind))
}

/// Extracts the external show id: the leading path component, which must be numeric
pub fn extract_show_id(path_segment: &str) -> UrlResult<i64> {
    let leading = path_segment.split('/').next().unwrap_or_default();

    if leading.is_empty() || !leading.chars().all(|c| c.is_ascii_digit()) {
        return Err(UrlParseError::NonNumericId(leading.to_string()));
    }

    leading
        .parse()
        .map_err(|_| UrlParseError::NonNumericId(leading.to_string()))
}

/// Resolves a show URL into kind, external id and path segment
///
/// # Examples
///
/// ```
/// use roster_harvest::url::{resolve_show_url, ShowKind};
///
/// let show = resolve_show_url("https://site/anime/5114/Name/characters?x=1", "site/").unwrap();
/// assert_eq!(show.kind, ShowKind::Anime);
/// assert_eq!(show.mal_id, 5114);
/// assert_eq!(show.path_segment, "5114/Name");
/// ```
pub fn resolve_show_url(show_url: &str, marker: &str) -> UrlResult<ShowUrl> {
    let (path_segment, kind) = split_show_url(show_url, marker)?;
    let mal_id = extract_show_id(&path_segment)?;

    Ok(ShowUrl {
        kind,
        mal_id,
        path_segment,
    })
}
