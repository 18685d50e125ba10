//! URL helpers for install sources
//!
//! This module handles:
//! - Converting local paths to `file://` URLs and back
//! - Normalizing URLs so that the recorded provenance matches what was supplied
//! - Splitting `#fragment` parameters (`egg=`, `subdirectory=`, `sha256=`)
//! - Recognizing archive file names

use std::path::{Path, PathBuf};

use normpath::PathExt;
use url::Url;

use crate::error::{Result, source};

/// Archive suffixes the fetcher knows how to unpack, longest first
pub const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz", ".tar", ".zip", ".whl"];

/// Make a path absolute without requiring it to exist
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if let Ok(normalized) = path.normalize() {
        return Ok(normalized.into_path_buf());
    }
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    // Lexical cleanup only; interior `.` components are dropped
    Ok(joined.components().collect())
}

/// Convert a local path into a `file://` URL
pub fn path_to_url(path: &Path) -> Result<String> {
    let absolute = absolutize(path)?;
    let absolute = dunce::simplified(&absolute);
    Url::from_file_path(absolute)
        .map(String::from)
        .map_err(|()| {
            source::invalid_syntax(
                absolute.display().to_string(),
                "path cannot be expressed as a file:// URL",
            )
        })
}

/// Convert a `file://` URL back into a local path
pub fn url_to_path(url: &str) -> Result<PathBuf> {
    let (base, _) = split_fragment(url);
    let parsed = Url::parse(base).map_err(|e| source::invalid_syntax(url, e.to_string()))?;
    if parsed.scheme() != "file" {
        return Err(source::invalid_syntax(url, "not a file:// URL"));
    }
    parsed
        .to_file_path()
        .map_err(|()| source::invalid_syntax(url, "file:// URL does not name a local path"))
}

/// Normalize a URL the way it is stored in provenance records
///
/// The fragment is dropped. `file://` URLs keep their scheme and path as
/// given, so `file:///tmp/pkg` stays `file:///tmp/pkg`.
pub fn normalize_url(url: &str) -> Result<String> {
    let (base, _) = split_fragment(url.trim());
    let parsed = Url::parse(base).map_err(|e| source::invalid_syntax(url, e.to_string()))?;
    Ok(parsed.to_string())
}

/// Scheme of a URL, if it has one of the `scheme://` form
pub fn scheme(url: &str) -> Option<&str> {
    let idx = url.find("://")?;
    let candidate = &url[..idx];
    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(candidate)
}

/// Split `url#fragment` into its parts
pub fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    }
}

/// Look up a `key=value` parameter in a URL fragment (`egg=x&subdirectory=y`)
pub fn fragment_param<'a>(fragment: Option<&'a str>, key: &str) -> Option<&'a str> {
    fragment?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Last path segment of a URL or path, without query or fragment
pub fn file_name(url: &str) -> Option<&str> {
    let (base, _) = split_fragment(url);
    let base = base.split('?').next().unwrap_or(base);
    base.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Archive suffix of a file name, if it has a known one
pub fn archive_suffix(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .copied()
}

/// Split an archive file name into `(project, version)`
///
/// `simple-2.0.tar.gz` gives `("simple", Some("2.0"))`, a wheel name like
/// `simple-2.0-py3-none-any.whl` gives its first two components.
pub fn split_archive_name(name: &str) -> Option<(String, Option<String>)> {
    let suffix = archive_suffix(name)?;
    let stem = &name[..name.len() - suffix.len()];

    if suffix == ".whl" {
        let mut parts = stem.split('-');
        let project = parts.next()?.to_string();
        return Some((project, parts.next().map(str::to_string)));
    }

    // The version starts at the last '-' that is followed by a digit
    let split_at = stem
        .match_indices('-')
        .map(|(idx, _)| idx)
        .filter(|idx| {
            stem[idx + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
        .last();

    match split_at {
        Some(idx) if idx > 0 => Some((stem[..idx].to_string(), Some(stem[idx + 1..].to_string()))),
        _ => Some((stem.to_string(), None)),
    }
}
