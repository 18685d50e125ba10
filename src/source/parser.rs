//! Install target parsing
//!
//! Supported formats:
//! - `name`, `name==1.0`, `name>=1,<2` - index requirement
//! - `name @ https://host/name-1.0.tar.gz` - direct archive with a name
//! - `name @ git+https://host/repo@v1.0` - VCS reference with a name
//! - `git+file:///tmp/pkg@<rev>#egg=name&subdirectory=sub` - VCS reference
//! - `https://host/name-1.0.tar.gz#sha256=<hex>` - direct archive
//! - `./path`, `/abs/path`, `dist/pkg-1.0.tar.gz` - local path
//! - any of the local/VCS forms with the editable flag - editable install

use std::path::Path;

use crate::error::{Result, source};
use crate::link;

use super::descriptor::{
    DirectArchive, EditableSource, IndexRequirement, InstallTarget, SourceDescriptor, VcsKind,
    VcsReference,
};
use super::name;

const SPECIFIER_START: &[char] = &['=', '<', '>', '!', '~'];

/// Parse an install target string into exactly one source descriptor
pub fn parse_target(input: &str, editable: bool) -> Result<InstallTarget> {
    let input = input.trim();
    if input.is_empty() {
        return Err(source::invalid_syntax(input, "empty install target"));
    }

    let descriptor = if editable {
        parse_editable(input)?
    } else {
        parse_descriptor(input)?
    };

    Ok(InstallTarget {
        raw: input.to_string(),
        descriptor,
    })
}

fn parse_descriptor(input: &str) -> Result<SourceDescriptor> {
    if let Some((name_part, url_part)) = split_named_url(input) {
        return parse_named_url(input, name_part, url_part);
    }

    if VcsKind::from_url_prefix(input).is_some() {
        return parse_vcs_reference(input).map(SourceDescriptor::VcsReference);
    }

    if link::scheme(input).is_some() {
        return parse_archive_url(input, None).map(SourceDescriptor::DirectArchive);
    }

    if looks_like_path(input) {
        return parse_local_path(input).map(SourceDescriptor::DirectArchive);
    }

    parse_index_requirement(input).map(SourceDescriptor::IndexRequirement)
}

fn parse_editable(input: &str) -> Result<SourceDescriptor> {
    if VcsKind::from_url_prefix(input).is_some() {
        let reference = parse_vcs_reference(input)?;
        if reference.name.is_none() {
            return Err(source::invalid_syntax(
                input,
                "editable VCS targets need an #egg=<name> fragment",
            ));
        }
        return Ok(SourceDescriptor::LocalEditable(EditableSource::Vcs(
            reference,
        )));
    }

    let path = if link::scheme(input) == Some("file") {
        link::url_to_path(input)?
    } else if looks_like_path(input) {
        link::absolutize(Path::new(input))?
    } else {
        return Err(source::invalid_syntax(
            input,
            "editable installs need a local directory or a VCS URL",
        ));
    };

    if link::archive_suffix(&path.to_string_lossy()).is_some() {
        return Err(source::invalid_syntax(
            input,
            "archives cannot be installed in editable mode",
        ));
    }

    Ok(SourceDescriptor::LocalEditable(EditableSource::Path {
        path,
    }))
}

/// Split `name @ url` when the `@` comes before any URL scheme
fn split_named_url(input: &str) -> Option<(&str, &str)> {
    let (before, after) = input.split_once('@')?;
    let looks_like_name = !before.trim().is_empty()
        && !before.contains(':')
        && !before.contains('/')
        && !before.contains('\\');
    looks_like_name.then(|| (before.trim(), after.trim()))
}

fn parse_named_url(input: &str, name_part: &str, url_part: &str) -> Result<SourceDescriptor> {
    let project = strip_extras(name_part);
    if !name::is_valid(project) {
        return Err(source::invalid_syntax(
            input,
            format!("'{project}' is not a valid project name"),
        ));
    }
    if url_part.is_empty() {
        return Err(source::invalid_syntax(input, "missing URL after '@'"));
    }

    if VcsKind::from_url_prefix(url_part).is_some() {
        let reference = parse_vcs_reference(url_part)?;
        if let Some(egg) = &reference.name {
            if !name::same(egg, project) {
                return Err(source::invalid_syntax(
                    input,
                    format!("#egg={egg} does not match the requested name '{project}'"),
                ));
            }
        }
        return Ok(SourceDescriptor::VcsReference(
            reference.with_name(project),
        ));
    }

    if link::scheme(url_part).is_none() {
        return Err(source::invalid_syntax(
            input,
            "expected a URL with a scheme after '@'",
        ));
    }

    parse_archive_url(url_part, Some(project)).map(SourceDescriptor::DirectArchive)
}

/// Parse `vcs+scheme://host/path[@rev][#egg=name&subdirectory=path]`
pub fn parse_vcs_reference(input: &str) -> Result<VcsReference> {
    let Some((vcs, rest)) = VcsKind::from_url_prefix(input.trim()) else {
        return Err(source::invalid_syntax(input, "missing vcs+ prefix"));
    };

    let (base, fragment) = link::split_fragment(rest);
    let Some(scheme) = link::scheme(base) else {
        return Err(source::invalid_syntax(
            input,
            format!("expected {vcs}+<scheme>://..."),
        ));
    };

    // The revision '@' lives in the path, after any user@host part
    let authority_start = scheme.len() + "://".len();
    let path_start = base[authority_start..]
        .find('/')
        .map_or(base.len(), |idx| authority_start + idx);

    let (url, revision) = match base[path_start..].rfind('@') {
        Some(at) => {
            let split = path_start + at;
            let revision = &base[split + 1..];
            if revision.is_empty() {
                return Err(source::invalid_syntax(input, "empty revision after '@'"));
            }
            (&base[..split], Some(revision.to_string()))
        }
        None => (base, None),
    };

    let url = link::normalize_url(url)?;
    let mut reference = VcsReference::new(vcs, url);
    reference.revision_spec = revision;

    if let Some(egg) = link::fragment_param(fragment, "egg") {
        let project = strip_extras(egg);
        if !name::is_valid(project) {
            return Err(source::invalid_syntax(
                input,
                format!("'{project}' in #egg= is not a valid project name"),
            ));
        }
        reference.name = Some(project.to_string());
    }

    if let Some(subdirectory) = link::fragment_param(fragment, "subdirectory") {
        reference.subdirectory = Some(validate_subdirectory(input, subdirectory)?);
    }

    Ok(reference)
}

fn parse_archive_url(input: &str, project: Option<&str>) -> Result<DirectArchive> {
    let (_, fragment) = link::split_fragment(input);
    let url = link::normalize_url(input)?;

    let expected_hash = match link::fragment_param(fragment, "sha256") {
        Some(hex) if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            Some(format!("sha256={}", hex.to_ascii_lowercase()))
        }
        Some(_) => {
            return Err(source::invalid_syntax(
                input,
                "sha256 fragment must be 64 hex digits",
            ));
        }
        None => None,
    };

    let subdirectory = link::fragment_param(fragment, "subdirectory")
        .map(|sub| validate_subdirectory(input, sub))
        .transpose()?;

    let name = project
        .map(str::to_string)
        .or_else(|| link::fragment_param(fragment, "egg").map(|egg| strip_extras(egg).to_string()))
        .or_else(|| {
            link::file_name(&url)
                .and_then(link::split_archive_name)
                .map(|(project, _)| project)
        });

    Ok(DirectArchive {
        name,
        url,
        expected_hash,
        subdirectory,
    })
}

fn parse_local_path(input: &str) -> Result<DirectArchive> {
    let path = link::absolutize(Path::new(input))?;
    let url = link::path_to_url(&path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(link::split_archive_name)
        .map(|(project, _)| project);

    Ok(DirectArchive {
        name,
        url,
        expected_hash: None,
        subdirectory: None,
    })
}

fn parse_index_requirement(input: &str) -> Result<IndexRequirement> {
    // Environment markers do not apply here
    let input_no_marker = input.split(';').next().unwrap_or(input).trim();

    let name_end = input_no_marker
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(input_no_marker.len());
    let project = &input_no_marker[..name_end];
    if !name::is_valid(project) {
        return Err(source::invalid_syntax(
            input,
            "not a project name, URL or path",
        ));
    }

    let mut rest = input_no_marker[name_end..].trim_start();
    if rest.starts_with('[') {
        let Some(close) = rest.find(']') else {
            return Err(source::invalid_syntax(input, "unterminated extras list"));
        };
        rest = rest[close + 1..].trim_start();
    }

    let version_spec = if rest.is_empty() {
        None
    } else if rest.starts_with(SPECIFIER_START) {
        Some(rest.split_whitespace().collect::<String>())
    } else {
        return Err(source::invalid_syntax(
            input,
            format!("unexpected '{rest}' after project name"),
        ));
    };

    Ok(IndexRequirement {
        name: project.to_string(),
        version_spec,
    })
}

fn looks_like_path(input: &str) -> bool {
    input.starts_with('.')
        || input.starts_with('/')
        || input.contains('/')
        || input.contains('\\')
        || Path::new(input).is_absolute()
        || (link::archive_suffix(input).is_some() && Path::new(input).exists())
}

fn strip_extras(name_part: &str) -> &str {
    name_part.split('[').next().unwrap_or(name_part).trim()
}

fn validate_subdirectory(input: &str, subdirectory: &str) -> Result<String> {
    let path = Path::new(subdirectory);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
    if subdirectory.is_empty() || escapes {
        return Err(source::invalid_syntax(
            input,
            format!("subdirectory '{subdirectory}' must be a relative path inside the source"),
        ));
    }
    Ok(subdirectory.trim_end_matches('/').to_string())
}
