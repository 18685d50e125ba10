//! Typed install sources
//!
//! A [`SourceDescriptor`] is produced once per install target by the parser
//! and never changes afterwards. Only `DirectArchive` and `VcsReference`
//! sources carry direct URL provenance; `LocalEditable` is kept as its own
//! variant so the editable exemption is visible wherever sources are matched.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, source};

/// Version control systems a reference can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Git,
    Hg,
    Svn,
    Bzr,
}

impl VcsKind {
    pub const ALL: [VcsKind; 4] = [VcsKind::Git, VcsKind::Hg, VcsKind::Svn, VcsKind::Bzr];

    /// Name used in `vcs+url` prefixes and in provenance records
    pub fn as_str(self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Hg => "hg",
            VcsKind::Svn => "svn",
            VcsKind::Bzr => "bzr",
        }
    }

    /// Detect the VCS kind from a `vcs+scheme://` prefix
    pub fn from_url_prefix(input: &str) -> Option<(VcsKind, &str)> {
        VcsKind::ALL.into_iter().find_map(|kind| {
            input
                .strip_prefix(kind.as_str())
                .and_then(|rest| rest.strip_prefix('+'))
                .map(|rest| (kind, rest))
        })
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VcsKind {
    type Err = crate::error::SourcemarkError;

    fn from_str(s: &str) -> Result<Self> {
        VcsKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| source::invalid_syntax(s, "unknown version control system"))
    }
}

/// A named requirement satisfied through an index (here: find-links directories)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRequirement {
    pub name: String,
    /// Version specifier as written, e.g. `==2.0` or `>=1,<3`
    pub version_spec: Option<String>,
}

impl IndexRequirement {
    /// The exact version if the specifier is a single `==` pin
    pub fn pinned_version(&self) -> Option<&str> {
        let spec = self.version_spec.as_deref()?.trim();
        let version = spec.strip_prefix("==")?.trim();
        (!version.is_empty() && !version.contains(',') && !version.contains('*'))
            .then_some(version)
    }
}

/// An archive (or non-editable local directory) referenced by URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectArchive {
    /// Name given with `name @ url`, or inferred from the archive file name
    pub name: Option<String>,
    /// Normalized URL, without fragment
    pub url: String,
    /// `sha256=<hex>` taken from the URL fragment
    pub expected_hash: Option<String>,
    pub subdirectory: Option<String>,
}

/// A VCS-qualified source, unresolved until checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsReference {
    pub vcs: VcsKind,
    /// Repository URL without the `vcs+` prefix, revision or fragment
    pub url: String,
    /// Branch, tag or commit requested by the user
    pub revision_spec: Option<String>,
    pub subdirectory: Option<String>,
    /// Project name from `#egg=` or `name @`
    pub name: Option<String>,
}

impl VcsReference {
    pub fn new(vcs: VcsKind, url: impl Into<String>) -> Self {
        Self {
            vcs,
            url: url.into(),
            revision_spec: None,
            subdirectory: None,
            name: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision_spec = Some(revision.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_subdirectory(mut self, subdirectory: impl Into<String>) -> Self {
        self.subdirectory = Some(subdirectory.into());
        self
    }

    /// Serialize back to `vcs+url[@rev][#egg=name][&subdirectory=path]`
    pub fn to_target_string(&self) -> String {
        let mut out = format!("{}+{}", self.vcs, self.url);
        if let Some(rev) = &self.revision_spec {
            out.push('@');
            out.push_str(rev);
        }

        let mut params = Vec::new();
        if let Some(name) = &self.name {
            params.push(format!("egg={name}"));
        }
        if let Some(subdirectory) = &self.subdirectory {
            params.push(format!("subdirectory={subdirectory}"));
        }
        if !params.is_empty() {
            out.push('#');
            out.push_str(&params.join("&"));
        }
        out
    }
}

/// What an editable install points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditableSource {
    /// A local source tree, linked in place
    Path { path: PathBuf },
    /// A VCS checkout made into the source directory, then linked in place
    Vcs(VcsReference),
}

/// A parsed install source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    IndexRequirement(IndexRequirement),
    DirectArchive(DirectArchive),
    VcsReference(VcsReference),
    LocalEditable(EditableSource),
}

impl SourceDescriptor {
    /// Project name, when the source names one
    pub fn name(&self) -> Option<&str> {
        match self {
            SourceDescriptor::IndexRequirement(req) => Some(&req.name),
            SourceDescriptor::DirectArchive(archive) => archive.name.as_deref(),
            SourceDescriptor::VcsReference(reference)
            | SourceDescriptor::LocalEditable(EditableSource::Vcs(reference)) => {
                reference.name.as_deref()
            }
            SourceDescriptor::LocalEditable(EditableSource::Path { .. }) => None,
        }
    }

    /// Whether installing this source leaves a direct URL record behind
    pub fn records_provenance(&self) -> bool {
        matches!(
            self,
            SourceDescriptor::DirectArchive(_) | SourceDescriptor::VcsReference(_)
        )
    }

    /// Whether this source is a direct reference (URL, VCS or path) rather than a name
    pub fn is_direct(&self) -> bool {
        !matches!(self, SourceDescriptor::IndexRequirement(_))
    }

    /// Short label for log lines
    pub fn kind_label(&self) -> &'static str {
        match self {
            SourceDescriptor::IndexRequirement(_) => "index",
            SourceDescriptor::DirectArchive(_) => "archive",
            SourceDescriptor::VcsReference(_) => "vcs",
            SourceDescriptor::LocalEditable(_) => "editable",
        }
    }
}

/// One install target: the string the user wrote and what it parsed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub raw: String,
    pub descriptor: SourceDescriptor,
}

impl InstallTarget {
    /// Parse a target; a leading `-e`/`--editable` marks it editable
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (editable, rest) = if let Some(rest) = trimmed.strip_prefix("--editable") {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix("-e") {
            (true, rest)
        } else {
            (false, trimmed)
        };

        if editable && !rest.starts_with([' ', '\t', '=']) {
            return super::parser::parse_target(trimmed, false);
        }

        let rest = rest.trim_start_matches('=').trim();
        super::parser::parse_target(rest, editable).map(|target| InstallTarget {
            raw: trimmed.to_string(),
            ..target
        })
    }

    pub fn parse_editable(input: &str) -> Result<Self> {
        super::parser::parse_target(input, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vcs_kind_from_prefix() {
        assert_eq!(
            VcsKind::from_url_prefix("git+https://host/repo"),
            Some((VcsKind::Git, "https://host/repo"))
        );
        assert_eq!(
            VcsKind::from_url_prefix("hg+ssh://host/repo"),
            Some((VcsKind::Hg, "ssh://host/repo"))
        );
        assert_eq!(VcsKind::from_url_prefix("github:author/repo"), None);
        assert_eq!(VcsKind::from_url_prefix("https://host"), None);
    }

    #[test]
    fn test_vcs_kind_from_str() {
        assert_eq!("svn".parse::<VcsKind>().unwrap(), VcsKind::Svn);
        assert!("cvs".parse::<VcsKind>().is_err());
    }

    #[test]
    fn test_pinned_version() {
        let req = IndexRequirement {
            name: "simple".to_string(),
            version_spec: Some("==2.0".to_string()),
        };
        assert_eq!(req.pinned_version(), Some("2.0"));

        let ranged = IndexRequirement {
            name: "simple".to_string(),
            version_spec: Some(">=1.0".to_string()),
        };
        assert_eq!(ranged.pinned_version(), None);
    }

    #[test]
    fn test_to_target_string() {
        let reference = VcsReference::new(VcsKind::Git, "file:///tmp/pkg")
            .with_revision("v1.0")
            .with_name("testpkg")
            .with_subdirectory("sub");
        assert_eq!(
            reference.to_target_string(),
            "git+file:///tmp/pkg@v1.0#egg=testpkg&subdirectory=sub"
        );
    }

    #[test]
    fn test_records_provenance() {
        let vcs = SourceDescriptor::VcsReference(VcsReference::new(VcsKind::Git, "file:///x"));
        let editable = SourceDescriptor::LocalEditable(EditableSource::Vcs(VcsReference::new(
            VcsKind::Git,
            "file:///x",
        )));
        let index = SourceDescriptor::IndexRequirement(IndexRequirement {
            name: "simple".to_string(),
            version_spec: None,
        });

        assert!(vcs.records_provenance());
        assert!(!editable.records_provenance());
        assert!(!index.records_provenance());
        assert!(editable.is_direct());
        assert!(!index.is_direct());
    }

    #[test]
    fn test_install_target_editable_prefix() {
        let target = InstallTarget::parse("-e git+file:///tmp/pkg#egg=testpkg").unwrap();
        assert_eq!(target.raw, "-e git+file:///tmp/pkg#egg=testpkg");
        assert!(matches!(
            target.descriptor,
            SourceDescriptor::LocalEditable(EditableSource::Vcs(_))
        ));
    }

    #[test]
    fn test_install_target_name_starting_with_e() {
        let target = InstallTarget::parse("enum34").unwrap();
        assert!(matches!(
            target.descriptor,
            SourceDescriptor::IndexRequirement(ref req) if req.name == "enum34"
        ));
    }
}
