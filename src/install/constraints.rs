//! Constraints files
//!
//! One install target per line, `#` comments, blank lines skipped:
//!
//! ```text
//! # pin from the index
//! simple==2.0
//! # redirect to a direct source
//! testpkg @ git+file:///tmp/testpkg@v1.0
//! ```
//!
//! Constraints never add targets. They only change how a named index
//! requirement is satisfied.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, config};
use crate::source::{InstallTarget, SourceDescriptor, name};

#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Keyed by canonical project name
    by_name: HashMap<String, SourceDescriptor>,
}

impl Constraints {
    /// Read and merge constraints files; later files override earlier ones
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut constraints = Self::default();
        for path in paths {
            let content = fs::read_to_string(path)
                .map_err(|e| config::read_failed(path.display().to_string(), e.to_string()))?;
            constraints.extend(Self::parse(&content, path)?);
        }
        Ok(constraints)
    }

    /// Parse the content of one constraints file
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let mut by_name = HashMap::new();
        for (index, line) in content.lines().enumerate() {
            let line = strip_comment(line);
            if line.is_empty() {
                continue;
            }
            let line_error = |reason: String| {
                config::parse_failed(
                    origin.display().to_string(),
                    format!("line {}: {reason}", index + 1),
                )
            };

            let target = InstallTarget::parse(line).map_err(|e| line_error(e.to_string()))?;
            if matches!(target.descriptor, SourceDescriptor::LocalEditable(_)) {
                return Err(line_error("editable targets cannot be constraints".to_string()));
            }
            let Some(project) = target.descriptor.name() else {
                return Err(line_error(format!(
                    "'{line}' does not name a project; use '<name> @ <url>' or #egg=<name>"
                )));
            };
            by_name.insert(name::canonicalize(project), target.descriptor);
        }
        Ok(Self { by_name })
    }

    pub fn extend(&mut self, other: Constraints) {
        self.by_name.extend(other.by_name);
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// The descriptor to install for `descriptor` under these constraints
    ///
    /// Only index requirements are affected. A direct constraint replaces
    /// the requirement outright; a version constraint replaces its version
    /// specifier.
    pub fn apply(&self, descriptor: &SourceDescriptor) -> SourceDescriptor {
        let SourceDescriptor::IndexRequirement(requirement) = descriptor else {
            return descriptor.clone();
        };
        let Some(constraint) = self.by_name.get(&name::canonicalize(&requirement.name)) else {
            return descriptor.clone();
        };

        match constraint {
            SourceDescriptor::IndexRequirement(pin) if pin.version_spec.is_some() => {
                debug!(name = %requirement.name, spec = ?pin.version_spec, "constraint pins version");
                let mut constrained = requirement.clone();
                constrained.version_spec = pin.version_spec.clone();
                SourceDescriptor::IndexRequirement(constrained)
            }
            SourceDescriptor::IndexRequirement(_) => descriptor.clone(),
            direct => {
                debug!(name = %requirement.name, kind = direct.kind_label(), "constraint redirects requirement");
                direct.clone()
            }
        }
    }
}

/// Drop a trailing comment; `#` only starts one at line start or after whitespace
fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return "";
    }
    let end = trimmed
        .char_indices()
        .find(|&(idx, c)| c == '#' && trimmed[..idx].ends_with(char::is_whitespace))
        .map_or(trimmed.len(), |(idx, _)| idx);
    trimmed[..end].trim_end()
}
