//! Install orchestration
//!
//! The [`Installer`] takes parsed targets through their pipelines:
//!
//! ```text
//! constraints -> resolve (find-links | fetch | checkout) -> build into site_dir
//!             -> dist-info -> direct_url.json -> commit
//! ```
//!
//! Each target runs inside its own [`Transaction`](crate::transaction::Transaction)
//! and staging directory. A failing target is rolled back and reported
//! without stopping the others.
//!
//! ## Module Organization
//!
//! - `state.rs`: Per-target state machine
//! - `constraints.rs`: Constraints files
//! - `find_links.rs`: Archive lookup in find-links directories
//! - `builder.rs`: Copying a source tree into the site directory
//! - `pipeline.rs`: The per-target pipeline

pub mod builder;
pub mod constraints;
pub mod find_links;
pub mod pipeline;
pub mod state;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::InstallConfig;
use crate::error::{Result, SourcemarkError};
use crate::fetch::Fetcher;
use crate::record::{AtomicFileWriter, DirectUrl, DirectUrlWriter};
use crate::source::{InstallTarget, name};
use crate::vcs::VcsRegistry;

pub use constraints::Constraints;
pub use find_links::{FindLinks, FoundArchive};
pub use state::{InstallState, TargetState};

/// How a target ended up installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallKind {
    /// From a find-links directory
    Index,
    Archive,
    /// A non-editable local directory
    Directory,
    Vcs,
    Editable,
}

impl InstallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallKind::Index => "index",
            InstallKind::Archive => "archive",
            InstallKind::Directory => "directory",
            InstallKind::Vcs => "vcs",
            InstallKind::Editable => "editable",
        }
    }
}

/// A successfully installed target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTarget {
    pub name: String,
    pub version: String,
    pub kind: InstallKind,
    /// The dist-info directory, or the `.egg-link` file of editable installs
    pub location: PathBuf,
    pub direct_url: Option<DirectUrl>,
    /// Version of the distribution this install replaced
    pub replaced: Option<String>,
}

#[derive(Debug)]
pub struct TargetOutcome {
    pub target: String,
    pub result: Result<InstalledTarget>,
}

/// Outcome of every target of a run, in input order
#[derive(Debug, Default)]
pub struct InstallReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl InstallReport {
    pub fn installed(&self) -> impl Iterator<Item = &InstalledTarget> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourcemarkError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// `InstallFailed` if any target failed
    pub fn ensure_success(&self) -> Result<()> {
        let failed = self.failed_count();
        if failed == 0 {
            Ok(())
        } else {
            Err(SourcemarkError::InstallFailed {
                failed,
                total: self.outcomes.len(),
            })
        }
    }
}

/// Installs targets into the configured site directory
pub struct Installer {
    config: InstallConfig,
    registry: VcsRegistry,
    fetcher: Fetcher,
    writer: Arc<dyn DirectUrlWriter>,
    constraints: Constraints,
    find_links: FindLinks,
}

impl Installer {
    /// An installer with every VCS client and atomic record writes
    ///
    /// Reads the configured constraints files.
    pub fn new(config: InstallConfig) -> Result<Self> {
        let constraints = Constraints::load(&config.constraints)?;
        Ok(Self {
            fetcher: Fetcher::new(config.http_timeout, config.hash_archives)?,
            find_links: FindLinks::new(config.find_links.clone()),
            registry: VcsRegistry::with_defaults(),
            writer: Arc::new(AtomicFileWriter),
            constraints,
            config,
        })
    }

    pub fn with_registry(mut self, registry: VcsRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_writer(mut self, writer: Arc<dyn DirectUrlWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints.extend(constraints);
        self
    }

    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Install every target, in parallel up to `config.jobs()`
    ///
    /// Never fails as a whole: each target's result is in the report.
    pub fn install(&self, targets: &[InstallTarget]) -> InstallReport {
        let duplicates = self.duplicate_names(targets);
        let run = |target: &InstallTarget| {
            let result = match duplicated_name(target, &duplicates, &self.constraints) {
                Some(project) => Err(SourcemarkError::DuplicateTarget { name: project }
                    .for_target(&target.raw)),
                None => self.install_one(target),
            };
            TargetOutcome {
                target: target.raw.clone(),
                result,
            }
        };

        let jobs = self.config.jobs().min(targets.len().max(1));
        let outcomes: Vec<TargetOutcome> = if jobs <= 1 {
            targets.iter().map(run).collect()
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(|| targets.par_iter().map(run).collect()),
                Err(e) => {
                    warn!(error = %e, "thread pool unavailable, installing sequentially");
                    targets.iter().map(run).collect()
                }
            }
        };

        let report = InstallReport { outcomes };
        info!(
            targets = report.outcomes.len(),
            failed = report.failed_count(),
            "install finished"
        );
        report
    }

    /// Canonical names requested by more than one target
    fn duplicate_names(&self, targets: &[InstallTarget]) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for target in targets {
            if let Some(project) = self.constraints.apply(&target.descriptor).name() {
                *counts.entry(name::canonicalize(project)).or_default() += 1;
            }
        }
        counts.retain(|_, count| *count > 1);
        counts
    }
}

fn duplicated_name(
    target: &InstallTarget,
    duplicates: &HashMap<String, usize>,
    constraints: &Constraints,
) -> Option<String> {
    let descriptor = constraints.apply(&target.descriptor);
    let project = descriptor.name()?;
    duplicates
        .contains_key(&name::canonicalize(project))
        .then(|| project.to_string())
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("constraints", &self.constraints.len())
            .finish_non_exhaustive()
    }
}
