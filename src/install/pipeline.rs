//! The pipeline of a single install target

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::builder::{self, BuiltDistribution};
use super::state::{InstallState, TargetState};
use super::{InstallKind, InstalledTarget, Installer};
use crate::error::{Result, SourcemarkError, fetch, vcs};
use crate::link;
use crate::metadata::EggLink;
use crate::record::{self, DIRECT_URL_FILE, DirectUrl};
use crate::source::{
    DirectArchive, EditableSource, IndexRequirement, InstallTarget, ResolvedSource,
    SourceDescriptor, VcsReference, name,
};
use crate::transaction::Transaction;

impl Installer {
    /// Install one target, rolling back everything it did on failure
    pub fn install_one(&self, target: &InstallTarget) -> Result<InstalledTarget> {
        let mut state = TargetState::new(&target.raw);
        match self.run(target, &mut state) {
            Ok(installed) => {
                info!(
                    target = %target.raw,
                    name = %installed.name,
                    version = %installed.version,
                    kind = installed.kind.as_str(),
                    "installed"
                );
                Ok(installed)
            }
            Err(e) => {
                state.abort();
                warn!(target = %target.raw, error = %e, "install aborted");
                Err(e.for_target(&target.raw))
            }
        }
    }

    fn run(&self, target: &InstallTarget, state: &mut TargetState) -> Result<InstalledTarget> {
        let descriptor = self.constraints.apply(&target.descriptor);
        debug!(
            target = %target.raw,
            kind = descriptor.kind_label(),
            name = descriptor.name().unwrap_or("<unknown>"),
            "target parsed"
        );

        let staging = self.staging_dir()?;
        let mut transaction = Transaction::new(&target.raw);

        let installed = match &descriptor {
            SourceDescriptor::IndexRequirement(requirement) => self.install_from_index(
                &descriptor,
                requirement,
                staging.path(),
                state,
                &mut transaction,
            )?,
            SourceDescriptor::DirectArchive(archive) => self.install_archive(
                &descriptor,
                archive,
                staging.path(),
                state,
                &mut transaction,
            )?,
            SourceDescriptor::VcsReference(reference) => self.install_vcs(
                &descriptor,
                reference,
                staging.path(),
                state,
                &mut transaction,
            )?,
            SourceDescriptor::LocalEditable(EditableSource::Path { path }) => {
                self.install_editable_path(&descriptor, path, state, &mut transaction)?
            }
            SourceDescriptor::LocalEditable(EditableSource::Vcs(reference)) => {
                self.install_editable_vcs(&descriptor, reference, state, &mut transaction)?
            }
        };

        state.finish(descriptor.records_provenance())?;
        transaction.commit();
        Ok(installed)
    }

    /// A fresh staging directory inside `staging_root`, removed on drop
    fn staging_dir(&self) -> Result<TempDir> {
        fs::create_dir_all(&self.config.staging_root)?;
        Ok(tempfile::Builder::new()
            .prefix("target-")
            .tempdir_in(&self.config.staging_root)?)
    }

    fn install_from_index(
        &self,
        descriptor: &SourceDescriptor,
        requirement: &IndexRequirement,
        staging: &Path,
        state: &mut TargetState,
        transaction: &mut Transaction,
    ) -> Result<InstalledTarget> {
        let found = self.find_links.find(requirement)?;
        state.advance(InstallState::Resolved)?;

        let archive = DirectArchive {
            name: Some(requirement.name.clone()),
            url: link::path_to_url(&found.path)?,
            expected_hash: None,
            subdirectory: None,
        };
        let outcome = self.fetcher.fetch(&archive, staging)?;
        let tree = self.fetcher.source_tree(&outcome, staging)?;
        let resolved = ResolvedSource::new(descriptor.clone())
            .with_fetch(outcome.content_hash, outcome.is_dir);
        state.advance(InstallState::Fetched)?;

        self.build_and_record(
            &resolved,
            &tree,
            Some(&requirement.name),
            &found.name,
            InstallKind::Index,
            state,
            transaction,
        )
    }

    fn install_archive(
        &self,
        descriptor: &SourceDescriptor,
        archive: &DirectArchive,
        staging: &Path,
        state: &mut TargetState,
        transaction: &mut Transaction,
    ) -> Result<InstalledTarget> {
        state.advance(InstallState::Resolved)?;

        let outcome = self.fetcher.fetch(archive, staging)?;
        let tree = self.fetcher.source_tree(&outcome, staging)?;
        let kind = if outcome.is_dir {
            InstallKind::Directory
        } else {
            InstallKind::Archive
        };
        let resolved = ResolvedSource::new(descriptor.clone())
            .with_fetch(outcome.content_hash, outcome.is_dir);
        state.advance(InstallState::Fetched)?;

        self.build_and_record(
            &resolved,
            &tree,
            archive.name.as_deref(),
            &archive_fallback_name(&archive.url),
            kind,
            state,
            transaction,
        )
    }

    fn install_vcs(
        &self,
        descriptor: &SourceDescriptor,
        reference: &VcsReference,
        staging: &Path,
        state: &mut TargetState,
        transaction: &mut Transaction,
    ) -> Result<InstalledTarget> {
        state.advance(InstallState::Resolved)?;

        let checkout_dir = staging.join("checkout");
        let outcome = self.registry.checkout(reference, &checkout_dir)?;
        let resolved = ResolvedSource::new(descriptor.clone()).with_checkout(outcome.commit_id);
        state.advance(InstallState::CheckedOut)?;

        self.build_and_record(
            &resolved,
            &checkout_dir,
            reference.name.as_deref(),
            &repository_name(&reference.url),
            InstallKind::Vcs,
            state,
            transaction,
        )
    }

    /// Copy the tree into the site directory, write metadata, then the record
    #[allow(clippy::too_many_arguments)]
    fn build_and_record(
        &self,
        resolved: &ResolvedSource,
        tree: &Path,
        requested: Option<&str>,
        fallback_name: &str,
        kind: InstallKind,
        state: &mut TargetState,
        transaction: &mut Transaction,
    ) -> Result<InstalledTarget> {
        let root = builder::project_root(
            tree,
            subdirectory(resolved.descriptor()),
            &tree.display().to_string(),
        )?;
        let project = builder::resolve_metadata(&root, requested, fallback_name)?;
        let BuiltDistribution {
            metadata,
            dist_info,
            replaced,
            ..
        } = builder::build(&root, project, &self.config.site_dir, transaction)?;
        state.advance(InstallState::MetadataWritten)?;

        let direct_url = self.record(resolved, Some(&dist_info), state, transaction)?;
        Ok(InstalledTarget {
            name: metadata.name,
            version: metadata.version,
            kind,
            location: dist_info,
            direct_url,
            replaced,
        })
    }

    /// Persist provenance once metadata is on disk
    ///
    /// Sources without provenance write nothing and stay at `MetadataWritten`.
    fn record(
        &self,
        resolved: &ResolvedSource,
        dist_info: Option<&Path>,
        state: &mut TargetState,
        transaction: &mut Transaction,
    ) -> Result<Option<DirectUrl>> {
        let Some(direct_url) = record::build_direct_url(resolved)? else {
            return Ok(None);
        };
        if state.current() != InstallState::MetadataWritten {
            return Err(SourcemarkError::InvalidStateTransition {
                from: state.current().to_string(),
                to: InstallState::ProvenanceRecorded.to_string(),
            });
        }
        let Some(dist_info) = dist_info else {
            return Err(SourcemarkError::InvalidStateTransition {
                from: state.current().to_string(),
                to: InstallState::ProvenanceRecorded.to_string(),
            });
        };

        transaction.track_file_created(dist_info.join(DIRECT_URL_FILE));
        record::write_direct_url(dist_info, &direct_url, self.writer.as_ref())?;
        state.advance(InstallState::ProvenanceRecorded)?;
        Ok(Some(direct_url))
    }

    fn install_editable_path(
        &self,
        descriptor: &SourceDescriptor,
        path: &Path,
        state: &mut TargetState,
        transaction: &mut Transaction,
    ) -> Result<InstalledTarget> {
        if !path.is_dir() {
            return Err(fetch::failed(
                path.display().to_string(),
                "editable installs need an existing directory",
            ));
        }
        state.advance(InstallState::Resolved)?;
        state.advance(InstallState::Fetched)?;

        let fallback = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        let project = builder::resolve_metadata(path, None, &fallback)?;
        self.link_editable(descriptor, path, project, state, transaction)
    }

    fn install_editable_vcs(
        &self,
        descriptor: &SourceDescriptor,
        reference: &VcsReference,
        state: &mut TargetState,
        transaction: &mut Transaction,
    ) -> Result<InstalledTarget> {
        let requested = reference.name.as_deref().ok_or_else(|| {
            crate::error::source::invalid_syntax(
                reference.to_target_string(),
                "editable VCS targets need an #egg=<name> fragment",
            )
        })?;
        state.advance(InstallState::Resolved)?;

        let checkout_dir = self.config.src_dir.join(name::canonicalize(requested));
        if checkout_dir.exists() {
            return Err(vcs::checkout_failed(
                &reference.url,
                format!("{} already exists", checkout_dir.display()),
            ));
        }
        fs::create_dir_all(&self.config.src_dir)?;

        // The checkout is the editable source, so it stays only if linking succeeds
        let linked = (|| -> Result<InstalledTarget> {
            let outcome = self.registry.checkout(reference, &checkout_dir)?;
            let resolved =
                ResolvedSource::new(descriptor.clone()).with_checkout(outcome.commit_id);
            debug!(
                commit_id = resolved.commit_id().unwrap_or_default(),
                "editable checkout ready"
            );
            state.advance(InstallState::CheckedOut)?;

            let root = builder::project_root(
                &checkout_dir,
                reference.subdirectory.as_deref(),
                &reference.url,
            )?;
            let project = builder::resolve_metadata(&root, Some(requested), requested)?;
            self.link_editable(descriptor, &root, project, state, transaction)
        })();
        if linked.is_err() && checkout_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&checkout_dir) {
                warn!(path = %checkout_dir.display(), error = %e, "failed to remove checkout");
            }
        }
        linked
    }

    fn link_editable(
        &self,
        descriptor: &SourceDescriptor,
        source: &Path,
        project: crate::metadata::ProjectMetadata,
        state: &mut TargetState,
        transaction: &mut Transaction,
    ) -> Result<InstalledTarget> {
        let site_dir = &self.config.site_dir;
        let replaced = builder::replace_existing(site_dir, &project.name, transaction)?;
        let link = EggLink::write(site_dir, &project.name, source, transaction)?;
        state.advance(InstallState::MetadataWritten)?;

        let direct_url = self.record(
            &ResolvedSource::new(descriptor.clone()),
            None,
            state,
            transaction,
        )?;
        Ok(InstalledTarget {
            name: project.name,
            version: project.version,
            kind: InstallKind::Editable,
            location: link.link_file,
            direct_url,
            replaced,
        })
    }
}

fn subdirectory(descriptor: &SourceDescriptor) -> Option<&str> {
    match descriptor {
        SourceDescriptor::DirectArchive(archive) => archive.subdirectory.as_deref(),
        SourceDescriptor::VcsReference(reference)
        | SourceDescriptor::LocalEditable(EditableSource::Vcs(reference)) => {
            reference.subdirectory.as_deref()
        }
        SourceDescriptor::IndexRequirement(_)
        | SourceDescriptor::LocalEditable(EditableSource::Path { .. }) => None,
    }
}

/// `simple` for `.../simple-2.0.tar.gz`, the last path segment otherwise
fn archive_fallback_name(url: &str) -> String {
    let Some(file_name) = link::file_name(url) else {
        return "project".to_string();
    };
    link::split_archive_name(file_name)
        .map(|(project, _)| project)
        .unwrap_or_else(|| file_name.to_string())
}

/// `repo` for `https://host/org/repo.git`
fn repository_name(url: &str) -> String {
    link::file_name(url)
        .map(|segment| segment.strip_suffix(".git").unwrap_or(segment))
        .filter(|segment| !segment.is_empty())
        .unwrap_or("project")
        .to_string()
}
