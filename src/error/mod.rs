//! Error types and handling for Sourcemark
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain, each providing
//! short constructors for the variants of that domain:
//! - [`source`]: Install target parsing errors
//! - [`vcs`]: Version control checkout errors
//! - [`fetch`]: Archive retrieval errors
//! - [`metadata`]: Installed metadata and provenance record errors
//! - [`config`]: Configuration errors

pub mod config;
pub mod fetch;
pub mod metadata;
pub mod source;
pub mod vcs;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Sourcemark operations
#[derive(Error, Diagnostic, Debug)]
pub enum SourcemarkError {
    // Source errors
    #[error("Invalid install target '{input}': {reason}")]
    #[diagnostic(
        code(sourcemark::source::invalid_syntax),
        help(
            "Valid forms: name, name==1.0, name @ https://host/name-1.0.tar.gz, git+https://host/repo@rev#egg=name, ./path"
        )
    )]
    InvalidSourceSyntax { input: String, reason: String },

    #[error("Unsupported URL scheme '{scheme}' in {url}")]
    #[diagnostic(
        code(sourcemark::source::unsupported_scheme),
        help("Archives can be fetched from file://, http:// and https:// URLs")
    )]
    UnsupportedScheme { scheme: String, url: String },

    // VCS errors
    #[error("No client available for version control system '{vcs}'")]
    #[diagnostic(
        code(sourcemark::vcs::not_found),
        help("Install the '{vcs}' command line client and make sure it is on PATH")
    )]
    VcsNotFound { vcs: String },

    #[error("Failed to check out {url}: {reason}")]
    #[diagnostic(
        code(sourcemark::vcs::checkout_failed),
        help("Check that the URL is reachable and the requested revision exists")
    )]
    CheckoutFailed { url: String, reason: String },

    #[error("Invalid {vcs} revision '{revision}': {reason}")]
    #[diagnostic(code(sourcemark::vcs::invalid_revision))]
    InvalidRevision {
        vcs: String,
        revision: String,
        reason: String,
    },

    // Fetch errors
    #[error("Failed to fetch {url}: {reason}")]
    #[diagnostic(code(sourcemark::fetch::failed))]
    FetchFailed { url: String, reason: String },

    #[error("Unsupported archive format: {path}")]
    #[diagnostic(
        code(sourcemark::fetch::unsupported_archive),
        help("Supported archives: .tar.gz, .tgz, .tar, .zip, .whl")
    )]
    UnsupportedArchive { path: String },

    #[error("Hash mismatch for {url}: expected {expected}, got {actual}")]
    #[diagnostic(code(sourcemark::fetch::hash_mismatch))]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // Resolution errors
    #[error("No distribution found for '{name}'")]
    #[diagnostic(
        code(sourcemark::resolve::package_not_found),
        help("Pass --find-links <dir> or a constraints file that names a direct URL for it")
    )]
    PackageNotFound { name: String },

    #[error("Distribution '{name}' is requested by more than one target")]
    #[diagnostic(code(sourcemark::resolve::duplicate_target))]
    DuplicateTarget { name: String },

    // Metadata errors
    #[error("Requested '{expected}' but the source tree declares '{found}'")]
    #[diagnostic(code(sourcemark::metadata::mismatch))]
    MetadataMismatch { expected: String, found: String },

    #[error("Failed to write package metadata at {path}: {reason}")]
    #[diagnostic(code(sourcemark::metadata::write_failed))]
    MetadataWriteFailed { path: String, reason: String },

    #[error("Failed to write direct URL record at {path}: {reason}")]
    #[diagnostic(
        code(sourcemark::metadata::record_write_failed),
        help("Check that the site directory is writable")
    )]
    RecordWriteFailed { path: String, reason: String },

    #[error("Distribution '{name}' is not installed")]
    #[diagnostic(code(sourcemark::metadata::not_installed))]
    DistributionNotFound { name: String },

    #[error("Failed to read installed metadata at {path}: {reason}")]
    #[diagnostic(code(sourcemark::metadata::read_failed))]
    MetadataReadFailed { path: String, reason: String },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(sourcemark::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(sourcemark::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    // Orchestration errors
    #[error("Illegal install state transition from {from} to {to}")]
    #[diagnostic(code(sourcemark::install::invalid_transition))]
    InvalidStateTransition { from: String, to: String },

    #[error("{target}: {source}")]
    #[diagnostic(code(sourcemark::install::target_failed))]
    TargetFailed {
        target: String,
        source: Box<SourcemarkError>,
    },

    #[error("{failed} of {total} install target(s) failed")]
    #[diagnostic(code(sourcemark::install::failed))]
    InstallFailed { failed: usize, total: usize },

    #[error("Operation cancelled")]
    #[diagnostic(code(sourcemark::cancelled))]
    Cancelled,

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(sourcemark::fs::io_error))]
    IoError { message: String },
}

impl SourcemarkError {
    /// Attach the offending install target to an error
    pub fn for_target(self, target: impl Into<String>) -> Self {
        match self {
            already @ SourcemarkError::TargetFailed { .. } => already,
            other => SourcemarkError::TargetFailed {
                target: target.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any target context peeled off
    pub fn root(&self) -> &SourcemarkError {
        match self {
            SourcemarkError::TargetFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::io::Error> for SourcemarkError {
    fn from(err: std::io::Error) -> Self {
        SourcemarkError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for SourcemarkError {
    fn from(err: serde_yaml::Error) -> Self {
        SourcemarkError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SourcemarkError {
    fn from(err: serde_json::Error) -> Self {
        SourcemarkError::MetadataReadFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<git2::Error> for SourcemarkError {
    fn from(err: git2::Error) -> Self {
        SourcemarkError::CheckoutFailed {
            url: "unknown".to_string(),
            reason: err.message().to_string(),
        }
    }
}

impl From<reqwest::Error> for SourcemarkError {
    fn from(err: reqwest::Error) -> Self {
        SourcemarkError::FetchFailed {
            url: err
                .url()
                .map_or_else(|| "unknown".to_string(), ToString::to_string),
            reason: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for SourcemarkError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationCanceled
            | inquire::InquireError::OperationInterrupted => SourcemarkError::Cancelled,
            other => SourcemarkError::IoError {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, SourcemarkError>;
