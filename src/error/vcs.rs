//! Version control checkout errors

use super::SourcemarkError;

pub fn not_found(vcs: impl Into<String>) -> SourcemarkError {
    SourcemarkError::VcsNotFound { vcs: vcs.into() }
}

pub fn checkout_failed(url: impl Into<String>, reason: impl Into<String>) -> SourcemarkError {
    SourcemarkError::CheckoutFailed {
        url: url.into(),
        reason: reason.into(),
    }
}

pub fn invalid_revision(
    vcs: impl Into<String>,
    revision: impl Into<String>,
    reason: impl Into<String>,
) -> SourcemarkError {
    SourcemarkError::InvalidRevision {
        vcs: vcs.into(),
        revision: revision.into(),
        reason: reason.into(),
    }
}
