//! Archive retrieval errors

use super::SourcemarkError;

pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> SourcemarkError {
    SourcemarkError::FetchFailed {
        url: url.into(),
        reason: reason.into(),
    }
}

pub fn unsupported_scheme(scheme: impl Into<String>, url: impl Into<String>) -> SourcemarkError {
    SourcemarkError::UnsupportedScheme {
        scheme: scheme.into(),
        url: url.into(),
    }
}

pub fn unsupported_archive(path: impl Into<String>) -> SourcemarkError {
    SourcemarkError::UnsupportedArchive { path: path.into() }
}
