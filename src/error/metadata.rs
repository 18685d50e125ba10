//! Installed metadata and provenance record errors

use super::SourcemarkError;

pub fn write_failed(path: impl Into<String>, reason: impl Into<String>) -> SourcemarkError {
    SourcemarkError::MetadataWriteFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> SourcemarkError {
    SourcemarkError::MetadataReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

pub fn record_write_failed(path: impl Into<String>, reason: impl Into<String>) -> SourcemarkError {
    SourcemarkError::RecordWriteFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
