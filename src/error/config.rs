//! Configuration errors

use super::SourcemarkError;

pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> SourcemarkError {
    SourcemarkError::ConfigReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> SourcemarkError {
    SourcemarkError::ConfigParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
