//! Install target parsing errors

use super::SourcemarkError;

pub fn invalid_syntax(input: impl Into<String>, reason: impl Into<String>) -> SourcemarkError {
    SourcemarkError::InvalidSourceSyntax {
        input: input.into(),
        reason: reason.into(),
    }
}
