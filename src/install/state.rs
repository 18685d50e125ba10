//! Per-target install states
//!
//! ```text
//! Parsed -> Resolved -> Fetched | CheckedOut -> MetadataWritten -> ProvenanceRecorded
//!    \__________\______________\___________________\________________-> Aborted
//! ```
//!
//! Targets without provenance (index and editable installs) finish at
//! `MetadataWritten`.

use std::fmt;

use tracing::debug;

use crate::error::{Result, SourcemarkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallState {
    Parsed,
    Resolved,
    Fetched,
    CheckedOut,
    MetadataWritten,
    ProvenanceRecorded,
    Aborted,
}

impl InstallState {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallState::Parsed => "Parsed",
            InstallState::Resolved => "Resolved",
            InstallState::Fetched => "Fetched",
            InstallState::CheckedOut => "CheckedOut",
            InstallState::MetadataWritten => "MetadataWritten",
            InstallState::ProvenanceRecorded => "ProvenanceRecorded",
            InstallState::Aborted => "Aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InstallState::ProvenanceRecorded | InstallState::Aborted
        )
    }

    /// Whether `next` directly follows this state
    pub fn can_advance_to(self, next: InstallState) -> bool {
        use InstallState::*;
        match (self, next) {
            (from, Aborted) => !from.is_terminal(),
            (Parsed, Resolved)
            | (Resolved, Fetched | CheckedOut)
            | (Fetched | CheckedOut, MetadataWritten)
            | (MetadataWritten, ProvenanceRecorded) => true,
            _ => false,
        }
    }

    /// The state after `next`, or `InvalidStateTransition`
    pub fn advance(self, next: InstallState) -> Result<InstallState> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(SourcemarkError::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks where one target is in its pipeline
#[derive(Debug)]
pub struct TargetState {
    target: String,
    state: InstallState,
}

impl TargetState {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            state: InstallState::Parsed,
        }
    }

    pub fn current(&self) -> InstallState {
        self.state
    }

    pub fn advance(&mut self, next: InstallState) -> Result<()> {
        self.state = self.state.advance(next)?;
        debug!(target = %self.target, state = %self.state, "state changed");
        Ok(())
    }

    /// Move to `Aborted` unless already finished
    pub fn abort(&mut self) {
        if !self.state.is_terminal() {
            debug!(target = %self.target, from = %self.state, "aborted");
            self.state = InstallState::Aborted;
        }
    }

    /// Check that the pipeline stopped where its source allows it to
    ///
    /// Sources with provenance must end at `ProvenanceRecorded`, all others
    /// at `MetadataWritten`.
    pub fn finish(&self, records_provenance: bool) -> Result<()> {
        let expected = if records_provenance {
            InstallState::ProvenanceRecorded
        } else {
            InstallState::MetadataWritten
        };
        if self.state == expected {
            Ok(())
        } else {
            Err(SourcemarkError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "Installed".to_string(),
            })
        }
    }
}
